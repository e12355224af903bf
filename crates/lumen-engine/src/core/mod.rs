//! The contract between the window runtime and the application drawing in it.

mod app;

pub use app::{App, AppControl};
