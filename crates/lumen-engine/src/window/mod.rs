//! Window + runtime loop.
//!
//! Owns the `winit` event loop and window and the engine drawing into it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
