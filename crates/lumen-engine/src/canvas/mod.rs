//! The drawing façade handed to visual components.
//!
//! A [`Canvas`] borrows the engine's surface and renderers for one frame and
//! routes every call to the renderer that owns it. Nothing here holds surface
//! resources.

#[allow(clippy::module_inception)]
mod canvas;
mod state;

pub use canvas::Canvas;
pub use state::{CanvasState, SurfaceInfo};
