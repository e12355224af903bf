//! Rendering surfaces and their resource handles.
//!
//! This module is responsible for:
//! - the [`RenderSurface`] / [`SurfaceProvider`] seam the engine draws through
//! - generation-tagged handles for brushes, geometries, stroke styles and text formats
//! - the headless recording backend and, with the `gpu` feature, the wgpu backend

mod error;
mod handle;
pub mod recording;
mod surface;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use error::{EndDrawStatus, SurfaceError};
pub use handle::{
    BrushHandle, BrushKey, Generation, GeometryHandle, GeometryKey, Handle, StrokeStyleHandle,
    StrokeStyleKey, TextFormatHandle, TextFormatKey,
};
pub use recording::{DrawCommand, RecordingControl, RecordingProvider, RecordingSurface};
pub use surface::{RenderSurface, SurfaceProvider};
