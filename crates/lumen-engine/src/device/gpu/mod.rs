//! wgpu backend.
//!
//! Paths are flattened and tessellated on the CPU with `lyon`, gradients are
//! baked into a ramp texture and text is rasterised by `fontdue` into a
//! coverage atlas. One render pass per frame draws the whole batch.

mod config;
mod context;
mod glyphs;
mod init;
mod mesh;
mod pipeline;
mod ramp;
mod surface;
mod tessellate;

pub use config::GpuInit;
pub use surface::{GpuProvider, GpuSurface};
