//! Surface ownership, frame brackets and device-loss recovery.
//!
//! [`RenderEngine`] is the single place that creates and discards surfaces.
//! Every surface-dependent component it owns is told about each transition
//! through [`SurfaceLifecycle`](crate::lifecycle::SurfaceLifecycle).

mod config;
#[allow(clippy::module_inception)]
mod engine;
mod frame;

pub use config::EngineConfig;
pub use engine::{FrameOutcome, RenderEngine, SurfaceState};
pub use frame::Frame;
