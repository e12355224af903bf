//! Satellite renderers behind the canvas.
//!
//! Each renderer is a plain value owned by the engine. Methods take `&self`
//! and a [`RenderCtx`] built for the call; per-surface caches live behind
//! `RefCell`s and are dropped through the lifecycle hooks.
//!
//! Convention:
//! - Coordinates are surface pixels (top-left origin, +Y down).
//! - Angles are degrees, clockwise from +X.

mod ctx;
pub mod effects;
pub mod gradients;
pub mod primitives;
pub mod spectrum;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use ctx::RenderCtx;
pub use effects::{glow_layer_count, EffectsRenderer, Shadow, ShadowTarget};
pub use gradients::GradientRenderer;
pub use primitives::{PrimitiveRenderer, MAX_GRID_LINES, MAX_STROKE_STYLES};
pub use spectrum::SpectrumRenderer;
pub use text::{TextRenderer, MAX_TEXT_FORMATS};
