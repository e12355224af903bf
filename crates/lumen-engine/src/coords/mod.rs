//! Coordinate and geometry types shared by the engine and its callers.
//!
//! Canonical space:
//! - Surface pixels
//! - Origin top-left
//! - +X right, +Y down, positive angles turn clockwise

mod rect;
mod size;
mod transform;
mod vec2;

pub use rect::Rect;
pub use size::SurfaceSize;
pub use transform::Transform;
pub use vec2::Vec2;
