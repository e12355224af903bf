//! Paint model: colors, brushes, stroke decorations and the `Paint` descriptor.
//!
//! Geometry types remain in `coords`.

pub mod brush;
pub mod color;
pub mod gradient;
#[allow(clippy::module_inception)]
pub mod paint;
pub mod stroke;

pub use brush::Brush;
pub use color::Color;
pub use gradient::{
    even_stops, normalized_stops, sample_stops, ColorStop, LinearGradient, RadialGradient,
    SpreadMode,
};
pub use paint::{BlendMode, FilterQuality, Paint, PaintStyle};
pub use stroke::{DashStyle, LineCap, LineJoin, StrokeStyleDesc};
