//! Path descriptions and the geometry construction service.

mod builder;
pub mod flatten;
mod path;

pub use builder::{
    GeometryBuilder, MAX_CIRCLE_SEGMENTS, MAX_POLYGON_SIDES, MAX_STAR_POINTS, MIN_CIRCLE_SEGMENTS,
    MIN_POLYGON_SIDES, MIN_RADIUS, MIN_STAR_POINTS,
};
pub use path::{
    ArcSegment, ArcSize, Figure, GeometrySink, PathBuilder, PathData, PathSegment, SweepDirection,
};
