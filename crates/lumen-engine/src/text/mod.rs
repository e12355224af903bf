//! Text descriptors and font management.
//!
//! Layout and rasterisation use `fontdue`. Surfaces resolve the family named in
//! a [`TextFormatDesc`] through a shared [`FontSystem`].

mod font_system;
mod format;

pub use font_system::{FontId, FontLoadError, FontSystem};
pub use format::{
    FontStretch, FontStyle, FontWeight, TextAlignment, TextFormatDesc, TextOutline, TextStyle,
};
