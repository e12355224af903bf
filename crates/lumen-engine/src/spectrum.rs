//! Read-only spectrum input and the styles used to draw it.

use crate::paint::{Color, ColorStop};

/// Per-frame magnitudes from an analysis pipeline.
///
/// Values are expected in [0, 1]; renderers clamp anything outside and treat
/// non-finite values as 0. Length may change between frames.
pub trait SpectrumSource {
    fn magnitudes(&self) -> &[f32];
}

impl SpectrumSource for [f32] {
    fn magnitudes(&self) -> &[f32] {
        self
    }
}

impl SpectrumSource for Vec<f32> {
    fn magnitudes(&self) -> &[f32] {
        self
    }
}

/// Normalizes one magnitude for drawing.
#[inline]
pub fn sanitize_magnitude(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    /// Gap between neighbouring bars in pixels.
    pub spacing: f32,
    pub corner_radius: f32,
    /// Bottom-to-top gradient spanning the full bar area. `None` fills with `color`.
    pub gradient: Option<Vec<ColorStop>>,
    pub color: Color,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            spacing: 2.0,
            corner_radius: 0.0,
            gradient: None,
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WaveformStyle {
    /// Also draw the waveform reflected about the rectangle's midline.
    pub mirror: bool,
    /// Alpha multiplier for the reflected copy.
    pub mirror_alpha: f32,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            mirror: false,
            mirror_alpha: 0.35,
        }
    }
}
