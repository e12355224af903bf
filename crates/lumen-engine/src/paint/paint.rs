use std::rc::Rc;

use super::{Brush, Color, DashStyle, LineCap, LineJoin, StrokeStyleDesc};

/// Whether a shape is filled, outlined or both.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PaintStyle {
    #[default]
    Fill,
    Stroke,
    FillAndStroke,
}

impl PaintStyle {
    #[inline]
    pub fn fills(self) -> bool {
        matches!(self, PaintStyle::Fill | PaintStyle::FillAndStroke)
    }

    #[inline]
    pub fn strokes(self) -> bool {
        matches!(self, PaintStyle::Stroke | PaintStyle::FillAndStroke)
    }
}

/// Compositing operator. Backends without support draw `SourceOver`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BlendMode {
    #[default]
    SourceOver,
    Additive,
    Multiply,
    Screen,
}

/// Quality hint for effects built from several passes (glow layers).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// How to render a shape.
///
/// Immutable by convention: the `with_*` builders return modified copies. The
/// brush is shared between copies; cloning a `Paint` never clones gradient stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub style: PaintStyle,
    pub stroke_width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: DashStyle,
    pub brush: Rc<Brush>,
    pub global_alpha: f32,
    pub blend: BlendMode,
    pub quality: FilterQuality,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            style: PaintStyle::Fill,
            stroke_width: 1.0,
            cap: LineCap::Flat,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashStyle::Solid,
            brush: Rc::new(Brush::Solid(Color::WHITE)),
            global_alpha: 1.0,
            blend: BlendMode::SourceOver,
            quality: FilterQuality::Medium,
        }
    }
}

impl Paint {
    /// Solid fill.
    pub fn fill(color: Color) -> Self {
        Self {
            brush: Rc::new(Brush::Solid(color)),
            ..Self::default()
        }
    }

    /// Solid outline of the given width.
    pub fn stroke(color: Color, width: f32) -> Self {
        Self {
            style: PaintStyle::Stroke,
            stroke_width: width,
            brush: Rc::new(Brush::Solid(color)),
            ..Self::default()
        }
    }

    /// Fill with any brush.
    pub fn from_brush(brush: impl Into<Brush>) -> Self {
        Self {
            brush: Rc::new(brush.into()),
            ..Self::default()
        }
    }

    pub fn with_style(&self, style: PaintStyle) -> Self {
        Self { style, ..self.clone() }
    }

    pub fn with_stroke_width(&self, stroke_width: f32) -> Self {
        Self { stroke_width, ..self.clone() }
    }

    pub fn with_cap(&self, cap: LineCap) -> Self {
        Self { cap, ..self.clone() }
    }

    pub fn with_join(&self, join: LineJoin) -> Self {
        Self { join, ..self.clone() }
    }

    pub fn with_miter_limit(&self, miter_limit: f32) -> Self {
        Self { miter_limit, ..self.clone() }
    }

    pub fn with_dash(&self, dash: DashStyle) -> Self {
        Self { dash, ..self.clone() }
    }

    pub fn with_brush(&self, brush: impl Into<Brush>) -> Self {
        Self { brush: Rc::new(brush.into()), ..self.clone() }
    }

    /// Shares an existing brush instead of allocating a new one.
    pub fn with_shared_brush(&self, brush: Rc<Brush>) -> Self {
        Self { brush, ..self.clone() }
    }

    pub fn with_color(&self, color: Color) -> Self {
        self.with_brush(Brush::Solid(color))
    }

    pub fn with_global_alpha(&self, global_alpha: f32) -> Self {
        Self { global_alpha, ..self.clone() }
    }

    pub fn with_blend(&self, blend: BlendMode) -> Self {
        Self { blend, ..self.clone() }
    }

    pub fn with_quality(&self, quality: FilterQuality) -> Self {
        Self { quality, ..self.clone() }
    }

    /// Alpha clamped to [0, 1]; non-finite values read as opaque.
    #[inline]
    pub fn effective_alpha(&self) -> f32 {
        if self.global_alpha.is_finite() {
            self.global_alpha.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Usable stroke width, or `None` when the stroke should be skipped.
    #[inline]
    pub fn effective_stroke_width(&self) -> Option<f32> {
        (self.stroke_width.is_finite() && self.stroke_width > 0.0).then_some(self.stroke_width)
    }

    pub fn stroke_style(&self) -> StrokeStyleDesc {
        StrokeStyleDesc {
            cap: self.cap,
            join: self.join,
            miter_limit: if self.miter_limit.is_finite() {
                self.miter_limit.max(1.0)
            } else {
                10.0
            },
            dash: self.dash.clone(),
        }
    }
}
