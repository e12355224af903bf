use crate::coords::Vec2;

use super::Color;

/// Gradient spread behavior outside the [0, 1] range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SpreadMode {
    /// Clamp to edge stops.
    #[default]
    Pad,
    /// Repeat the gradient pattern.
    Repeat,
    /// Mirror-repeat the gradient pattern.
    Reflect,
}

impl SpreadMode {
    /// Maps an unbounded gradient parameter into [0, 1].
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            SpreadMode::Pad => t.clamp(0.0, 1.0),
            SpreadMode::Repeat => t - t.floor(),
            SpreadMode::Reflect => {
                let m = t.rem_euclid(2.0);
                if m > 1.0 { 2.0 - m } else { m }
            }
        }
    }
}

/// A single gradient stop. `t` is the offset along the gradient axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub t: f32,
    pub color: Color,
}

impl ColorStop {
    #[inline]
    pub const fn new(t: f32, color: Color) -> Self {
        Self { t, color }
    }
}

/// Evenly spaced stops from a list of colors.
pub fn even_stops(colors: &[Color]) -> Vec<ColorStop> {
    match colors.len() {
        0 => Vec::new(),
        1 => vec![ColorStop::new(0.0, colors[0]), ColorStop::new(1.0, colors[0])],
        n => colors
            .iter()
            .enumerate()
            .map(|(i, c)| ColorStop::new(i as f32 / (n - 1) as f32, *c))
            .collect(),
    }
}

/// Clamps offsets to [0, 1] and sorts by offset, keeping insertion order for ties.
pub fn normalized_stops(stops: &[ColorStop]) -> Vec<ColorStop> {
    let mut out: Vec<ColorStop> = stops
        .iter()
        .filter(|s| s.t.is_finite() && s.color.is_finite())
        .map(|s| ColorStop::new(s.t.clamp(0.0, 1.0), s.color.clamped()))
        .collect();
    out.sort_by(|a, b| a.t.total_cmp(&b.t));
    out
}

/// Color at `t` along a normalized stop list.
pub fn sample_stops(stops: &[ColorStop], t: f32) -> Color {
    let Some(first) = stops.first() else {
        return Color::transparent();
    };
    if t <= first.t {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.t {
            let span = b.t - a.t;
            if span <= f32::EPSILON {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.t) / span);
        }
    }
    stops[stops.len() - 1].color
}

/// Linear gradient between two points, in the same space as the geometry it fills.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub stops: Vec<ColorStop>,
    pub spread: SpreadMode,
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2, stops: Vec<ColorStop>) -> Self {
        Self {
            start,
            end,
            stops,
            spread: SpreadMode::Pad,
        }
    }

    pub fn with_spread(mut self, spread: SpreadMode) -> Self {
        self.spread = spread;
        self
    }

    /// Returns true when the gradient definition is structurally usable.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.stops.iter().all(|s| s.t.is_finite() && s.color.is_finite())
            && self.stops.len() >= 2
    }
}

/// Elliptical radial gradient. Stop 0 sits at `center + origin_offset`, stop 1 on the ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub origin_offset: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    pub stops: Vec<ColorStop>,
    pub spread: SpreadMode,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32, stops: Vec<ColorStop>) -> Self {
        Self {
            center,
            origin_offset: Vec2::zero(),
            radius_x: radius,
            radius_y: radius,
            stops,
            spread: SpreadMode::Pad,
        }
    }

    pub fn elliptical(center: Vec2, radius_x: f32, radius_y: f32, stops: Vec<ColorStop>) -> Self {
        Self {
            radius_x,
            radius_y,
            ..Self::new(center, radius_x, stops)
        }
    }

    pub fn with_origin_offset(mut self, offset: Vec2) -> Self {
        self.origin_offset = offset;
        self
    }

    pub fn with_spread(mut self, spread: SpreadMode) -> Self {
        self.spread = spread;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite()
            && self.origin_offset.is_finite()
            && self.radius_x.is_finite()
            && self.radius_y.is_finite()
            && self.radius_x > 0.0
            && self.radius_y > 0.0
            && self.stops.iter().all(|s| s.t.is_finite() && s.color.is_finite())
            && self.stops.len() >= 2
    }
}
