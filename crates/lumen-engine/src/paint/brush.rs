use super::{Color, ColorStop, LinearGradient, RadialGradient};

/// Paint source description. The resource cache resolves it to a surface brush.
///
/// Extend by adding variants; renderers and backends dispatch with `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl Brush {
    #[inline]
    pub fn solid(color: Color) -> Self {
        Brush::Solid(color)
    }

    /// Gradient stops, empty for solid brushes.
    pub fn stops(&self) -> &[ColorStop] {
        match self {
            Brush::Solid(_) => &[],
            Brush::Linear(g) => &g.stops,
            Brush::Radial(g) => &g.stops,
        }
    }

    /// A representative flat color: the solid color or the first stop.
    pub fn dominant_color(&self) -> Color {
        match self {
            Brush::Solid(c) => *c,
            Brush::Linear(_) | Brush::Radial(_) => self
                .stops()
                .first()
                .map_or(Color::transparent(), |s| s.color),
        }
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        match self {
            Brush::Solid(c) => c.a >= 1.0,
            // Conservative: any translucent stop makes the whole gradient translucent.
            Brush::Linear(_) | Brush::Radial(_) => self.stops().iter().all(|s| s.color.a >= 1.0),
        }
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Brush::Solid(color)
    }
}

impl From<LinearGradient> for Brush {
    fn from(g: LinearGradient) -> Self {
        Brush::Linear(g)
    }
}

impl From<RadialGradient> for Brush {
    fn from(g: RadialGradient) -> Self {
        Brush::Radial(g)
    }
}
