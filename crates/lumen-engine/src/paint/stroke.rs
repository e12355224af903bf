use std::hash::{DefaultHasher, Hash, Hasher};

/// Shape of open stroke ends.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineCap {
    #[default]
    Flat,
    Square,
    Round,
    Triangle,
}

/// Shape of stroke corners.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
    MiterOrBevel,
}

/// Dash pattern. Lengths are multiples of the stroke width.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    Custom(Vec<f32>),
}

impl DashStyle {
    /// On/off lengths in stroke-width units. Empty for solid strokes.
    pub fn pattern(&self) -> Vec<f32> {
        match self {
            DashStyle::Solid => Vec::new(),
            DashStyle::Dash => vec![3.0, 2.0],
            DashStyle::Dot => vec![1.0, 2.0],
            DashStyle::DashDot => vec![3.0, 2.0, 1.0, 2.0],
            DashStyle::DashDotDot => vec![3.0, 2.0, 1.0, 2.0, 1.0, 2.0],
            DashStyle::Custom(lengths) => lengths
                .iter()
                .map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 })
                .collect(),
        }
    }

    fn tag(&self) -> u64 {
        match self {
            DashStyle::Solid => 0,
            DashStyle::Dash => 1,
            DashStyle::Dot => 2,
            DashStyle::DashDot => 3,
            DashStyle::DashDotDot => 4,
            DashStyle::Custom(_) => 5,
        }
    }
}

/// Everything a surface needs to build a stroke style object.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyleDesc {
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: DashStyle,
}

impl Default for StrokeStyleDesc {
    fn default() -> Self {
        Self {
            cap: LineCap::Flat,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashStyle::Solid,
        }
    }
}

impl StrokeStyleDesc {
    /// Packed cache key.
    ///
    /// Layout: bits 0..2 cap, 2..4 join, 4..7 dash kind, 8..24 miter limit in
    /// hundredths, 32..64 hash of custom dash lengths.
    pub fn packed_key(&self) -> u64 {
        let cap = self.cap as u64 & 0b11;
        let join = self.join as u64 & 0b11;
        let miter = (self.miter_limit.clamp(1.0, 655.0) * 100.0) as u64 & 0xFFFF;

        let custom = match &self.dash {
            DashStyle::Custom(lengths) => {
                let mut hasher = DefaultHasher::new();
                for v in lengths {
                    v.to_bits().hash(&mut hasher);
                }
                hasher.finish() >> 32
            }
            _ => 0,
        };

        cap | (join << 2) | (self.dash.tag() << 4) | (miter << 8) | (custom << 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_configs_share_a_key() {
        let a = StrokeStyleDesc { cap: LineCap::Round, ..Default::default() };
        let b = StrokeStyleDesc { cap: LineCap::Round, ..Default::default() };
        assert_eq!(a.packed_key(), b.packed_key());
    }

    #[test]
    fn cap_join_and_dash_change_the_key() {
        let base = StrokeStyleDesc::default();
        let keys = [
            base.packed_key(),
            StrokeStyleDesc { cap: LineCap::Square, ..base.clone() }.packed_key(),
            StrokeStyleDesc { join: LineJoin::Round, ..base.clone() }.packed_key(),
            StrokeStyleDesc { dash: DashStyle::Dot, ..base.clone() }.packed_key(),
            StrokeStyleDesc { dash: DashStyle::Custom(vec![3.0, 1.0]), ..base.clone() }
                .packed_key(),
            StrokeStyleDesc { dash: DashStyle::Custom(vec![1.0, 3.0]), ..base }.packed_key(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn custom_pattern_drops_negative_lengths() {
        assert_eq!(DashStyle::Custom(vec![2.0, -1.0]).pattern(), vec![2.0, 0.0]);
    }
}
