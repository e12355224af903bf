use crate::coords::{Rect, Vec2};

/// Direction an arc travels from its start point. Clockwise is the positive-angle direction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SweepDirection {
    Clockwise,
    CounterClockwise,
}

/// Which of the two candidate arcs between two points is taken.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArcSize {
    Small,
    Large,
}

/// Elliptical arc in endpoint form, starting at the current point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcSegment {
    pub end: Vec2,
    pub radius: Vec2,
    pub rotation_deg: f32,
    pub sweep: SweepDirection,
    pub size: ArcSize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSegment {
    Line(Vec2),
    Arc(ArcSegment),
    Quad { ctrl: Vec2, to: Vec2 },
    Cubic { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

impl PathSegment {
    #[inline]
    pub fn end(&self) -> Vec2 {
        match *self {
            PathSegment::Line(p) => p,
            PathSegment::Arc(a) => a.end,
            PathSegment::Quad { to, .. } | PathSegment::Cubic { to, .. } => to,
        }
    }
}

/// One connected subpath.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub start: Vec2,
    pub segments: Vec<PathSegment>,
    pub closed: bool,
    /// Hollow figures only contribute to strokes.
    pub filled: bool,
}

/// Surface-independent path description. Surfaces turn it into a geometry resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    pub figures: Vec<Figure>,
}

impl PathData {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Closed polygon or open polyline through `points`.
    pub fn from_points(points: &[Vec2], closed: bool) -> Self {
        let mut b = PathBuilder::new();
        if let Some((first, rest)) = points.split_first() {
            b.begin_figure(*first, closed);
            b.add_lines(rest);
            b.end_figure(closed);
        }
        b.finish()
    }

    pub fn rect(rect: Rect) -> Self {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        Self::from_points(
            &[min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            true,
        )
    }

    /// Rounded rectangle with elliptical corners; radii are clamped to half the sides.
    pub fn rounded_rect(rect: Rect, rx: f32, ry: f32) -> Self {
        let r = rect.normalized();
        let rx = rx.clamp(0.0, r.width() * 0.5);
        let ry = ry.clamp(0.0, r.height() * 0.5);
        if rx <= 0.0 || ry <= 0.0 {
            return Self::rect(r);
        }
        let (min, max) = (r.min(), r.max());
        let radius = Vec2::new(rx, ry);
        let corner = |end: Vec2| {
            PathSegment::Arc(ArcSegment {
                end,
                radius,
                rotation_deg: 0.0,
                sweep: SweepDirection::Clockwise,
                size: ArcSize::Small,
            })
        };

        let mut b = PathBuilder::new();
        b.begin_figure(Vec2::new(min.x + rx, min.y), true);
        b.add_line(Vec2::new(max.x - rx, min.y));
        b.push(corner(Vec2::new(max.x, min.y + ry)));
        b.add_line(Vec2::new(max.x, max.y - ry));
        b.push(corner(Vec2::new(max.x - rx, max.y)));
        b.add_line(Vec2::new(min.x + rx, max.y));
        b.push(corner(Vec2::new(min.x, max.y - ry)));
        b.add_line(Vec2::new(min.x, min.y + ry));
        b.push(corner(Vec2::new(min.x + rx, min.y)));
        b.end_figure(true);
        b.finish()
    }

    /// Full ellipse as two half arcs.
    pub fn ellipse(center: Vec2, rx: f32, ry: f32) -> Self {
        let radius = Vec2::new(rx, ry);
        let half = |end: Vec2| {
            PathSegment::Arc(ArcSegment {
                end,
                radius,
                rotation_deg: 0.0,
                sweep: SweepDirection::Clockwise,
                size: ArcSize::Small,
            })
        };
        let mut b = PathBuilder::new();
        b.begin_figure(Vec2::new(center.x + rx, center.y), true);
        b.push(half(Vec2::new(center.x - rx, center.y)));
        b.push(half(Vec2::new(center.x + rx, center.y)));
        b.end_figure(true);
        b.finish()
    }

    pub fn line(p0: Vec2, p1: Vec2) -> Self {
        Self::from_points(&[p0, p1], false)
    }

    /// Bounds of all end and control points (a superset of the true curve bounds).
    pub fn control_bounds(&self) -> Option<Rect> {
        let mut pts = Vec::new();
        for f in &self.figures {
            pts.push(f.start);
            for s in &f.segments {
                match *s {
                    PathSegment::Line(p) => pts.push(p),
                    PathSegment::Arc(a) => pts.push(a.end),
                    PathSegment::Quad { ctrl, to } => pts.extend([ctrl, to]),
                    PathSegment::Cubic { ctrl1, ctrl2, to } => pts.extend([ctrl1, ctrl2, to]),
                }
            }
        }
        Rect::bounding(&pts)
    }
}

/// Receiver for figure-by-figure path construction.
///
/// Callers of [`ResourceCache::path_geometry`](crate::resources::ResourceCache::path_geometry)
/// describe their shape through this trait without knowing which backend stores it.
pub trait GeometrySink {
    fn begin_figure(&mut self, start: Vec2, filled: bool);
    fn add_line(&mut self, to: Vec2);
    fn add_arc(&mut self, arc: ArcSegment);
    fn add_quadratic(&mut self, ctrl: Vec2, to: Vec2);
    fn add_bezier(&mut self, ctrl1: Vec2, ctrl2: Vec2, to: Vec2);
    fn end_figure(&mut self, closed: bool);

    fn add_lines(&mut self, points: &[Vec2]) {
        for p in points {
            self.add_line(*p);
        }
    }
}

/// Default [`GeometrySink`] producing [`PathData`].
///
/// Segments issued outside a figure are dropped; an unterminated figure is
/// closed off as open by [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct PathBuilder {
    figures: Vec<Figure>,
    current: Option<Figure>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, seg: PathSegment) {
        if let Some(fig) = self.current.as_mut() {
            fig.segments.push(seg);
        }
    }

    pub fn finish(mut self) -> PathData {
        if let Some(fig) = self.current.take() {
            self.figures.push(fig);
        }
        PathData { figures: self.figures }
    }
}

impl GeometrySink for PathBuilder {
    fn begin_figure(&mut self, start: Vec2, filled: bool) {
        if let Some(fig) = self.current.take() {
            self.figures.push(fig);
        }
        self.current = Some(Figure {
            start,
            segments: Vec::new(),
            closed: false,
            filled,
        });
    }

    fn add_line(&mut self, to: Vec2) {
        self.push(PathSegment::Line(to));
    }

    fn add_arc(&mut self, arc: ArcSegment) {
        self.push(PathSegment::Arc(arc));
    }

    fn add_quadratic(&mut self, ctrl: Vec2, to: Vec2) {
        self.push(PathSegment::Quad { ctrl, to });
    }

    fn add_bezier(&mut self, ctrl1: Vec2, ctrl2: Vec2, to: Vec2) {
        self.push(PathSegment::Cubic { ctrl1, ctrl2, to });
    }

    fn end_figure(&mut self, closed: bool) {
        if let Some(mut fig) = self.current.take() {
            fig.closed = closed;
            self.figures.push(fig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_figures() {
        let mut b = PathBuilder::new();
        b.begin_figure(Vec2::new(0.0, 0.0), true);
        b.add_lines(&[Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);
        b.end_figure(true);
        b.begin_figure(Vec2::new(5.0, 5.0), false);
        b.add_line(Vec2::new(6.0, 6.0));
        let path = b.finish();

        assert_eq!(path.figures.len(), 2);
        assert!(path.figures[0].closed);
        assert_eq!(path.figures[0].segments.len(), 2);
        assert!(!path.figures[1].closed);
        assert!(!path.figures[1].filled);
    }

    #[test]
    fn segments_outside_a_figure_are_dropped() {
        let mut b = PathBuilder::new();
        b.add_line(Vec2::new(1.0, 1.0));
        assert!(b.finish().is_empty());
    }

    #[test]
    fn rounded_rect_clamps_radii() {
        let path = PathData::rounded_rect(Rect::new(0.0, 0.0, 10.0, 4.0), 50.0, 50.0);
        let bounds = path.control_bounds().unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 10.0, 4.0));
        let arcs = path.figures[0]
            .segments
            .iter()
            .filter(|s| matches!(s, PathSegment::Arc(a) if a.radius == Vec2::new(5.0, 2.0)))
            .count();
        assert_eq!(arcs, 4);
    }

    #[test]
    fn from_points_empty_is_empty() {
        assert!(PathData::from_points(&[], true).is_empty());
    }
}
