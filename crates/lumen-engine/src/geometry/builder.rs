use crate::coords::{Rect, Vec2};
use crate::device::{GeometryHandle, RenderSurface};

use super::path::{ArcSegment, ArcSize, GeometrySink, PathBuilder, PathData, SweepDirection};

/// Smallest radius shapes degrade to.
pub const MIN_RADIUS: f32 = 0.01;
pub const MIN_CIRCLE_SEGMENTS: u32 = 3;
pub const MAX_CIRCLE_SEGMENTS: u32 = 360;
pub const MIN_POLYGON_SIDES: u32 = 3;
pub const MAX_POLYGON_SIDES: u32 = 360;
pub const MIN_STAR_POINTS: u32 = 2;
pub const MAX_STAR_POINTS: u32 = 180;

#[inline]
fn sanitize_radius(r: f32) -> f32 {
    if r.is_finite() { r.max(MIN_RADIUS) } else { MIN_RADIUS }
}

#[inline]
fn sanitize_angle(deg: f32) -> f32 {
    if deg.is_finite() { deg } else { 0.0 }
}

/// Stateless geometry factory.
///
/// The `create_*` family builds surface geometries (uncached; callers decide
/// whether to keep them). The `*_path` family returns the same shapes as plain
/// [`PathData`], and `generate_*` returns raw vertices with no surface at all.
///
/// Inputs are sanitized to the nearest valid shape: radii are clamped
/// positive, polygons get at least 3 sides, stars at least 2 points and
/// circles between 3 and 360 segments.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometryBuilder;

impl GeometryBuilder {
    pub fn new() -> Self {
        Self
    }

    // ── device-backed ─────────────────────────────────────────────────────

    /// Polyline (`closed == false`) or polygon through `points`.
    pub fn create_path_from_points(
        &self,
        surface: &mut dyn RenderSurface,
        points: &[Vec2],
        closed: bool,
    ) -> Option<GeometryHandle> {
        let min_points = if closed { 3 } else { 2 };
        if points.len() < min_points || !points.iter().all(|p| p.is_finite()) {
            return None;
        }
        create(surface, &PathData::from_points(points, closed))
    }

    pub fn create_arc(
        &self,
        surface: &mut dyn RenderSurface,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
    ) -> Option<GeometryHandle> {
        let path = self.arc_path(center, radius, start_deg, sweep_deg);
        if path.is_empty() {
            return None;
        }
        create(surface, &path)
    }

    pub fn create_regular_polygon(
        &self,
        surface: &mut dyn RenderSurface,
        center: Vec2,
        radius: f32,
        sides: u32,
        rotation_deg: f32,
    ) -> Option<GeometryHandle> {
        let verts = self.generate_regular_polygon_vertices(center, radius, sides, rotation_deg);
        create(surface, &PathData::from_points(&verts, true))
    }

    /// Pie slice: center, out along `start_deg`, around the arc, back to center.
    pub fn create_angular_slice(
        &self,
        surface: &mut dyn RenderSurface,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
    ) -> Option<GeometryHandle> {
        let path = self.angular_slice_path(center, radius, start_deg, sweep_deg);
        if path.is_empty() {
            return None;
        }
        create(surface, &path)
    }

    // ── path descriptions ─────────────────────────────────────────────────

    /// Open arc path. A zero sweep yields an empty path; sweeps beyond a full
    /// turn are clamped to one.
    pub fn arc_path(&self, center: Vec2, radius: f32, start_deg: f32, sweep_deg: f32) -> PathData {
        let mut b = PathBuilder::new();
        self.append_arc(&mut b, center, radius, start_deg, sweep_deg, false);
        b.finish()
    }

    pub fn angular_slice_path(
        &self,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
    ) -> PathData {
        let mut b = PathBuilder::new();
        self.append_arc(&mut b, center, radius, start_deg, sweep_deg, true);
        b.finish()
    }

    fn append_arc(
        &self,
        sink: &mut dyn GeometrySink,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
        slice: bool,
    ) {
        let r = sanitize_radius(radius);
        let start = sanitize_angle(start_deg);
        let sweep = sanitize_angle(sweep_deg).clamp(-360.0, 360.0);
        if sweep == 0.0 || !center.is_finite() {
            return;
        }

        let direction = if sweep > 0.0 {
            SweepDirection::Clockwise
        } else {
            SweepDirection::CounterClockwise
        };
        let radius = Vec2::new(r, r);
        let arc_to = |end: Vec2, size: ArcSize| ArcSegment {
            end,
            radius,
            rotation_deg: 0.0,
            sweep: direction,
            size,
        };

        let from = Vec2::polar(center, r, start);
        if slice {
            sink.begin_figure(center, true);
            sink.add_line(from);
        } else {
            sink.begin_figure(from, false);
        }

        if sweep.abs() >= 360.0 {
            // Coincident endpoints cannot describe a full turn in one arc.
            let half = Vec2::polar(center, r, start + sweep * 0.5);
            sink.add_arc(arc_to(half, ArcSize::Small));
            sink.add_arc(arc_to(from, ArcSize::Small));
        } else {
            let size = if sweep.abs() >= 180.0 { ArcSize::Large } else { ArcSize::Small };
            sink.add_arc(arc_to(Vec2::polar(center, r, start + sweep), size));
        }

        sink.end_figure(slice);
    }

    // ── pure vertex generation ────────────────────────────────────────────

    /// `segments` points evenly spaced on a circle, starting at 0°.
    pub fn generate_circle_points(&self, center: Vec2, radius: f32, segments: u32) -> Vec<Vec2> {
        let r = sanitize_radius(radius);
        let n = segments.clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS);
        (0..n)
            .map(|i| Vec2::polar(center, r, 360.0 * i as f32 / n as f32))
            .collect()
    }

    /// Vertices of a regular polygon; the first vertex points up, turned by `rotation_deg`.
    pub fn generate_regular_polygon_vertices(
        &self,
        center: Vec2,
        radius: f32,
        sides: u32,
        rotation_deg: f32,
    ) -> Vec<Vec2> {
        let r = sanitize_radius(radius);
        let n = sides.clamp(MIN_POLYGON_SIDES, MAX_POLYGON_SIDES);
        let base = sanitize_angle(rotation_deg) - 90.0;
        (0..n)
            .map(|i| Vec2::polar(center, r, base + 360.0 * i as f32 / n as f32))
            .collect()
    }

    /// `2 × points` vertices alternating outer and inner radius, first one pointing up.
    pub fn generate_star_vertices(
        &self,
        center: Vec2,
        outer_radius: f32,
        inner_radius: f32,
        points: u32,
    ) -> Vec<Vec2> {
        let outer = sanitize_radius(outer_radius);
        let inner = sanitize_radius(inner_radius);
        let n = points.clamp(MIN_STAR_POINTS, MAX_STAR_POINTS).saturating_mul(2);
        let step = 360.0 / n as f32;
        (0..n)
            .map(|i| {
                let r = if i % 2 == 0 { outer } else { inner };
                Vec2::polar(center, r, -90.0 + step * i as f32)
            })
            .collect()
    }

    /// One point per sample, spread across `rect`'s width.
    ///
    /// Samples are amplitudes in [-1, 1] (clamped; non-finite reads as 0),
    /// mapped around the vertical center with full scale at half the height.
    /// Fewer than 2 samples yield no points.
    pub fn generate_waveform_points(&self, samples: &[f32], rect: Rect) -> Vec<Vec2> {
        if samples.len() < 2 || !rect.is_finite() {
            return Vec::new();
        }
        let r = rect.normalized();
        let mid = r.center().y;
        let half_h = r.height() * 0.5;
        let last = (samples.len() - 1) as f32;
        samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
                Vec2::new(r.origin.x + r.width() * (i as f32 / last), mid - s * half_h)
            })
            .collect()
    }
}

fn create(surface: &mut dyn RenderSurface, path: &PathData) -> Option<GeometryHandle> {
    match surface.create_geometry(path) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("geometry creation failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathSegment;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    fn only_arc(path: &PathData) -> ArcSegment {
        match path.figures[0].segments.as_slice() {
            [PathSegment::Arc(a)] => *a,
            other => panic!("expected a single arc, got {other:?}"),
        }
    }

    // ── arcs ──────────────────────────────────────────────────────────────

    #[test]
    fn quarter_arc_is_small_and_clockwise() {
        let g = GeometryBuilder::new();
        let center = Vec2::new(100.0, 100.0);
        let path = g.arc_path(center, 40.0, 0.0, 90.0);
        let arc = only_arc(&path);

        assert_eq!(arc.size, ArcSize::Small);
        assert_eq!(arc.sweep, SweepDirection::Clockwise);
        let expected = Vec2::new(
            center.x + 40.0 * 90f32.to_radians().cos(),
            center.y + 40.0 * 90f32.to_radians().sin(),
        );
        assert!(close(arc.end, expected));
        assert!(close(path.figures[0].start, Vec2::new(140.0, 100.0)));
    }

    #[test]
    fn three_quarter_arc_is_large() {
        let path = GeometryBuilder::new().arc_path(Vec2::zero(), 10.0, 0.0, 270.0);
        assert_eq!(only_arc(&path).size, ArcSize::Large);
    }

    #[test]
    fn negative_sweep_runs_counter_clockwise() {
        let path = GeometryBuilder::new().arc_path(Vec2::zero(), 10.0, 0.0, -45.0);
        let arc = only_arc(&path);
        assert_eq!(arc.sweep, SweepDirection::CounterClockwise);
        assert_eq!(arc.size, ArcSize::Small);
    }

    #[test]
    fn full_turn_splits_into_two_arcs() {
        let path = GeometryBuilder::new().arc_path(Vec2::zero(), 10.0, 0.0, 400.0);
        assert_eq!(path.figures[0].segments.len(), 2);
    }

    #[test]
    fn zero_sweep_is_empty() {
        assert!(GeometryBuilder::new().arc_path(Vec2::zero(), 10.0, 30.0, 0.0).is_empty());
    }

    #[test]
    fn slice_is_closed_through_center() {
        let path = GeometryBuilder::new().angular_slice_path(Vec2::new(5.0, 5.0), 10.0, 0.0, 60.0);
        let fig = &path.figures[0];
        assert!(fig.closed);
        assert_eq!(fig.start, Vec2::new(5.0, 5.0));
        assert_eq!(fig.segments.len(), 2);
    }

    // ── vertex generation ─────────────────────────────────────────────────

    #[test]
    fn star_alternates_radii() {
        let center = Vec2::new(0.0, 0.0);
        let verts = GeometryBuilder::new().generate_star_vertices(center, 10.0, 5.0, 5);
        assert_eq!(verts.len(), 10);
        for (i, v) in verts.iter().enumerate() {
            let expected = if i % 2 == 0 { 10.0 } else { 5.0 };
            assert!((v.distance(center) - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn star_points_are_sanitized() {
        let verts = GeometryBuilder::new().generate_star_vertices(Vec2::zero(), 10.0, 5.0, 0);
        assert_eq!(verts.len(), 4);
    }

    #[test]
    fn huge_star_point_count_is_capped() {
        let verts =
            GeometryBuilder::new().generate_star_vertices(Vec2::zero(), 10.0, 5.0, u32::MAX);
        assert_eq!(verts.len(), 2 * MAX_STAR_POINTS as usize);
    }

    #[test]
    fn huge_polygon_side_count_is_capped() {
        let g = GeometryBuilder::new();
        let verts = g.generate_regular_polygon_vertices(Vec2::zero(), 10.0, u32::MAX, 0.0);
        assert_eq!(verts.len(), MAX_POLYGON_SIDES as usize);
    }

    #[test]
    fn circle_segments_are_clamped() {
        let g = GeometryBuilder::new();
        assert_eq!(g.generate_circle_points(Vec2::zero(), 1.0, 1).len(), 3);
        assert_eq!(g.generate_circle_points(Vec2::zero(), 1.0, 10_000).len(), 360);
    }

    #[test]
    fn polygon_sides_and_radius_are_sanitized() {
        let verts =
            GeometryBuilder::new().generate_regular_polygon_vertices(Vec2::zero(), -4.0, 1, 0.0);
        assert_eq!(verts.len(), 3);
        for v in verts {
            assert!((v.length() - MIN_RADIUS).abs() < 1e-6);
        }
    }

    #[test]
    fn polygon_first_vertex_points_up() {
        let verts =
            GeometryBuilder::new().generate_regular_polygon_vertices(Vec2::zero(), 10.0, 4, 0.0);
        assert!(close(verts[0], Vec2::new(0.0, -10.0)));
    }

    #[test]
    fn waveform_needs_two_samples() {
        let g = GeometryBuilder::new();
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(g.generate_waveform_points(&[], rect).is_empty());
        assert!(g.generate_waveform_points(&[0.5], rect).is_empty());
    }

    #[test]
    fn waveform_spans_rect_width() {
        let pts = GeometryBuilder::new()
            .generate_waveform_points(&[0.0, 1.0, -1.0], Rect::new(10.0, 0.0, 100.0, 50.0));
        assert_eq!(pts, vec![
            Vec2::new(10.0, 25.0),
            Vec2::new(60.0, 0.0),
            Vec2::new(110.0, 50.0),
        ]);
    }
}
