//! Curve flattening and dashing.
//!
//! Backends that rasterise triangles turn [`PathData`] into polylines here;
//! the recording backend never needs this.

use std::f32::consts::{PI, TAU};

use crate::coords::Vec2;

use super::path::{ArcSegment, ArcSize, PathData, PathSegment, SweepDirection};

/// Flattened figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub closed: bool,
    pub filled: bool,
}

/// Center parameterization of an endpoint arc. Angles in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcCenter {
    pub center: Vec2,
    pub radius: Vec2,
    pub rotation: f32,
    pub start_angle: f32,
    pub sweep_angle: f32,
}

impl ArcCenter {
    pub fn point_at(&self, angle: f32) -> Vec2 {
        let (sin_phi, cos_phi) = self.rotation.sin_cos();
        let (sin_t, cos_t) = angle.sin_cos();
        let x = self.radius.x * cos_t;
        let y = self.radius.y * sin_t;
        Vec2::new(
            self.center.x + cos_phi * x - sin_phi * y,
            self.center.y + sin_phi * x + cos_phi * y,
        )
    }
}

/// Endpoint-to-center conversion (SVG implementation notes, F.6.5).
///
/// Returns `None` when the arc degenerates to a straight line (coincident
/// endpoints or a zero radius).
pub fn arc_to_center(from: Vec2, arc: &ArcSegment) -> Option<ArcCenter> {
    let to = arc.end;
    if from == to {
        return None;
    }
    let mut rx = arc.radius.x.abs();
    let mut ry = arc.radius.y.abs();
    if rx <= f32::EPSILON || ry <= f32::EPSILON || !rx.is_finite() || !ry.is_finite() {
        return None;
    }

    let phi = arc.rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let dx = (from.x - to.x) * 0.5;
    let dy = (from.y - to.y) * 0.5;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    // Scale radii up when the endpoints are too far apart.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = (rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p).max(0.0);
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let mut coef = if den > 0.0 { (num / den).sqrt() } else { 0.0 };

    let large = arc.size == ArcSize::Large;
    let clockwise = arc.sweep == SweepDirection::Clockwise;
    if large == clockwise {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;

    let center = Vec2::new(
        cos_phi * cxp - sin_phi * cyp + (from.x + to.x) * 0.5,
        sin_phi * cxp + cos_phi * cyp + (from.y + to.y) * 0.5,
    );

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let start_angle = uy.atan2(ux);
    let mut sweep_angle = (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
    if clockwise && sweep_angle < 0.0 {
        sweep_angle += TAU;
    } else if !clockwise && sweep_angle > 0.0 {
        sweep_angle -= TAU;
    }

    Some(ArcCenter {
        center,
        radius: Vec2::new(rx, ry),
        rotation: phi,
        start_angle,
        sweep_angle,
    })
}

fn arc_steps(radius: f32, sweep: f32, tolerance: f32) -> usize {
    let step = if tolerance < radius {
        2.0 * (1.0 - tolerance / radius).acos()
    } else {
        PI * 0.5
    };
    ((sweep.abs() / step.max(1e-3)).ceil() as usize).clamp(1, 1024)
}

/// Wang's formula: segment count keeping a polynomial curve within `tolerance`.
fn curve_steps(second_diff: f32, degree_factor: f32, tolerance: f32) -> usize {
    ((degree_factor * second_diff / tolerance).sqrt().ceil() as usize).clamp(1, 256)
}

fn flatten_segment(from: Vec2, seg: &PathSegment, tolerance: f32, out: &mut Vec<Vec2>) {
    match *seg {
        PathSegment::Line(p) => out.push(p),
        PathSegment::Arc(arc) => match arc_to_center(from, &arc) {
            Some(c) => {
                let n = arc_steps(c.radius.x.max(c.radius.y), c.sweep_angle, tolerance);
                for i in 1..n {
                    let t = c.start_angle + c.sweep_angle * (i as f32 / n as f32);
                    out.push(c.point_at(t));
                }
                out.push(arc.end);
            }
            None => out.push(arc.end),
        },
        PathSegment::Quad { ctrl, to } => {
            let dd = (from - ctrl * 2.0 + to).length();
            let n = curve_steps(dd, 0.25, tolerance);
            for i in 1..=n {
                let t = i as f32 / n as f32;
                let mt = 1.0 - t;
                out.push(from * (mt * mt) + ctrl * (2.0 * mt * t) + to * (t * t));
            }
        }
        PathSegment::Cubic { ctrl1, ctrl2, to } => {
            let dd = (from - ctrl1 * 2.0 + ctrl2)
                .length()
                .max((ctrl1 - ctrl2 * 2.0 + to).length());
            let n = curve_steps(dd, 0.75, tolerance);
            for i in 1..=n {
                let t = i as f32 / n as f32;
                let mt = 1.0 - t;
                out.push(
                    from * (mt * mt * mt)
                        + ctrl1 * (3.0 * mt * mt * t)
                        + ctrl2 * (3.0 * mt * t * t)
                        + to * (t * t * t),
                );
            }
        }
    }
}

/// Flattens every figure into a polyline whose deviation from the true curve
/// stays below `tolerance` pixels.
pub fn flatten(path: &PathData, tolerance: f32) -> Vec<Polyline> {
    let tolerance = if tolerance.is_finite() { tolerance.max(0.01) } else { 0.25 };
    path.figures
        .iter()
        .map(|fig| {
            let mut points = vec![fig.start];
            let mut cursor = fig.start;
            for seg in &fig.segments {
                flatten_segment(cursor, seg, tolerance, &mut points);
                cursor = seg.end();
            }
            points.dedup();
            if fig.closed && points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            Polyline {
                points,
                closed: fig.closed,
                filled: fig.filled,
            }
        })
        .collect()
}

fn closed_copy(points: &[Vec2], closed: bool) -> Vec<Vec2> {
    let mut out = points.to_vec();
    if closed {
        if let Some(first) = points.first() {
            out.push(*first);
        }
    }
    out
}

/// Splits a polyline into dashes.
///
/// `pattern` alternates on/off lengths in pixels. Returns the "on" pieces as
/// open polylines. An empty or all-zero pattern returns the input unchanged.
pub fn dash_polyline(points: &[Vec2], closed: bool, pattern: &[f32]) -> Vec<Vec<Vec2>> {
    let total: f32 = pattern.iter().sum();
    if pattern.is_empty() || total <= f32::EPSILON || !total.is_finite() {
        return vec![closed_copy(points, closed)];
    }

    let path = closed_copy(points, closed);

    let mut dashes = Vec::new();
    let mut idx = 0usize;
    let mut remaining = pattern[0];
    let mut on = true;
    let mut current: Vec<Vec2> = Vec::new();
    if let Some(p) = path.first() {
        current.push(*p);
    }

    for pair in path.windows(2) {
        let (mut a, b) = (pair[0], pair[1]);
        let mut seg_len = a.distance(b);
        while seg_len > 0.0 {
            if remaining >= seg_len {
                remaining -= seg_len;
                if on {
                    current.push(b);
                }
                seg_len = 0.0;
            } else {
                let split = a.lerp(b, remaining / seg_len);
                seg_len -= remaining;
                a = split;
                if on {
                    current.push(split);
                    if current.len() > 1 {
                        dashes.push(std::mem::take(&mut current));
                    }
                    current.clear();
                } else {
                    current.clear();
                    current.push(split);
                }
                on = !on;
                idx = (idx + 1) % pattern.len();
                remaining = pattern[idx];
            }
        }
    }
    if on && current.len() > 1 {
        dashes.push(current);
    }
    dashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    fn quarter(sweep: SweepDirection, size: ArcSize) -> ArcSegment {
        ArcSegment {
            end: Vec2::new(0.0, 10.0),
            radius: Vec2::new(10.0, 10.0),
            rotation_deg: 0.0,
            sweep,
            size,
        }
    }

    #[test]
    fn small_clockwise_quarter_is_centered_at_origin() {
        let arc = quarter(SweepDirection::Clockwise, ArcSize::Small);
        let c = arc_to_center(Vec2::new(10.0, 0.0), &arc).unwrap();
        assert!(close(c.center, Vec2::zero()));
        assert!((c.sweep_angle - PI / 2.0).abs() < 1e-4);
    }

    #[test]
    fn large_clockwise_takes_the_long_way() {
        let arc = quarter(SweepDirection::Clockwise, ArcSize::Large);
        let c = arc_to_center(Vec2::new(10.0, 0.0), &arc).unwrap();
        assert!(close(c.center, Vec2::new(10.0, 10.0)));
        assert!((c.sweep_angle - 1.5 * PI).abs() < 1e-4);
    }

    #[test]
    fn coincident_endpoints_degenerate() {
        let arc = ArcSegment {
            end: Vec2::new(1.0, 1.0),
            ..quarter(SweepDirection::Clockwise, ArcSize::Small)
        };
        assert!(arc_to_center(Vec2::new(1.0, 1.0), &arc).is_none());
    }

    #[test]
    fn flattened_circle_stays_on_radius() {
        let path = PathData::ellipse(Vec2::new(50.0, 50.0), 20.0, 20.0);
        let lines = flatten(&path, 0.1);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].closed);
        assert!(lines[0].points.len() > 16);
        for p in &lines[0].points {
            assert!((p.distance(Vec2::new(50.0, 50.0)) - 20.0).abs() < 1e-2);
        }
    }

    #[test]
    fn flattened_rect_has_four_corners() {
        let lines = flatten(&PathData::rect(Rect::new(0.0, 0.0, 4.0, 2.0)), 0.25);
        assert_eq!(lines[0].points.len(), 4);
    }

    #[test]
    fn dashes_follow_pattern() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let dashes = dash_polyline(&pts, false, &[3.0, 2.0]);
        assert_eq!(dashes.len(), 2);
        assert!(close(dashes[0][0], Vec2::new(0.0, 0.0)));
        assert!(close(*dashes[0].last().unwrap(), Vec2::new(3.0, 0.0)));
        assert!(close(dashes[1][0], Vec2::new(5.0, 0.0)));
        assert!(close(*dashes[1].last().unwrap(), Vec2::new(8.0, 0.0)));
    }

    #[test]
    fn empty_pattern_returns_whole_line() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let dashes = dash_polyline(&pts, true, &[]);
        assert_eq!(dashes.len(), 1);
        assert_eq!(dashes[0].len(), 4);
    }
}
