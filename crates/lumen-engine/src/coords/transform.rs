use super::{Rect, Vec2};

/// 2D affine transform, row-vector convention.
///
/// A point maps as `x' = x*m11 + y*m21 + dx`, `y' = x*m12 + y*m22 + dy`.
/// `a.then(b)` applies `a` first, then `b`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self { m11: 1.0, m12: 0.0, m21: 0.0, m22: 1.0, dx: 0.0, dy: 0.0 }
    }

    #[inline]
    pub const fn translation(dx: f32, dy: f32) -> Self {
        Self { m11: 1.0, m12: 0.0, m21: 0.0, m22: 1.0, dx, dy }
    }

    /// Scale by `(sx, sy)` keeping `center` fixed.
    #[inline]
    pub fn scale_at(sx: f32, sy: f32, center: Vec2) -> Self {
        Self {
            m11: sx,
            m12: 0.0,
            m21: 0.0,
            m22: sy,
            dx: center.x - sx * center.x,
            dy: center.y - sy * center.y,
        }
    }

    /// Rotation by `degrees` (clockwise on a y-down surface) around `center`.
    pub fn rotation_at(degrees: f32, center: Vec2) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Transform::translation(-center.x, -center.y)
            .then(Self { m11: cos, m12: sin, m21: -sin, m22: cos, dx: 0.0, dy: 0.0 })
            .then(Transform::translation(center.x, center.y))
    }

    /// Composition: `self` first, then `next`.
    #[inline]
    pub fn then(self, next: Transform) -> Transform {
        Transform {
            m11: self.m11 * next.m11 + self.m12 * next.m21,
            m12: self.m11 * next.m12 + self.m12 * next.m22,
            m21: self.m21 * next.m11 + self.m22 * next.m21,
            m22: self.m21 * next.m12 + self.m22 * next.m22,
            dx: self.dx * next.m11 + self.dy * next.m21 + next.dx,
            dy: self.dx * next.m12 + self.dy * next.m22 + next.dy,
        }
    }

    #[inline]
    pub fn transform_point(self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.m11 + p.y * self.m21 + self.dx,
            p.x * self.m12 + p.y * self.m22 + self.dy,
        )
    }

    /// Maps a direction; translation is ignored.
    #[inline]
    pub fn transform_vector(self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.m11 + v.y * self.m21, v.x * self.m12 + v.y * self.m22)
    }

    /// Axis-aligned bounds of the transformed rectangle.
    pub fn transform_rect_bounds(self, rect: Rect) -> Rect {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        let corners = [
            self.transform_point(min),
            self.transform_point(Vec2::new(max.x, min.y)),
            self.transform_point(max),
            self.transform_point(Vec2::new(min.x, max.y)),
        ];
        Rect::bounding(&corners).unwrap_or(r)
    }

    /// True when the transform keeps axis-aligned rectangles axis-aligned.
    #[inline]
    pub fn is_axis_aligned(self) -> bool {
        self.m12 == 0.0 && self.m21 == 0.0
    }

    /// Geometric mean of the axis scale factors. Used to pick tessellation tolerance.
    #[inline]
    pub fn approx_scale(self) -> f32 {
        (self.m11 * self.m22 - self.m12 * self.m21).abs().sqrt()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn invert(self) -> Option<Transform> {
        let det = self.m11 * self.m22 - self.m12 * self.m21;
        if det.abs() <= f32::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let m11 = self.m22 * inv;
        let m12 = -self.m12 * inv;
        let m21 = -self.m21 * inv;
        let m22 = self.m11 * inv;
        Some(Transform {
            m11,
            m12,
            m21,
            m22,
            dx: -(self.dx * m11 + self.dy * m21),
            dy: -(self.dx * m12 + self.dy * m22),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn rotation_is_clockwise_on_y_down() {
        let t = Transform::rotation_at(90.0, Vec2::zero());
        assert!(close(t.transform_point(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn rotation_keeps_center_fixed() {
        let c = Vec2::new(50.0, 20.0);
        let t = Transform::rotation_at(37.0, c);
        assert!(close(t.transform_point(c), c));
    }

    #[test]
    fn then_applies_left_first() {
        let t = Transform::scale_at(2.0, 2.0, Vec2::zero()).then(Transform::translation(10.0, 0.0));
        assert!(close(t.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0)));
    }

    #[test]
    fn invert_round_trips() {
        let t = Transform::rotation_at(30.0, Vec2::new(4.0, 5.0))
            .then(Transform::scale_at(2.0, 0.5, Vec2::new(1.0, 1.0)));
        let inv = t.invert().unwrap();
        let p = Vec2::new(7.0, -3.0);
        assert!(close(inv.transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert!(Transform::scale_at(0.0, 1.0, Vec2::zero()).invert().is_none());
    }

    #[test]
    fn rect_bounds_under_rotation() {
        let t = Transform::rotation_at(90.0, Vec2::zero());
        let b = t.transform_rect_bounds(Rect::new(0.0, 0.0, 10.0, 5.0));
        assert!((b.size.x - 5.0).abs() < 1e-4);
        assert!((b.size.y - 10.0).abs() < 1e-4);
    }
}
