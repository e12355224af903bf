use crate::coords::{Transform, Vec2};
use crate::device::RenderSurface;
use crate::lifecycle::{SurfaceLifecycle, SurfaceSlot};

/// Saved transforms beyond this depth are refused.
pub const MAX_TRANSFORM_DEPTH: usize = 32;

/// Depth-bounded save/restore stack over the surface transform.
///
/// The stack only saves and restores. Relative operations compose with the
/// transform currently set on the surface, never with the top of the stack:
/// `translate_by` after a push moves relative to whatever the surface has now.
#[derive(Debug, Default)]
pub struct TransformManager {
    stack: Vec<Transform>,
    slot: SurfaceSlot,
}

impl TransformManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved transforms.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Saves the surface transform. Returns false (and logs) when the stack
    /// is full or no surface is attached; the stack is left untouched.
    pub fn push_transform(&mut self, surface: &mut dyn RenderSurface) -> bool {
        if !self.attached(surface) {
            return false;
        }
        if self.stack.len() >= MAX_TRANSFORM_DEPTH {
            log::warn!("transform stack full ({MAX_TRANSFORM_DEPTH}); push refused");
            return false;
        }
        self.stack.push(surface.transform());
        true
    }

    /// Restores the most recently saved transform.
    ///
    /// An unmatched pop resets the surface to identity and logs a warning.
    pub fn pop_transform(&mut self, surface: &mut dyn RenderSurface) {
        if !self.attached(surface) {
            return;
        }
        match self.stack.pop() {
            Some(t) => surface.set_transform(t),
            None => {
                log::warn!("pop_transform on an empty stack; resetting to identity");
                surface.set_transform(Transform::identity());
            }
        }
    }

    /// Replaces the surface transform. The stack is not touched.
    pub fn set_transform(&mut self, surface: &mut dyn RenderSurface, transform: Transform) {
        if self.attached(surface) && transform.is_finite() {
            surface.set_transform(transform);
        }
    }

    pub fn reset(&mut self, surface: &mut dyn RenderSurface) {
        self.set_transform(surface, Transform::identity());
    }

    /// Rotates by `degrees` (clockwise) around `center`.
    pub fn rotate_at(&mut self, surface: &mut dyn RenderSurface, degrees: f32, center: Vec2) {
        if degrees.is_finite() && center.is_finite() {
            self.compose(surface, Transform::rotation_at(degrees, center));
        }
    }

    pub fn scale_at(&mut self, surface: &mut dyn RenderSurface, sx: f32, sy: f32, center: Vec2) {
        if sx.is_finite() && sy.is_finite() && center.is_finite() {
            self.compose(surface, Transform::scale_at(sx, sy, center));
        }
    }

    pub fn translate_by(&mut self, surface: &mut dyn RenderSurface, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.compose(surface, Transform::translation(dx, dy));
        }
    }

    /// Read-modify-write: `op` applies in local space, before the current transform.
    fn compose(&mut self, surface: &mut dyn RenderSurface, op: Transform) {
        if self.attached(surface) {
            let current = surface.transform();
            surface.set_transform(op.then(current));
        }
    }

    /// False while dormant. A surface of another generation drops the stack.
    fn attached(&mut self, surface: &dyn RenderSurface) -> bool {
        let Some(live) = self.slot.generation() else {
            return false;
        };
        if live != surface.generation() {
            log::warn!(
                "transform stack saw surface {} while attached to {live}; dropping {} entries",
                surface.generation(),
                self.stack.len()
            );
            self.stack.clear();
            self.slot.attach(surface.generation());
        }
        true
    }
}

impl SurfaceLifecycle for TransformManager {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.stack.clear();
        self.slot.attach(surface.generation());
    }

    fn on_surface_lost(&mut self) {
        self.stack.clear();
        self.slot.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SurfaceSize;
    use crate::device::{Generation, RecordingProvider, RecordingSurface, SurfaceProvider};

    fn setup() -> (RecordingSurface, TransformManager) {
        let mut provider = RecordingProvider::new(SurfaceSize::new(10, 10));
        let surface = provider.create_surface(Generation(1), SurfaceSize::new(10, 10)).unwrap();
        let mut tm = TransformManager::new();
        tm.on_surface_changed(&surface);
        (surface, tm)
    }

    #[test]
    fn push_pop_is_lifo() {
        let (mut s, mut tm) = setup();
        tm.translate_by(&mut s, 3.0, 4.0);
        let before = s.transform();

        for i in 0..10 {
            assert!(tm.push_transform(&mut s));
            tm.rotate_at(&mut s, 15.0 * i as f32, Vec2::new(1.0, 2.0));
            tm.scale_at(&mut s, 1.5, 0.5, Vec2::zero());
        }
        for _ in 0..10 {
            tm.pop_transform(&mut s);
        }

        assert_eq!(s.transform(), before);
        assert_eq!(tm.depth(), 0);
    }

    #[test]
    fn depth_is_bounded() {
        let (mut s, mut tm) = setup();
        for _ in 0..MAX_TRANSFORM_DEPTH {
            assert!(tm.push_transform(&mut s));
        }
        assert!(!tm.push_transform(&mut s));
        assert_eq!(tm.depth(), MAX_TRANSFORM_DEPTH);
    }

    #[test]
    fn unmatched_pop_resets_to_identity() {
        let (mut s, mut tm) = setup();
        tm.translate_by(&mut s, 5.0, 5.0);
        tm.pop_transform(&mut s);
        assert_eq!(s.transform(), Transform::identity());
    }

    #[test]
    fn relative_ops_compose_with_the_surface_transform() {
        let (mut s, mut tm) = setup();
        tm.translate_by(&mut s, 10.0, 0.0);
        tm.push_transform(&mut s);
        tm.translate_by(&mut s, 0.0, 5.0);
        let p = s.transform().transform_point(Vec2::zero());
        assert_eq!(p, Vec2::new(10.0, 5.0));
    }

    #[test]
    fn rotation_turns_clockwise_about_center() {
        let (mut s, mut tm) = setup();
        tm.rotate_at(&mut s, 90.0, Vec2::new(5.0, 5.0));
        let p = s.transform().transform_point(Vec2::new(10.0, 5.0));
        assert!((p.x - 5.0).abs() < 1e-4 && (p.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn lifecycle_clears_the_stack() {
        let (mut s, mut tm) = setup();
        tm.push_transform(&mut s);
        tm.push_transform(&mut s);
        tm.on_surface_lost();
        assert_eq!(tm.depth(), 0);

        // Dormant: nothing happens.
        assert!(!tm.push_transform(&mut s));
        tm.translate_by(&mut s, 1.0, 1.0);
        assert_eq!(s.transform(), Transform::identity());

        tm.on_surface_changed(&s);
        assert!(tm.push_transform(&mut s));
    }
}
