//! Surface lifecycle notifications.
//!
//! The engine owns the only state machine deciding when a surface exists.
//! Every component that caches surface resources implements
//! [`SurfaceLifecycle`] and is told about each transition.

use crate::device::{Generation, RenderSurface};

/// Implemented by every component holding surface-dependent state.
///
/// Both notifications must be idempotent and must not fail. After
/// `on_surface_lost` the component is dormant: its drawing operations do
/// nothing until the next `on_surface_changed`.
pub trait SurfaceLifecycle {
    /// A new surface is live. Everything cached for an earlier surface is
    /// dropped; resources are recreated lazily against `surface`.
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface);

    /// The surface is gone. Drop every cached handle.
    fn on_surface_lost(&mut self);
}

/// Remembers which surface generation a component is attached to.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SurfaceSlot(Option<Generation>);

impl SurfaceSlot {
    #[inline]
    pub fn attach(&mut self, generation: Generation) {
        self.0 = Some(generation);
    }

    #[inline]
    pub fn detach(&mut self) {
        self.0 = None;
    }

    #[inline]
    pub fn generation(&self) -> Option<Generation> {
        self.0
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }

    /// True when attached to exactly `generation`.
    #[inline]
    pub fn matches(&self, generation: Generation) -> bool {
        self.0 == Some(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_tracks_attachment() {
        let mut slot = SurfaceSlot::default();
        assert!(!slot.is_attached());
        assert!(!slot.matches(Generation(0)));

        slot.attach(Generation(3));
        assert!(slot.matches(Generation(3)));
        assert!(!slot.matches(Generation(4)));

        slot.detach();
        slot.detach();
        assert_eq!(slot.generation(), None);
    }
}
