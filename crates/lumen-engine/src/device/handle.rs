use std::fmt;

use slotmap::new_key_type;

/// Identifies one surface incarnation.
///
/// The engine bumps the generation every time it creates a surface. Handles
/// remember the generation that minted them, so a handle can never be
/// confused with one from a recreated surface even if slot keys repeat.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Generation(pub u64);

impl Generation {
    #[inline]
    pub fn next(self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

new_key_type! {
    pub struct BrushKey;
    pub struct GeometryKey;
    pub struct StrokeStyleKey;
    pub struct TextFormatKey;
}

/// Surface resource reference: a slot key plus the owning generation.
///
/// Handles are plain values. Dropping one does not release anything; the
/// surface owns the resource until `release_*` is called or the surface
/// itself is dropped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Handle<K: slotmap::Key> {
    key: K,
    generation: Generation,
}

impl<K: slotmap::Key> Handle<K> {
    #[inline]
    pub fn new(key: K, generation: Generation) -> Self {
        Self { key, generation }
    }

    #[inline]
    pub fn key(&self) -> K {
        self.key
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True when the handle was minted by a surface of generation `live`.
    #[inline]
    pub fn belongs_to(&self, live: Generation) -> bool {
        self.generation == live
    }
}

pub type BrushHandle = Handle<BrushKey>;
pub type GeometryHandle = Handle<GeometryKey>;
pub type StrokeStyleHandle = Handle<StrokeStyleKey>;
pub type TextFormatHandle = Handle<TextFormatKey>;

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn same_slot_different_generation_is_distinct() {
        let mut slots: SlotMap<BrushKey, ()> = SlotMap::with_key();
        let key = slots.insert(());
        let a = BrushHandle::new(key, Generation(1));
        let b = BrushHandle::new(key, Generation(2));
        assert_ne!(a, b);
        assert!(a.belongs_to(Generation(1)));
        assert!(!a.belongs_to(Generation(2)));
    }

    #[test]
    fn generation_increments() {
        assert_eq!(Generation::default().next(), Generation(1));
        assert_eq!(Generation(u64::MAX).next(), Generation(0));
    }
}
