use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::device::{BrushHandle, Generation, GeometryHandle, RenderSurface, SurfaceError};
use crate::geometry::{GeometrySink, PathBuilder};
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::{Brush, Color, ColorStop, LinearGradient, RadialGradient};

/// Decimal places used for gradient coordinates in cache keys.
pub const DEFAULT_KEY_PRECISION: usize = 2;
const MAX_KEY_PRECISION: usize = 6;

/// Gradient tables are flushed once either grows past this many entries.
pub const MAX_GRADIENT_ENTRIES: usize = 256;

/// Hit/miss counters since construction.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub brushes_created: u64,
    pub geometries_created: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheState {
    /// Generation of the surface the tables belong to; `None` while dormant.
    live: Option<Generation>,
    solid: Option<BrushHandle>,
    linear: HashMap<String, BrushHandle>,
    radial: HashMap<String, BrushHandle>,
    geometries: HashMap<String, GeometryHandle>,
    pending_brushes: Vec<BrushHandle>,
    pending_geometries: Vec<GeometryHandle>,
    stats: CacheStats,
}

impl CacheState {
    /// Forgets every handle without releasing it; the surface that owned
    /// them is gone.
    fn forget_all(&mut self) {
        self.solid = None;
        self.linear.clear();
        self.radial.clear();
        self.geometries.clear();
        self.pending_brushes.clear();
        self.pending_geometries.clear();
    }

    /// Queues every handle for release at the next frame boundary.
    fn retire_all(&mut self) {
        self.pending_brushes.extend(self.solid.take());
        self.pending_brushes.extend(self.linear.drain().map(|(_, h)| h));
        self.pending_brushes.extend(self.radial.drain().map(|(_, h)| h));
        self.pending_geometries.extend(self.geometries.drain().map(|(_, h)| h));
    }

    fn entries(&self) -> usize {
        usize::from(self.solid.is_some())
            + self.linear.len()
            + self.radial.len()
            + self.geometries.len()
    }
}

/// Surface-resource cache for brushes and keyed path geometries.
///
/// Resolution methods take `&self`: the tables live behind a `RefCell`, so
/// every renderer can share one cache through a plain reference. The cache
/// is single-threaded (`!Sync`) and borrows never span a call into caller
/// code.
///
/// Entries are tagged with the surface [`Generation`] they were created on.
/// Resolving against a surface of a different generation flushes the tables
/// first, so a handle can never outlive its surface even when a lifecycle
/// notification was missed.
pub struct ResourceCache {
    precision: usize,
    state: RefCell<CacheState>,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PRECISION)
    }
}

impl ResourceCache {
    pub fn new(key_precision: usize) -> Self {
        Self {
            precision: key_precision.min(MAX_KEY_PRECISION),
            state: RefCell::new(CacheState::default()),
        }
    }

    /// True between `on_surface_changed` and `on_surface_lost`.
    pub fn is_live(&self) -> bool {
        self.state.borrow().live.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.state.borrow().stats
    }

    /// Number of cached entries across every table.
    pub fn len(&self) -> usize {
        self.state.borrow().entries()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts everything. Surface handles are released at the next
    /// [`end_frame`](Self::end_frame).
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        let n = state.entries();
        state.retire_all();
        log::debug!("resource cache cleared ({n} entries)");
    }

    // ── resolution ────────────────────────────────────────────────────────

    /// Surface brush for `brush`, with `global_alpha` applied as its opacity.
    ///
    /// Returns `None` while dormant, for gradients with fewer than two stops,
    /// and when the surface refuses to create the brush.
    pub fn brush(
        &self,
        surface: &mut dyn RenderSurface,
        brush: &Brush,
        global_alpha: f32,
    ) -> Option<BrushHandle> {
        if brush.stops().len() < 2 && !matches!(brush, Brush::Solid(_)) {
            return None;
        }
        if !self.sync(surface) {
            return None;
        }

        let opacity = if global_alpha.is_finite() { global_alpha.clamp(0.0, 1.0) } else { 1.0 };
        let handle = match brush {
            Brush::Solid(color) => self.solid_brush(surface, *color)?,
            Brush::Linear(g) => {
                let key = self.linear_key(g);
                self.gradient_brush(surface, key, true, |s| s.create_linear_gradient_brush(g))?
            }
            Brush::Radial(g) => {
                let key = self.radial_key(g);
                self.gradient_brush(surface, key, false, |s| s.create_radial_gradient_brush(g))?
            }
        };
        // Shared brushes get the caller's alpha on every resolution.
        surface.set_brush_opacity(handle, opacity);
        Some(handle)
    }

    /// Cached geometry for `key`, built on first use.
    ///
    /// `build` receives an open sink and runs only on a miss. An empty result
    /// is not cached and returns `None`.
    pub fn path_geometry(
        &self,
        surface: &mut dyn RenderSurface,
        key: &str,
        build: impl FnOnce(&mut dyn GeometrySink),
    ) -> Option<GeometryHandle> {
        if !self.sync(surface) {
            return None;
        }
        {
            let mut state = self.state.borrow_mut();
            if let Some(handle) = state.geometries.get(key).copied() {
                state.stats.hits += 1;
                return Some(handle);
            }
            state.stats.misses += 1;
        }

        let mut sink = PathBuilder::new();
        build(&mut sink);
        let path = sink.finish();
        if path.is_empty() {
            return None;
        }

        match surface.create_geometry(&path) {
            Ok(handle) => {
                let mut state = self.state.borrow_mut();
                state.stats.geometries_created += 1;
                state.geometries.insert(key.to_string(), handle);
                Some(handle)
            }
            Err(e) => {
                log::error!("failed to create cached geometry '{key}': {e}");
                None
            }
        }
    }

    /// Adopts `surface`. Returns false while dormant.
    fn sync(&self, surface: &dyn RenderSurface) -> bool {
        let generation = surface.generation();
        let mut state = self.state.borrow_mut();
        match state.live {
            None => false,
            Some(live) if live != generation => {
                log::warn!(
                    "resource cache saw surface {generation} while attached to {live}; flushing"
                );
                state.forget_all();
                state.live = Some(generation);
                true
            }
            Some(_) => true,
        }
    }

    /// Releases handles retired since the last frame boundary.
    ///
    /// Call once the frame that may still reference them has been submitted.
    /// Handles from another generation are dropped without release.
    pub fn end_frame(&self, surface: &mut dyn RenderSurface) {
        let generation = surface.generation();
        let (brushes, geometries) = {
            let mut state = self.state.borrow_mut();
            (
                std::mem::take(&mut state.pending_brushes),
                std::mem::take(&mut state.pending_geometries),
            )
        };
        if brushes.is_empty() && geometries.is_empty() {
            return;
        }
        log::trace!(
            "releasing {} brushes and {} geometries at frame end",
            brushes.len(),
            geometries.len()
        );
        for h in brushes.into_iter().filter(|h| h.belongs_to(generation)) {
            surface.release_brush(h);
        }
        for h in geometries.into_iter().filter(|h| h.belongs_to(generation)) {
            surface.release_geometry(h);
        }
    }

    /// Number of retired handles awaiting [`end_frame`](Self::end_frame).
    pub fn pending_releases(&self) -> usize {
        let state = self.state.borrow();
        state.pending_brushes.len() + state.pending_geometries.len()
    }

    fn solid_brush(&self, surface: &mut dyn RenderSurface, color: Color) -> Option<BrushHandle> {
        let existing = self.state.borrow().solid;
        if let Some(handle) = existing {
            self.state.borrow_mut().stats.hits += 1;
            surface.set_solid_brush_color(handle, color);
            return Some(handle);
        }

        match surface.create_solid_brush(color) {
            Ok(handle) => {
                let mut state = self.state.borrow_mut();
                state.stats.misses += 1;
                state.stats.brushes_created += 1;
                state.solid = Some(handle);
                Some(handle)
            }
            Err(e) => {
                log::error!("failed to create solid brush: {e}");
                None
            }
        }
    }

    fn gradient_brush(
        &self,
        surface: &mut dyn RenderSurface,
        key: String,
        linear: bool,
        create: impl FnOnce(&mut dyn RenderSurface) -> Result<BrushHandle, SurfaceError>,
    ) -> Option<BrushHandle> {
        {
            let mut state = self.state.borrow_mut();
            let table = if linear { &state.linear } else { &state.radial };
            if let Some(handle) = table.get(&key).copied() {
                state.stats.hits += 1;
                return Some(handle);
            }
            state.stats.misses += 1;
        }

        let handle = match create(surface) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("failed to create gradient brush {key}: {e}");
                return None;
            }
        };

        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.stats.brushes_created += 1;
        let table = if linear { &mut state.linear } else { &mut state.radial };
        if table.len() >= MAX_GRADIENT_ENTRIES {
            log::debug!("gradient table full; flushing {} entries", table.len());
            state.pending_brushes.extend(table.drain().map(|(_, h)| h));
        }
        table.insert(key, handle);
        Some(handle)
    }

    // ── keys ──────────────────────────────────────────────────────────────

    fn push_stops(&self, key: &mut String, stops: &[ColorStop]) {
        let p = self.precision;
        for s in stops {
            let _ = write!(
                key,
                "|{:.p$}:{:.4},{:.4},{:.4},{:.4}",
                s.t, s.color.r, s.color.g, s.color.b, s.color.a
            );
        }
    }

    fn linear_key(&self, g: &LinearGradient) -> String {
        let p = self.precision;
        let mut key = format!(
            "L|{:.p$},{:.p$}|{:.p$},{:.p$}|{:?}",
            g.start.x, g.start.y, g.end.x, g.end.y, g.spread
        );
        self.push_stops(&mut key, &g.stops);
        key
    }

    fn radial_key(&self, g: &RadialGradient) -> String {
        let p = self.precision;
        let mut key = format!(
            "R|{:.p$},{:.p$}|{:.p$},{:.p$}|{:.p$},{:.p$}|{:?}",
            g.center.x,
            g.center.y,
            g.origin_offset.x,
            g.origin_offset.y,
            g.radius_x,
            g.radius_y,
            g.spread
        );
        self.push_stops(&mut key, &g.stops);
        key
    }
}

impl SurfaceLifecycle for ResourceCache {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        let state = self.state.get_mut();
        state.forget_all();
        state.live = Some(surface.generation());
        log::debug!("resource cache attached to {}", surface.generation());
    }

    fn on_surface_lost(&mut self) {
        let state = self.state.get_mut();
        state.forget_all();
        state.live = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::coords::{Rect, SurfaceSize, Vec2};
    use crate::device::{
        DrawCommand, RecordingControl, RecordingProvider, RecordingSurface, SurfaceProvider,
    };
    use crate::paint::even_stops;

    fn setup() -> (RecordingProvider, RecordingSurface, RecordingControl, ResourceCache) {
        let mut provider = RecordingProvider::new(SurfaceSize::new(100, 100));
        let control = provider.control();
        let surface = provider.create_surface(Generation(1), SurfaceSize::new(100, 100)).unwrap();
        let mut cache = ResourceCache::default();
        cache.on_surface_changed(&surface);
        (provider, surface, control, cache)
    }

    fn radial(color: Color) -> Brush {
        Brush::Radial(RadialGradient::new(
            Vec2::new(50.0, 50.0),
            20.0,
            even_stops(&[color, Color::transparent()]),
        ))
    }

    fn linear(x: f32) -> Brush {
        Brush::Linear(LinearGradient::new(
            Vec2::new(x, 0.0),
            Vec2::new(100.0, 0.0),
            even_stops(&[Color::WHITE, Color::BLACK]),
        ))
    }

    // ── brushes ───────────────────────────────────────────────────────────

    #[test]
    fn solid_brushes_share_one_slot() {
        let (_p, mut surface, control, cache) = setup();
        let a = cache.brush(&mut surface, &Brush::Solid(Color::WHITE), 1.0);
        let b = cache.brush(&mut surface, &Brush::Solid(Color::BLACK), 1.0);
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(control.stats().brushes_created, 1);
    }

    #[test]
    fn gradient_resolution_is_idempotent() {
        let (_p, mut surface, control, cache) = setup();
        let a = cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        let b = cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(control.stats().brushes_created, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn different_stop_colors_get_different_brushes() {
        let (_p, mut surface, _control, cache) = setup();
        let a = cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        let b = cache.brush(&mut surface, &radial(Color::BLACK), 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn key_precision_merges_nearby_coordinates() {
        let (_p, mut surface, _control, cache) = setup();
        let a = cache.brush(&mut surface, &linear(10.0), 1.0);
        let b = cache.brush(&mut surface, &linear(10.001), 1.0);
        let c = cache.brush(&mut surface, &linear(10.5), 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn degenerate_gradient_resolves_to_none() {
        let (_p, mut surface, control, cache) = setup();
        let one_stop = Brush::Linear(LinearGradient::new(
            Vec2::zero(),
            Vec2::new(1.0, 0.0),
            vec![ColorStop::new(0.0, Color::WHITE)],
        ));
        assert_eq!(cache.brush(&mut surface, &one_stop, 1.0), None);
        assert_eq!(control.stats().brushes_created, 0);
    }

    #[test]
    fn global_alpha_becomes_brush_opacity() {
        let (_p, mut surface, control, cache) = setup();
        let h = cache.brush(&mut surface, &radial(Color::WHITE), 0.25).unwrap();
        surface.begin_draw();
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), h);
        let h = cache.brush(&mut surface, &radial(Color::WHITE), 0.75).unwrap();
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), h);
        surface.end_draw();

        let opacities: Vec<f32> = control
            .draw_commands()
            .iter()
            .filter_map(DrawCommand::brush)
            .map(|b| b.opacity)
            .collect();
        assert_eq!(opacities, vec![0.25, 0.75]);
    }

    #[test]
    fn refused_creation_returns_none() {
        let (_p, mut surface, control, cache) = setup();
        control.fail_resource_creation(true);
        assert_eq!(cache.brush(&mut surface, &radial(Color::WHITE), 1.0), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn gradient_table_is_bounded() {
        let (_p, mut surface, control, cache) = setup();
        for i in 0..=MAX_GRADIENT_ENTRIES {
            cache.brush(&mut surface, &linear(i as f32), 1.0);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.pending_releases(), MAX_GRADIENT_ENTRIES);
        cache.end_frame(&mut surface);
        assert_eq!(control.stats().brushes_released, MAX_GRADIENT_ENTRIES as u32);
        assert_eq!(cache.pending_releases(), 0);
    }

    #[test]
    fn flushed_gradients_survive_until_frame_end() {
        let (_p, mut surface, control, cache) = setup();
        surface.begin_draw();
        let mut drawn = Vec::new();
        for i in 0..MAX_GRADIENT_ENTRIES + 2 {
            let brush = Brush::Radial(RadialGradient::new(
                Vec2::new(50.0, 50.0),
                1.0 + i as f32,
                even_stops(&[Color::WHITE, Color::transparent()]),
            ));
            let h = cache.brush(&mut surface, &brush, 1.0).unwrap();
            surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), h);
            drawn.push(h);
        }
        assert_eq!(control.stats().brushes_released, 0);
        assert_eq!(surface.live_brushes(), drawn.len());

        surface.end_draw();
        cache.end_frame(&mut surface);
        assert_eq!(control.stats().brushes_released, MAX_GRADIENT_ENTRIES as u32);
        assert_eq!(surface.live_brushes(), 2);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn path_geometry_builds_once() {
        let (_p, mut surface, _control, cache) = setup();
        let builds = Cell::new(0);
        let build = |sink: &mut dyn GeometrySink| {
            builds.set(builds.get() + 1);
            sink.begin_figure(Vec2::zero(), true);
            sink.add_line(Vec2::new(10.0, 0.0));
            sink.add_line(Vec2::new(10.0, 10.0));
            sink.end_figure(true);
        };
        let a = cache.path_geometry(&mut surface, "tri", build);
        let b = cache.path_geometry(&mut surface, "tri", build);
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn empty_build_is_not_cached() {
        let (_p, mut surface, _control, cache) = setup();
        assert_eq!(cache.path_geometry(&mut surface, "nothing", |_| {}), None);
        assert!(cache.is_empty());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn dormant_cache_resolves_nothing() {
        let (_p, mut surface, control, mut cache) = setup();
        cache.on_surface_lost();
        assert!(!cache.is_live());
        assert_eq!(cache.brush(&mut surface, &Brush::Solid(Color::WHITE), 1.0), None);
        assert_eq!(cache.path_geometry(&mut surface, "k", |s| {
            s.begin_figure(Vec2::zero(), true);
            s.add_line(Vec2::new(1.0, 1.0));
            s.end_figure(false);
        }), None);
        assert_eq!(control.stats().brushes_created, 0);
    }

    #[test]
    fn notifications_force_fresh_construction() {
        let (mut provider, mut surface, control, mut cache) = setup();
        let before = cache.brush(&mut surface, &radial(Color::WHITE), 1.0).unwrap();

        cache.on_surface_lost();
        let mut fresh = provider.create_surface(Generation(2), SurfaceSize::new(100, 100)).unwrap();
        cache.on_surface_changed(&fresh);
        let after = cache.brush(&mut fresh, &radial(Color::WHITE), 1.0).unwrap();

        assert_ne!(before, after);
        assert_eq!(after.generation(), Generation(2));
        assert_eq!(control.stats().brushes_created, 2);
    }

    #[test]
    fn generation_mismatch_flushes_without_notification() {
        let (mut provider, mut surface, _control, cache) = setup();
        let before = cache.brush(&mut surface, &radial(Color::WHITE), 1.0).unwrap();
        let mut other = provider.create_surface(Generation(5), SurfaceSize::new(100, 100)).unwrap();
        let after = cache.brush(&mut other, &radial(Color::WHITE), 1.0).unwrap();
        assert_ne!(before, after);
        assert_eq!(after.generation(), Generation(5));
    }

    #[test]
    fn manual_clear_releases_at_frame_end() {
        let (_p, mut surface, control, cache) = setup();
        cache.brush(&mut surface, &Brush::Solid(Color::WHITE), 1.0);
        cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        cache.clear();
        assert!(cache.is_empty());

        cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        assert_eq!(control.stats().brushes_released, 0);
        cache.end_frame(&mut surface);
        assert_eq!(control.stats().brushes_released, 2);
        assert_eq!(control.stats().brushes_created, 3);
    }

    #[test]
    fn end_frame_skips_handles_from_other_surfaces() {
        let (mut provider, mut surface, control, cache) = setup();
        cache.brush(&mut surface, &radial(Color::WHITE), 1.0);
        cache.clear();
        let mut other = provider.create_surface(Generation(2), SurfaceSize::new(100, 100)).unwrap();
        cache.end_frame(&mut other);
        assert_eq!(control.stats().brushes_released, 0);
        assert_eq!(cache.pending_releases(), 0);
    }
}
