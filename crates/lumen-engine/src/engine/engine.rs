use anyhow::{Context, Result};

use crate::canvas::{Canvas, CanvasState};
use crate::coords::SurfaceSize;
use crate::device::{EndDrawStatus, Generation, RenderSurface, SurfaceError, SurfaceProvider};
use crate::geometry::GeometryBuilder;
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::Color;
use crate::render::{
    EffectsRenderer, GradientRenderer, PrimitiveRenderer, SpectrumRenderer, TextRenderer,
};
use crate::resources::ResourceCache;
use crate::transform::TransformManager;

use super::{EngineConfig, Frame};

/// Whether the engine currently holds a live surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceState {
    /// Initial state, and the state after every loss.
    NoSurface,
    SurfaceReady,
}

/// Result of [`RenderEngine::end_draw`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// The surface was discarded; the next `begin_draw` builds a new one.
    SurfaceLost,
    /// Non-fatal; the surface is kept.
    Failed(SurfaceError),
    /// `end_draw` without a matching `begin_draw`.
    NotDrawing,
}

/// Everything the engine owns that depends on the surface.
struct Components {
    resources: ResourceCache,
    geometry: GeometryBuilder,
    transforms: TransformManager,
    primitives: PrimitiveRenderer,
    gradients: GradientRenderer,
    effects: EffectsRenderer,
    text: TextRenderer,
    spectrum: SpectrumRenderer,
    canvas: CanvasState,
}

impl Components {
    fn new(config: &EngineConfig) -> Self {
        Self {
            resources: ResourceCache::new(config.gradient_key_precision),
            geometry: GeometryBuilder::new(),
            transforms: TransformManager::new(),
            primitives: PrimitiveRenderer::new(),
            gradients: GradientRenderer::new(),
            effects: EffectsRenderer::new(config.default_glow_quality),
            text: TextRenderer::new(),
            spectrum: SpectrumRenderer::new(),
            canvas: CanvasState::new(),
        }
    }

    /// Lifecycle components in notification order: the cache first, the
    /// canvas state last.
    fn registry(&mut self) -> [&mut dyn SurfaceLifecycle; 8] {
        [
            &mut self.resources,
            &mut self.transforms,
            &mut self.primitives,
            &mut self.gradients,
            &mut self.effects,
            &mut self.text,
            &mut self.spectrum,
            &mut self.canvas,
        ]
    }
}

/// Owns the surface provider, the live surface and the component graph.
///
/// Surfaces are created lazily: [`initialize`](Self::initialize) tries once
/// and every [`begin_draw`](Self::begin_draw) without a surface tries again.
/// A `RecreateTarget` from the surface, or a failed resize, discards the
/// surface and every cached resource; nothing is rebuilt until the next frame.
pub struct RenderEngine<P: SurfaceProvider> {
    provider: P,
    config: EngineConfig,
    initialized: bool,
    surface: Option<P::Surface>,
    last_generation: Generation,
    size: SurfaceSize,
    drawing: bool,
    components: Components,
    listeners: Vec<Box<dyn SurfaceLifecycle>>,
}

impl<P: SurfaceProvider> RenderEngine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Self {
        let components = Components::new(&config);
        Self {
            provider,
            config,
            initialized: false,
            surface: None,
            last_generation: Generation(0),
            size: SurfaceSize::default(),
            drawing: false,
            components,
            listeners: Vec::new(),
        }
    }

    /// Initializes the provider and attempts the first surface.
    ///
    /// Fails only when the provider cannot initialize; the engine then stays
    /// unusable (every frame is skipped) but intact. A failed first surface is
    /// logged and retried by the next `begin_draw`.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.provider
            .initialize()
            .context("surface provider initialization failed")?;
        self.initialized = true;
        self.size = self
            .config
            .initial_size
            .unwrap_or_else(|| self.provider.drawable_size());
        log::debug!("render engine initialized at {}x{}", self.size.width, self.size.height);

        if !self.size.is_empty() {
            self.create_surface();
        }
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SurfaceState {
        if self.surface.is_some() {
            SurfaceState::SurfaceReady
        } else {
            SurfaceState::NoSurface
        }
    }

    /// Generation of the live surface.
    pub fn generation(&self) -> Option<Generation> {
        self.surface.as_ref().map(|s| s.generation())
    }

    /// Last requested size (may be zero while minimized).
    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn surface(&self) -> Option<&P::Surface> {
        self.surface.as_ref()
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.components.resources
    }

    /// Adds an external component to the lifecycle registry. It is notified
    /// right away when a surface is already live.
    pub fn register_listener(&mut self, mut listener: Box<dyn SurfaceLifecycle>) {
        if let Some(surface) = &self.surface {
            listener.on_surface_changed(surface);
        }
        self.listeners.push(listener);
    }

    // ── sizing ────────────────────────────────────────────────────────────

    /// Forwards a new drawable size.
    ///
    /// A zero size is remembered and frames are skipped until a real size
    /// arrives; the surface is kept. A surface that fails to resize is
    /// discarded as if it had been lost.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if size.is_empty() {
            log::debug!("zero-size resize; frames skipped until the next resize");
            return;
        }
        let Some(surface) = self.surface.as_mut() else { return };
        if surface.size() == size {
            return;
        }
        match surface.resize(size) {
            Ok(()) => self.components.canvas.set_size(size),
            Err(e) => {
                log::warn!(
                    "surface resize to {}x{} failed: {e}; discarding",
                    size.width,
                    size.height
                );
                self.discard_surface();
            }
        }
    }

    // ── frames ────────────────────────────────────────────────────────────

    /// Opens a frame, creating the surface first when there is none.
    ///
    /// Returns false when nothing should be drawn this frame: not initialized,
    /// zero size, or surface creation failed.
    pub fn begin_draw(&mut self) -> bool {
        if !self.initialized || self.size.is_empty() {
            return false;
        }
        if self.drawing {
            log::warn!("begin_draw inside an open frame");
            return true;
        }
        if self.surface.is_none() {
            self.create_surface();
        }
        let Some(surface) = self.surface.as_mut() else { return false };
        surface.begin_draw();
        self.drawing = true;
        true
    }

    /// Closes the frame and reacts to the surface's verdict.
    ///
    /// Scopes left open by the caller are closed first.
    pub fn end_draw(&mut self) -> FrameOutcome {
        if !self.drawing {
            return FrameOutcome::NotDrawing;
        }
        self.drawing = false;
        let Some(surface) = self.surface.as_mut() else {
            return FrameOutcome::NotDrawing;
        };
        self.components.effects.unwind(surface);

        match surface.end_draw() {
            EndDrawStatus::Ok => {
                self.components.resources.end_frame(surface);
                FrameOutcome::Presented
            }
            EndDrawStatus::RecreateTarget => {
                log::warn!("surface {} must be recreated; discarding", surface.generation());
                self.discard_surface();
                FrameOutcome::SurfaceLost
            }
            EndDrawStatus::Failed(e) => {
                log::error!("end_draw failed: {e}");
                self.components.resources.end_frame(surface);
                FrameOutcome::Failed(e)
            }
        }
    }

    /// [`begin_draw`](Self::begin_draw) plus a clear to the configured color,
    /// wrapped in a guard that ends the frame when dropped.
    pub fn frame(&mut self) -> Option<Frame<'_, P>> {
        if !self.begin_draw() {
            return None;
        }
        let clear = self.config.clear_color;
        self.clear(clear);
        Some(Frame::new(self))
    }

    /// Clears the live surface. No-op without one.
    pub fn clear(&mut self, color: Color) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear(color);
        }
    }

    /// Drawing façade over the live surface (inert without one).
    pub fn canvas(&mut self) -> Canvas<'_> {
        let c = &mut self.components;
        let surface = self.surface.as_mut().map(|s| s as &mut dyn RenderSurface);
        Canvas::new(surface, &c.resources, &c.geometry, &mut c.transforms)
            .with_primitives(&c.primitives)
            .with_gradients(&c.gradients)
            .with_effects(&c.effects)
            .with_text(&c.text)
            .with_spectrum(&c.spectrum)
            .with_info(c.canvas.info())
    }

    // ── state machine ─────────────────────────────────────────────────────

    /// NoSurface -> SurfaceReady.
    fn create_surface(&mut self) {
        let generation = self.last_generation.next();
        match self.provider.create_surface(generation, self.size) {
            Ok(surface) => {
                self.last_generation = generation;
                log::debug!(
                    "surface {generation} created at {}x{}",
                    self.size.width,
                    self.size.height
                );
                for component in self.components.registry() {
                    component.on_surface_changed(&surface);
                }
                for listener in &mut self.listeners {
                    listener.on_surface_changed(&surface);
                }
                self.surface = Some(surface);
            }
            Err(e) => log::error!("surface creation failed: {e}"),
        }
    }

    /// SurfaceReady -> NoSurface.
    fn discard_surface(&mut self) {
        let Some(surface) = self.surface.take() else { return };
        self.drawing = false;
        for component in self.components.registry() {
            component.on_surface_lost();
        }
        for listener in &mut self.listeners {
            listener.on_surface_lost();
        }
        log::debug!("surface {} discarded", surface.generation());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::device::{DrawCommand, RecordingControl, RecordingProvider};
    use crate::paint::{even_stops, Brush, Paint, RadialGradient};

    fn engine() -> (RenderEngine<RecordingProvider>, RecordingControl) {
        let provider = RecordingProvider::new(SurfaceSize::new(320, 240));
        let control = provider.control();
        (RenderEngine::new(provider, EngineConfig::default()), control)
    }

    fn ready_engine() -> (RenderEngine<RecordingProvider>, RecordingControl) {
        let (mut e, control) = engine();
        e.initialize().expect("init");
        (e, control)
    }

    fn radial_paint() -> Paint {
        let stops = even_stops(&[Color::WHITE, Color::BLACK]);
        Paint::from_brush(RadialGradient::new(Vec2::new(50.0, 50.0), 30.0, stops))
    }

    fn draw_gradient_rect(e: &mut RenderEngine<RecordingProvider>) {
        e.canvas().draw_rectangle(Rect::new(20.0, 20.0, 60.0, 60.0), &radial_paint());
    }

    #[derive(Default)]
    struct Counts {
        changed: Vec<Generation>,
        lost: u32,
    }

    struct Listener(Rc<RefCell<Counts>>);

    impl SurfaceLifecycle for Listener {
        fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
            self.0.borrow_mut().changed.push(surface.generation());
        }
        fn on_surface_lost(&mut self) {
            self.0.borrow_mut().lost += 1;
        }
    }

    // ── initialization ──

    #[test]
    fn initialize_creates_the_first_surface() {
        let (e, control) = ready_engine();
        assert!(e.is_initialized());
        assert_eq!(e.state(), SurfaceState::SurfaceReady);
        assert_eq!(e.generation(), Some(Generation(1)));
        assert_eq!(e.size(), SurfaceSize::new(320, 240));
        assert_eq!(control.stats().surfaces_created, 1);
    }

    #[test]
    fn provider_failure_leaves_engine_unusable() {
        let (mut e, control) = engine();
        control.fail_initialize(true);
        assert!(e.initialize().is_err());
        assert!(!e.is_initialized());
        assert!(!e.begin_draw());
        assert!(e.frame().is_none());
        assert_eq!(e.state(), SurfaceState::NoSurface);
    }

    #[test]
    fn failed_first_surface_is_created_lazily() {
        let (mut e, control) = engine();
        control.fail_surface_creation(1);
        e.initialize().expect("init");
        assert_eq!(e.state(), SurfaceState::NoSurface);

        assert!(e.begin_draw());
        assert_eq!(e.state(), SurfaceState::SurfaceReady);
        assert_eq!(e.generation(), Some(Generation(1)));
        assert_eq!(e.end_draw(), FrameOutcome::Presented);
    }

    // ── device loss ──

    #[test]
    fn device_loss_round_trip_rebuilds_resources() {
        let (mut e, control) = ready_engine();

        assert!(e.begin_draw());
        draw_gradient_rect(&mut e);
        draw_gradient_rect(&mut e);
        assert_eq!(control.stats().brushes_created, 1);

        control.lose_device_on_end_draw(1);
        assert_eq!(e.end_draw(), FrameOutcome::SurfaceLost);
        assert_eq!(e.state(), SurfaceState::NoSurface);
        assert!(e.resources().is_empty());

        control.clear_commands();
        assert!(e.begin_draw());
        assert_eq!(e.generation(), Some(Generation(2)));
        draw_gradient_rect(&mut e);
        assert_eq!(e.end_draw(), FrameOutcome::Presented);

        assert_eq!(control.stats().surfaces_created, 2);
        assert_eq!(control.stats().brushes_created, 2);
        match &control.draw_commands()[..] {
            [DrawCommand::FillRect { brush, .. }] => {
                assert_eq!(brush.handle.generation(), Generation(2));
                assert!(matches!(brush.brush, Brush::Radial(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn generic_end_draw_failure_keeps_the_surface() {
        let (mut e, control) = ready_engine();
        control.fail_end_draw(1);
        assert!(e.begin_draw());
        assert!(matches!(e.end_draw(), FrameOutcome::Failed(_)));
        assert_eq!(e.state(), SurfaceState::SurfaceReady);
        assert_eq!(e.generation(), Some(Generation(1)));
    }

    #[test]
    fn end_without_begin_is_reported() {
        let (mut e, _) = ready_engine();
        assert_eq!(e.end_draw(), FrameOutcome::NotDrawing);
    }

    // ── resize ──

    #[test]
    fn failed_resize_is_treated_as_loss() {
        let (mut e, control) = ready_engine();
        control.fail_resize(true);
        e.resize(SurfaceSize::new(640, 480));
        assert_eq!(e.state(), SurfaceState::NoSurface);

        control.fail_resize(false);
        assert!(e.begin_draw());
        assert_eq!(e.surface().map(|s| s.size()), Some(SurfaceSize::new(640, 480)));
        assert_eq!(e.generation(), Some(Generation(2)));
    }

    #[test]
    fn zero_size_skips_frames_but_keeps_the_surface() {
        let (mut e, control) = ready_engine();
        e.resize(SurfaceSize::new(0, 0));
        assert!(!e.begin_draw());
        assert_eq!(e.state(), SurfaceState::SurfaceReady);

        e.resize(SurfaceSize::new(100, 100));
        assert!(e.begin_draw());
        assert_eq!(e.generation(), Some(Generation(1)));
        assert_eq!(e.canvas().surface_size(), SurfaceSize::new(100, 100));
        assert_eq!(control.stats().resizes, 1);
    }

    // ── frames ──

    #[test]
    fn frame_guard_ends_on_drop() {
        let (mut e, control) = ready_engine();
        {
            let mut frame = e.frame().expect("frame");
            frame.canvas().draw_circle(Vec2::new(10.0, 10.0), 5.0, &Paint::default());
        }
        assert!(!e.is_drawing());
        assert_eq!(control.stats().frames_presented, 1);

        let cmds = control.commands();
        assert!(matches!(cmds.first(), Some(DrawCommand::BeginDraw)));
        assert!(matches!(cmds.get(1), Some(DrawCommand::Clear(_))));
        assert!(matches!(cmds.last(), Some(DrawCommand::EndDraw)));
    }

    #[test]
    fn explicit_end_reports_the_outcome_once() {
        let (mut e, control) = ready_engine();
        control.lose_device_on_end_draw(1);
        let frame = e.frame().expect("frame");
        assert_eq!(frame.end(), FrameOutcome::SurfaceLost);
        assert_eq!(e.state(), SurfaceState::NoSurface);
        assert_eq!(control.stats().frames_presented, 0);
    }

    #[test]
    fn gradients_flushed_mid_frame_are_released_after_present() {
        let (mut e, control) = ready_engine();
        assert!(e.begin_draw());
        let count = crate::resources::MAX_GRADIENT_ENTRIES + 2;
        for i in 0..count {
            let stops = even_stops(&[Color::WHITE, Color::BLACK]);
            let gradient = RadialGradient::new(Vec2::new(50.0, 50.0), 1.0 + i as f32, stops);
            let paint = Paint::from_brush(gradient);
            e.canvas().draw_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &paint);
        }
        assert_eq!(control.stats().brushes_created, count as u32);
        assert_eq!(control.stats().brushes_released, 0);

        assert_eq!(e.end_draw(), FrameOutcome::Presented);
        let released = control.stats().brushes_released;
        assert_eq!(released, crate::resources::MAX_GRADIENT_ENTRIES as u32);
        assert_eq!(e.resources().pending_releases(), 0);
    }

    #[test]
    fn open_scopes_are_closed_before_present() {
        let (mut e, control) = ready_engine();
        assert!(e.begin_draw());
        {
            let mut canvas = e.canvas();
            canvas.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
            canvas.push_layer(0.5, None);
        }
        e.end_draw();

        let cmds = control.commands();
        let n = cmds.len();
        assert_eq!(
            cmds[n - 3..].to_vec(),
            vec![DrawCommand::PopLayer, DrawCommand::PopClip, DrawCommand::EndDraw]
        );
    }

    #[test]
    fn transform_stack_is_cleared_on_loss() {
        let (mut e, control) = ready_engine();
        assert!(e.begin_draw());
        {
            let mut canvas = e.canvas();
            canvas.push_transform();
            canvas.push_transform();
            assert_eq!(canvas.transform_depth(), 2);
        }
        control.lose_device_on_end_draw(1);
        e.end_draw();
        assert!(e.begin_draw());
        assert_eq!(e.canvas().transform_depth(), 0);
    }

    // ── listeners ──

    #[test]
    fn listeners_follow_the_state_machine() {
        let (mut e, control) = ready_engine();
        let counts = Rc::new(RefCell::new(Counts::default()));
        e.register_listener(Box::new(Listener(counts.clone())));
        assert_eq!(counts.borrow().changed, vec![Generation(1)]);

        control.lose_device_on_end_draw(1);
        assert!(e.begin_draw());
        e.end_draw();
        assert_eq!(counts.borrow().lost, 1);

        assert!(e.begin_draw());
        assert_eq!(counts.borrow().changed, vec![Generation(1), Generation(2)]);
    }
}
