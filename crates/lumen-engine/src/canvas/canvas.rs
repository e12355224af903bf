use crate::coords::{Rect, SurfaceSize, Transform, Vec2};
use crate::device::{GeometryHandle, RenderSurface};
use crate::geometry::{GeometryBuilder, GeometrySink, PathData};
use crate::paint::{Brush, Color, ColorStop, LinearGradient, Paint, PaintStyle, RadialGradient};
use crate::render::effects::{Shadow, ShadowTarget};
use crate::render::gradients::DEFAULT_ANGULAR_SEGMENTS;
use crate::render::{
    EffectsRenderer, GradientRenderer, PrimitiveRenderer, RenderCtx, SpectrumRenderer,
    TextRenderer,
};
use crate::resources::ResourceCache;
use crate::spectrum::{BarStyle, SpectrumSource, WaveformStyle};
use crate::text::TextStyle;
use crate::transform::TransformManager;

use super::SurfaceInfo;

/// Frame-scoped drawing API.
///
/// Every operation forwards to one renderer. A canvas without a surface, or
/// without the renderer an operation needs, turns that operation into a no-op.
/// Nothing returns an error: a call that cannot draw simply does not draw.
pub struct Canvas<'f> {
    surface: Option<&'f mut dyn RenderSurface>,
    resources: &'f ResourceCache,
    geometry: &'f GeometryBuilder,
    transforms: &'f mut TransformManager,
    primitives: Option<&'f PrimitiveRenderer>,
    gradients: Option<&'f GradientRenderer>,
    effects: Option<&'f EffectsRenderer>,
    text: Option<&'f TextRenderer>,
    spectrum: Option<&'f SpectrumRenderer>,
    info: Option<SurfaceInfo>,
}

impl<'f> Canvas<'f> {
    /// A canvas with no renderers attached. Add them with the `with_*` methods.
    pub fn new(
        surface: Option<&'f mut dyn RenderSurface>,
        resources: &'f ResourceCache,
        geometry: &'f GeometryBuilder,
        transforms: &'f mut TransformManager,
    ) -> Self {
        Self {
            surface,
            resources,
            geometry,
            transforms,
            primitives: None,
            gradients: None,
            effects: None,
            text: None,
            spectrum: None,
            info: None,
        }
    }

    pub fn with_primitives(mut self, r: &'f PrimitiveRenderer) -> Self {
        self.primitives = Some(r);
        self
    }

    pub fn with_gradients(mut self, r: &'f GradientRenderer) -> Self {
        self.gradients = Some(r);
        self
    }

    pub fn with_effects(mut self, r: &'f EffectsRenderer) -> Self {
        self.effects = Some(r);
        self
    }

    pub fn with_text(mut self, r: &'f TextRenderer) -> Self {
        self.text = Some(r);
        self
    }

    pub fn with_spectrum(mut self, r: &'f SpectrumRenderer) -> Self {
        self.spectrum = Some(r);
        self
    }

    pub fn with_info(mut self, info: Option<SurfaceInfo>) -> Self {
        self.info = info;
        self
    }

    // ── surface ───────────────────────────────────────────────────────────

    /// Generation and size of the surface this canvas draws to, if any.
    #[inline]
    pub fn surface_info(&self) -> Option<SurfaceInfo> {
        self.info
    }

    /// Surface size in pixels; zero without a surface.
    pub fn surface_size(&self) -> SurfaceSize {
        match &self.surface {
            Some(s) => s.size(),
            None => self.info.map(|i| i.size).unwrap_or_default(),
        }
    }

    /// Direct surface access for calls the canvas does not cover.
    ///
    /// Resources created here are the caller's to release.
    pub fn surface(&mut self) -> Option<&mut (dyn RenderSurface + 'f)> {
        self.surface.as_deref_mut()
    }

    pub fn clear(&mut self, color: Color) {
        if let Some(s) = self.surface.as_deref_mut() {
            s.clear(color);
        }
    }

    // ── rectangles ────────────────────────────────────────────────────────

    pub fn draw_rectangle(&mut self, rect: Rect, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_rectangle(ctx, rect, paint));
    }

    pub fn draw_rounded_rectangle(&mut self, rect: Rect, rx: f32, ry: f32, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_rounded_rectangle(ctx, rect, rx, ry, paint));
    }

    pub fn draw_rectangles(&mut self, rects: &[Rect], paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_rectangles(ctx, rects, paint));
    }

    // ── ellipses ──────────────────────────────────────────────────────────

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_circle(ctx, center, radius, paint));
    }

    pub fn draw_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_ellipse(ctx, center, rx, ry, paint));
    }

    pub fn draw_circles(&mut self, centers: &[Vec2], radius: f32, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_circles(ctx, centers, radius, paint));
    }

    pub fn draw_ring(&mut self, center: Vec2, inner: f32, outer: f32, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_ring(ctx, center, inner, outer, paint));
    }

    // ── lines ─────────────────────────────────────────────────────────────

    pub fn draw_line(&mut self, from: Vec2, to: Vec2, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_line(ctx, from, to, paint));
    }

    pub fn draw_polyline(&mut self, points: &[Vec2], paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_polyline(ctx, points, paint));
    }

    pub fn draw_polygon(&mut self, points: &[Vec2], paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_polygon(ctx, points, paint));
    }

    pub fn draw_grid(&mut self, rect: Rect, cell: Vec2, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_grid(ctx, rect, cell, paint));
    }

    // ── arcs and polygons ─────────────────────────────────────────────────

    pub fn draw_arc(
        &mut self,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
        paint: &Paint,
    ) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_arc(ctx, center, radius, start_deg, sweep_deg, paint));
    }

    pub fn draw_sector(
        &mut self,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
        paint: &Paint,
    ) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_sector(ctx, center, radius, start_deg, sweep_deg, paint));
    }

    pub fn draw_regular_polygon(
        &mut self,
        center: Vec2,
        radius: f32,
        sides: u32,
        rotation_deg: f32,
        paint: &Paint,
    ) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| {
            p.draw_regular_polygon(ctx, center, radius, sides, rotation_deg, paint)
        });
    }

    pub fn draw_star(
        &mut self,
        center: Vec2,
        outer_radius: f32,
        inner_radius: f32,
        points: u32,
        paint: &Paint,
    ) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_star(ctx, center, outer_radius, inner_radius, points, paint));
    }

    // ── paths ─────────────────────────────────────────────────────────────

    /// Fills and/or strokes `path` according to the paint style.
    pub fn draw_path(&mut self, path: &PathData, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_path(ctx, path, paint));
    }

    pub fn fill_path(&mut self, path: &PathData, paint: &Paint) {
        self.draw_path(path, &paint.with_style(PaintStyle::Fill));
    }

    pub fn stroke_path(&mut self, path: &PathData, paint: &Paint) {
        self.draw_path(path, &paint.with_style(PaintStyle::Stroke));
    }

    /// Draws the geometry cached under `key`, building it with `build` the
    /// first time (and again after the surface changes).
    pub fn draw_cached_path(
        &mut self,
        key: &str,
        build: impl FnOnce(&mut dyn GeometrySink),
        paint: &Paint,
    ) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| {
            let resources = ctx.resources;
            if let Some(g) = resources.path_geometry(&mut *ctx.surface, key, build) {
                p.draw_geometry(ctx, g, paint);
            }
        });
    }

    /// Draws a geometry the caller created through [`surface`](Self::surface).
    pub fn draw_geometry(&mut self, geometry: GeometryHandle, paint: &Paint) {
        let Some(p) = self.primitives else { return };
        self.with_ctx(|ctx| p.draw_geometry(ctx, geometry, paint));
    }

    // ── gradients ─────────────────────────────────────────────────────────

    pub fn fill_linear_gradient(&mut self, rect: Rect, gradient: &LinearGradient) {
        let Some(g) = self.gradients else { return };
        self.with_ctx(|ctx| g.fill_rect_linear(ctx, rect, gradient, 1.0));
    }

    pub fn fill_radial_gradient(&mut self, rect: Rect, gradient: &RadialGradient) {
        let Some(g) = self.gradients else { return };
        self.with_ctx(|ctx| g.fill_rect_radial(ctx, rect, gradient, 1.0));
    }

    pub fn fill_radial_circle(&mut self, center: Vec2, radius: f32, stops: &[ColorStop]) {
        let Some(g) = self.gradients else { return };
        self.with_ctx(|ctx| g.fill_circle_radial(ctx, center, radius, stops, 1.0));
    }

    /// Fills `path` with a gradient brush. Solid brushes fill flat.
    pub fn fill_path_gradient(&mut self, path: &PathData, brush: &Brush) {
        match brush {
            Brush::Linear(l) => {
                let Some(g) = self.gradients else { return };
                self.with_ctx(|ctx| g.fill_path_linear(ctx, path, l, 1.0));
            }
            Brush::Radial(r) => {
                let Some(g) = self.gradients else { return };
                self.with_ctx(|ctx| g.fill_path_radial(ctx, path, r, 1.0));
            }
            Brush::Solid(c) => self.fill_path(path, &Paint::fill(*c)),
        }
    }

    /// Conic gradient starting at +X. `segments` of 0 picks the default.
    pub fn draw_angular_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        stops: &[ColorStop],
        segments: u32,
    ) {
        let Some(g) = self.gradients else { return };
        let segments = if segments == 0 { DEFAULT_ANGULAR_SEGMENTS } else { segments };
        self.with_ctx(|ctx| g.fill_angular(ctx, center, radius, stops, segments, 0.0, 1.0));
    }

    // ── effects ───────────────────────────────────────────────────────────

    pub fn draw_glow(&mut self, center: Vec2, radius: f32, color: Color, intensity: f32) {
        let Some(fx) = self.effects else { return };
        self.with_ctx(|ctx| fx.draw_glow(ctx, center, radius, color, intensity));
    }

    /// Glow using the paint's color, alpha and quality.
    pub fn draw_glow_paint(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        let Some(fx) = self.effects else { return };
        self.with_ctx(|ctx| fx.draw_glow_paint(ctx, center, radius, paint));
    }

    /// Calls `draw` for the shadow pass and then for the shape itself.
    pub fn draw_with_shadow<F>(&mut self, paint: &Paint, shadow: &Shadow, draw: F)
    where
        F: FnMut(&mut Canvas<'f>, &Paint),
    {
        let Some(fx) = self.effects else { return };
        fx.draw_with_shadow(self, paint, shadow, draw);
    }

    pub fn push_layer(&mut self, opacity: f32, bounds: Option<Rect>) {
        let Some(fx) = self.effects else { return };
        if let Some(s) = self.surface.as_deref_mut() {
            fx.push_layer(s, opacity, bounds);
        }
    }

    pub fn pop_layer(&mut self) {
        let Some(fx) = self.effects else { return };
        if let Some(s) = self.surface.as_deref_mut() {
            fx.pop_layer(s);
        }
    }

    pub fn push_clip(&mut self, rect: Rect) {
        let Some(fx) = self.effects else { return };
        if let Some(s) = self.surface.as_deref_mut() {
            fx.push_clip(s, rect);
        }
    }

    pub fn pop_clip(&mut self) {
        let Some(fx) = self.effects else { return };
        if let Some(s) = self.surface.as_deref_mut() {
            fx.pop_clip(s);
        }
    }

    /// Runs `f` inside an opacity layer; the layer is popped when `f` returns.
    pub fn with_layer<R>(&mut self, opacity: f32, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_layer(opacity, None);
        let out = f(self);
        self.pop_layer();
        out
    }

    /// Runs `f` with drawing clipped to `rect`; the clip is popped when `f` returns.
    pub fn with_clip<R>(&mut self, rect: Rect, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_clip(rect);
        let out = f(self);
        self.pop_clip();
        out
    }

    // ── transforms ────────────────────────────────────────────────────────

    /// Current surface transform; identity without a surface.
    pub fn transform(&self) -> Transform {
        self.surface.as_ref().map_or(Transform::identity(), |s| s.transform())
    }

    pub fn set_transform(&mut self, transform: Transform) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.set_transform(s, transform);
        }
    }

    pub fn reset_transform(&mut self) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.reset(s);
        }
    }

    #[inline]
    pub fn transform_depth(&self) -> usize {
        self.transforms.depth()
    }

    /// Saves the current transform. False when refused (stack full, no surface).
    pub fn push_transform(&mut self) -> bool {
        match self.surface.as_deref_mut() {
            Some(s) => self.transforms.push_transform(s),
            None => false,
        }
    }

    pub fn pop_transform(&mut self) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.pop_transform(s);
        }
    }

    pub fn rotate_at(&mut self, degrees: f32, center: Vec2) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.rotate_at(s, degrees, center);
        }
    }

    pub fn scale_at(&mut self, sx: f32, sy: f32, center: Vec2) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.scale_at(s, sx, sy, center);
        }
    }

    pub fn translate_by(&mut self, dx: f32, dy: f32) {
        if let Some(s) = self.surface.as_deref_mut() {
            self.transforms.translate_by(s, dx, dy);
        }
    }

    // ── text ──────────────────────────────────────────────────────────────

    pub fn draw_text(&mut self, text: &str, rect: Rect, style: &TextStyle) {
        let Some(t) = self.text else { return };
        self.with_ctx(|ctx| t.draw_text(ctx, text, rect, style));
    }

    pub fn draw_text_outlined(
        &mut self,
        text: &str,
        rect: Rect,
        style: &TextStyle,
        outline_color: Color,
        outline_width: f32,
    ) {
        let Some(t) = self.text else { return };
        self.with_ctx(|ctx| {
            t.draw_text_outlined(ctx, text, rect, style, outline_color, outline_width)
        });
    }

    /// Laid-out size of `text`; zero when it cannot be measured.
    pub fn measure_text(&mut self, text: &str, style: &TextStyle, max_width: Option<f32>) -> Vec2 {
        let Some(t) = self.text else { return Vec2::zero() };
        let mut size = Vec2::zero();
        self.with_ctx(|ctx| size = t.measure_text(ctx, text, style, max_width));
        size
    }

    // ── spectrum ──────────────────────────────────────────────────────────

    pub fn draw_bars<S>(&mut self, rect: Rect, source: &S, style: &BarStyle)
    where
        S: SpectrumSource + ?Sized,
    {
        let (Some(s), Some(p), Some(g)) = (self.spectrum, self.primitives, self.gradients) else {
            return;
        };
        let values = source.magnitudes();
        self.with_ctx(|ctx| s.draw_bars(ctx, p, g, rect, values, style));
    }

    pub fn draw_waveform(
        &mut self,
        rect: Rect,
        samples: &[f32],
        paint: &Paint,
        style: &WaveformStyle,
    ) {
        let (Some(s), Some(p)) = (self.spectrum, self.primitives) else { return };
        self.with_ctx(|ctx| s.draw_waveform(ctx, p, rect, samples, paint, style));
    }

    pub fn draw_spectrum_scale(&mut self, rect: Rect, divisions: u32, paint: &Paint) {
        let (Some(s), Some(p)) = (self.spectrum, self.primitives) else { return };
        self.with_ctx(|ctx| s.draw_scale(ctx, p, rect, divisions, paint));
    }

    fn with_ctx(&mut self, f: impl FnOnce(&mut RenderCtx<'_>)) {
        if let Some(surface) = self.surface.as_deref_mut() {
            let mut ctx = RenderCtx::new(surface, self.resources, self.geometry);
            f(&mut ctx);
        }
    }
}

impl ShadowTarget for Canvas<'_> {
    fn push_transform(&mut self) -> bool {
        Canvas::push_transform(self)
    }

    fn translate_by(&mut self, dx: f32, dy: f32) {
        Canvas::translate_by(self, dx, dy);
    }

    fn pop_transform(&mut self) {
        Canvas::pop_transform(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasState;
    use crate::device::{DrawCommand, Generation};
    use crate::lifecycle::SurfaceLifecycle;
    use crate::render::testing::Harness;

    struct Rig {
        h: Harness,
        transforms: TransformManager,
        primitives: PrimitiveRenderer,
        gradients: GradientRenderer,
        effects: EffectsRenderer,
        text: TextRenderer,
        spectrum: SpectrumRenderer,
        state: CanvasState,
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Rig {
                h: Harness::new(),
                transforms: TransformManager::new(),
                primitives: PrimitiveRenderer::new(),
                gradients: GradientRenderer::new(),
                effects: EffectsRenderer::default(),
                text: TextRenderer::new(),
                spectrum: SpectrumRenderer::new(),
                state: CanvasState::new(),
            };
            let components: [&mut dyn SurfaceLifecycle; 7] = [
                &mut rig.transforms,
                &mut rig.primitives,
                &mut rig.gradients,
                &mut rig.effects,
                &mut rig.text,
                &mut rig.spectrum,
                &mut rig.state,
            ];
            for c in components {
                rig.h.attach(c);
            }
            rig.h.surface.begin_draw();
            rig.h.control.clear_commands();
            rig
        }

        fn canvas(&mut self) -> Canvas<'_> {
            let surface: &mut dyn RenderSurface = &mut self.h.surface;
            Canvas::new(Some(surface), &self.h.resources, &self.h.geometry, &mut self.transforms)
                .with_primitives(&self.primitives)
                .with_gradients(&self.gradients)
                .with_effects(&self.effects)
                .with_text(&self.text)
                .with_spectrum(&self.spectrum)
                .with_info(self.state.info())
        }
    }

    // ── routing ──

    #[test]
    fn ring_is_routed_as_a_mid_radius_stroke() {
        let mut rig = Rig::new();
        rig.canvas().draw_ring(Vec2::new(50.0, 50.0), 10.0, 14.0, &Paint::fill(Color::WHITE));

        match &rig.h.control.draw_commands()[..] {
            [DrawCommand::DrawEllipse { center, radius, stroke, .. }] => {
                assert_eq!(*center, Vec2::new(50.0, 50.0));
                assert_eq!(*radius, Vec2::new(12.0, 12.0));
                assert_eq!(stroke.width, 4.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_renderer_makes_calls_no_ops() {
        let mut rig = Rig::new();
        let surface: &mut dyn RenderSurface = &mut rig.h.surface;
        let mut canvas =
            Canvas::new(Some(surface), &rig.h.resources, &rig.h.geometry, &mut rig.transforms);
        canvas.draw_rectangle(Rect::new(0.0, 0.0, 5.0, 5.0), &Paint::default());
        canvas.draw_text("x", Rect::new(0.0, 0.0, 5.0, 5.0), &TextStyle::default());
        canvas.draw_bars(Rect::new(0.0, 0.0, 5.0, 5.0), &[1.0f32][..], &BarStyle::default());
        canvas.with_layer(0.5, |c| c.draw_glow(Vec2::new(1.0, 1.0), 1.0, Color::WHITE, 1.0));
        assert_eq!(canvas.measure_text("abc", &TextStyle::default(), None), Vec2::zero());
        assert!(rig.h.control.commands().is_empty());
    }

    #[test]
    fn canvas_without_surface_is_inert() {
        let mut rig = Rig::new();
        let mut canvas = Canvas::new(None, &rig.h.resources, &rig.h.geometry, &mut rig.transforms)
            .with_primitives(&rig.primitives);
        canvas.draw_circle(Vec2::new(1.0, 1.0), 1.0, &Paint::default());
        canvas.translate_by(5.0, 5.0);
        assert!(!canvas.push_transform());
        assert_eq!(canvas.transform(), Transform::identity());
        assert_eq!(canvas.surface_size(), SurfaceSize::default());
        assert!(canvas.surface().is_none());
        assert!(rig.h.control.commands().is_empty());
    }

    #[test]
    fn surface_info_reflects_the_attached_surface() {
        let mut rig = Rig::new();
        let canvas = rig.canvas();
        let info = canvas.surface_info().expect("attached");
        assert_eq!(info.generation, Generation(1));
        assert_eq!(info.size, SurfaceSize::new(200, 200));
        assert_eq!(canvas.surface_size(), SurfaceSize::new(200, 200));
    }

    // ── scopes ──

    #[test]
    fn closure_scopes_always_pop() {
        let mut rig = Rig::new();
        let mut canvas = rig.canvas();
        let drawn = canvas.with_clip(Rect::new(0.0, 0.0, 10.0, 10.0), |c| {
            c.with_layer(0.5, |c| {
                c.draw_rectangle(Rect::new(0.0, 0.0, 20.0, 20.0), &Paint::default());
                true
            })
        });
        assert!(drawn);
        drop(canvas);

        let kinds: Vec<&'static str> = rig
            .h
            .control
            .commands()
            .iter()
            .map(|c| match c {
                DrawCommand::PushClip(_) => "push_clip",
                DrawCommand::PushLayer { .. } => "push_layer",
                DrawCommand::FillRect { .. } => "fill",
                DrawCommand::PopLayer => "pop_layer",
                DrawCommand::PopClip => "pop_clip",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["push_clip", "push_layer", "fill", "pop_layer", "pop_clip"]);
        assert_eq!(rig.effects.scope_depth(), 0);
    }

    #[test]
    fn shadow_pass_is_translated_and_restored() {
        let mut rig = Rig::new();
        let mut canvas = rig.canvas();
        let shadow = Shadow { offset: Vec2::new(3.0, 4.0), color: Color::BLACK };
        let rect = Rect::new(10.0, 10.0, 5.0, 5.0);
        canvas.draw_with_shadow(&Paint::fill(Color::WHITE), &shadow, |c, p| {
            c.draw_rectangle(rect, p)
        });
        assert_eq!(canvas.transform(), Transform::identity());
        assert_eq!(canvas.transform_depth(), 0);
        drop(canvas);

        let cmds = rig.h.control.commands();
        let sets: Vec<Transform> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetTransform(t) => Some(*t),
                _ => None,
            })
            .collect();
        assert_eq!(sets, vec![Transform::translation(3.0, 4.0), Transform::identity()]);

        let fills: Vec<Brush> = rig
            .h
            .control
            .draw_commands()
            .iter()
            .filter_map(|c| c.brush().map(|b| b.brush.clone()))
            .collect();
        assert_eq!(fills, vec![Brush::Solid(Color::BLACK), Brush::Solid(Color::WHITE)]);
    }

    // ── caching ──

    #[test]
    fn cached_paths_are_built_once() {
        let mut rig = Rig::new();
        let mut builds = 0;
        for _ in 0..3 {
            rig.canvas().draw_cached_path(
                "tri",
                |sink| {
                    builds += 1;
                    sink.begin_figure(Vec2::new(0.0, 0.0), true);
                    sink.add_line(Vec2::new(10.0, 0.0));
                    sink.add_line(Vec2::new(5.0, 8.0));
                    sink.end_figure(true);
                },
                &Paint::fill(Color::WHITE),
            );
        }
        assert_eq!(builds, 1);
        assert_eq!(rig.h.control.draw_count(), 3);
    }

    #[test]
    fn measure_routes_through_text_renderer() {
        let mut rig = Rig::new();
        let size = rig.canvas().measure_text("ab", &TextStyle::new("x", 10.0), None);
        assert!((size.x - 10.0).abs() < 1e-4);
        assert!((size.y - 12.0).abs() < 1e-4);
    }
}
