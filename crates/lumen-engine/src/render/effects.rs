use std::cell::RefCell;

use crate::coords::{Rect, Vec2};
use crate::device::{Generation, RenderSurface};
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::{Brush, Color, ColorStop, FilterQuality, Paint, RadialGradient};

use super::ctx::{Attachment, RenderCtx};

pub const MIN_GLOW_LAYERS: u32 = 2;
pub const MAX_GLOW_LAYERS: u32 = 16;

/// Number of concentric layers a glow uses at `quality`.
pub fn glow_layer_count(quality: FilterQuality) -> u32 {
    let layers = match quality {
        FilterQuality::Low => 4,
        FilterQuality::Medium => 8,
        FilterQuality::High => 12,
    };
    layers.clamp(MIN_GLOW_LAYERS, MAX_GLOW_LAYERS)
}

/// Offset copy drawn beneath a shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Shadow {
    pub offset: Vec2,
    pub color: Color,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset: Vec2::new(2.0, 2.0),
            color: Color::from_straight(0.0, 0.0, 0.0, 0.5),
        }
    }
}

/// What [`EffectsRenderer::draw_with_shadow`] needs from its caller: a way to
/// shift everything drawn by the callback and undo it afterwards.
pub trait ShadowTarget {
    /// Saves the current transform. False when the save was refused.
    fn push_transform(&mut self) -> bool;
    fn translate_by(&mut self, dx: f32, dy: f32);
    fn pop_transform(&mut self);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ScopeKind {
    Layer,
    Clip,
}

impl ScopeKind {
    fn name(self) -> &'static str {
        match self {
            ScopeKind::Layer => "layer",
            ScopeKind::Clip => "clip",
        }
    }
}

/// Multi-pass effects and scoped state.
///
/// Glows stack radial-gradient discs of growing radius and falling alpha.
/// Shadows redraw the caller's shape offset and recolored first.
///
/// Layers and clips are tracked on one scope stack: a pop must match the most
/// recent push of the same kind, otherwise it is logged and ignored. Scopes
/// still open at the end of a frame are closed by [`unwind`](Self::unwind).
pub struct EffectsRenderer {
    attachment: Attachment,
    default_quality: FilterQuality,
    scopes: RefCell<Vec<ScopeKind>>,
}

impl Default for EffectsRenderer {
    fn default() -> Self {
        Self::new(FilterQuality::default())
    }
}

impl EffectsRenderer {
    pub fn new(default_quality: FilterQuality) -> Self {
        Self {
            attachment: Attachment::default(),
            default_quality,
            scopes: RefCell::new(Vec::new()),
        }
    }

    #[inline]
    pub fn default_quality(&self) -> FilterQuality {
        self.default_quality
    }

    /// Open layers and clips.
    pub fn scope_depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    // ── glow ──────────────────────────────────────────────────────────────

    /// Soft glow around `center` at the default quality.
    pub fn draw_glow(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        color: Color,
        intensity: f32,
    ) {
        let layers = glow_layer_count(self.default_quality);
        self.draw_glow_layers(ctx, center, radius, color, intensity, layers);
    }

    /// Glow colored by the paint's brush, with its alpha and quality.
    pub fn draw_glow_paint(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        paint: &Paint,
    ) {
        let layers = glow_layer_count(paint.quality);
        let color = paint.brush.dominant_color();
        self.draw_glow_layers(ctx, center, radius, color, paint.effective_alpha(), layers);
    }

    /// Glow with an explicit layer count, clamped to [2, 16].
    ///
    /// Layers run outermost first, from `2 * radius` down to just above
    /// `radius`. Each is a radial gradient from the tinted color at its center
    /// to transparent at its rim.
    pub fn draw_glow_layers(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        color: Color,
        intensity: f32,
        layers: u32,
    ) {
        if !center.is_finite() || !(radius.is_finite() && radius > 0.0) || !color.is_finite() {
            return;
        }
        let intensity = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 1.0 };
        if intensity <= 0.0 || !self.ready(ctx.generation()) {
            return;
        }
        let n = layers.clamp(MIN_GLOW_LAYERS, MAX_GLOW_LAYERS);
        let per_layer = (2.0 / n as f32).min(1.0);

        for i in 0..n {
            // t runs 1 (outermost) -> 1/n (innermost).
            let t = (n - i) as f32 / n as f32;
            let r = radius * (1.0 + t);
            let alpha = intensity * per_layer * (1.0 - 0.8 * t);
            let stops = vec![
                ColorStop::new(0.0, color.scale_alpha(alpha.min(1.0))),
                ColorStop::new(1.0, Color::transparent()),
            ];
            let gradient = RadialGradient::new(center, r, stops);
            if let Some(brush) = ctx.brush(&Brush::Radial(gradient), 1.0) {
                ctx.surface.fill_ellipse(center, Vec2::new(r, r), brush);
            }
        }
    }

    // ── shadow ────────────────────────────────────────────────────────────

    /// Runs `draw` twice: once shifted by `shadow.offset` with the paint
    /// recolored to `shadow.color`, then with the original paint in place.
    ///
    /// When the target refuses to save its transform only the second pass runs.
    pub fn draw_with_shadow<T, F>(
        &self,
        target: &mut T,
        paint: &Paint,
        shadow: &Shadow,
        mut draw: F,
    ) where
        T: ShadowTarget + ?Sized,
        F: FnMut(&mut T, &Paint),
    {
        let visible = shadow.offset.is_finite() && shadow.color.is_finite() && shadow.color.a > 0.0;
        if visible {
            if target.push_transform() {
                target.translate_by(shadow.offset.x, shadow.offset.y);
                draw(target, &paint.with_color(shadow.color));
                target.pop_transform();
            } else {
                log::warn!("shadow skipped: transform stack refused the push");
            }
        }
        draw(target, paint);
    }

    // ── layers and clips ──────────────────────────────────────────────────

    /// Starts an opacity group. Opacity is clamped to [0, 1]; non-finite
    /// values read as opaque. Non-finite bounds are dropped.
    pub fn push_layer(&self, surface: &mut dyn RenderSurface, opacity: f32, bounds: Option<Rect>) {
        if !self.ready(surface.generation()) {
            return;
        }
        let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
        let bounds = bounds.filter(|b| b.is_finite()).map(Rect::normalized);
        self.scopes.borrow_mut().push(ScopeKind::Layer);
        surface.push_layer(opacity, bounds);
    }

    pub fn pop_layer(&self, surface: &mut dyn RenderSurface) {
        self.pop(surface, ScopeKind::Layer);
    }

    /// Intersects the clip with `rect`. A non-finite rect clips everything;
    /// the push always happens so it can be paired with a pop.
    pub fn push_clip(&self, surface: &mut dyn RenderSurface, rect: Rect) {
        if !self.ready(surface.generation()) {
            return;
        }
        let rect = if rect.is_finite() { rect.normalized() } else { Rect::default() };
        self.scopes.borrow_mut().push(ScopeKind::Clip);
        surface.push_clip(rect);
    }

    pub fn pop_clip(&self, surface: &mut dyn RenderSurface) {
        self.pop(surface, ScopeKind::Clip);
    }

    /// Closes every open scope, innermost first. Run before ending a frame.
    pub fn unwind(&self, surface: &mut dyn RenderSurface) {
        if !self.ready(surface.generation()) {
            return;
        }
        let open: Vec<ScopeKind> = self.scopes.borrow_mut().drain(..).rev().collect();
        if open.is_empty() {
            return;
        }
        log::warn!("closing {} unbalanced layer/clip scope(s) at end of frame", open.len());
        for kind in open {
            match kind {
                ScopeKind::Layer => surface.pop_layer(),
                ScopeKind::Clip => surface.pop_clip(),
            }
        }
    }

    fn pop(&self, surface: &mut dyn RenderSurface, kind: ScopeKind) {
        if !self.ready(surface.generation()) {
            return;
        }
        let top = self.scopes.borrow().last().copied();
        match top {
            Some(k) if k == kind => {
                self.scopes.borrow_mut().pop();
                match kind {
                    ScopeKind::Layer => surface.pop_layer(),
                    ScopeKind::Clip => surface.pop_clip(),
                }
            }
            Some(other) => log::warn!(
                "pop_{} while a {} is open; ignored",
                kind.name(),
                other.name()
            ),
            None => log::warn!("pop_{} without a matching push; ignored", kind.name()),
        }
    }

    fn ready(&self, generation: Generation) -> bool {
        self.attachment.sync(generation, "effects renderer", || {
            self.scopes.borrow_mut().clear();
        })
    }
}

impl SurfaceLifecycle for EffectsRenderer {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.scopes.get_mut().clear();
        self.attachment.attach(surface.generation());
    }

    fn on_surface_lost(&mut self) {
        self.scopes.get_mut().clear();
        self.attachment.detach();
    }
}
