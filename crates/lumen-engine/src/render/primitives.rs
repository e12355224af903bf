use std::cell::RefCell;
use std::collections::HashMap;

use crate::coords::{Rect, Vec2};
use crate::device::{BrushHandle, GeometryHandle, RenderSurface, StrokeStyleHandle};
use crate::geometry::PathData;
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::{Paint, StrokeStyleDesc};

use super::ctx::{Attachment, RenderCtx};

/// Upper bound on lines per axis in [`PrimitiveRenderer::draw_grid`].
pub const MAX_GRID_LINES: usize = 4096;

/// The stroke-style table is flushed once it holds this many entries.
pub const MAX_STROKE_STYLES: usize = 128;

/// Resolved stroke for one draw call.
#[derive(Copy, Clone)]
struct Stroke {
    brush: BrushHandle,
    width: f32,
    style: Option<StrokeStyleHandle>,
}

#[inline]
fn finite_radius(r: f32) -> bool {
    r.is_finite() && r > 0.0
}

/// Basic shapes.
///
/// Each operation fills and/or strokes according to [`Paint::style`].
/// Degenerate input (non-finite values, empty rectangles, too few points,
/// non-positive radii) skips the call without logging.
///
/// Stroke decorations resolve to surface stroke styles cached by
/// [`StrokeStyleDesc::packed_key`], at most [`MAX_STROKE_STYLES`] at a time;
/// the default decoration uses the surface's built-in style.
#[derive(Default)]
pub struct PrimitiveRenderer {
    attachment: Attachment,
    stroke_styles: RefCell<HashMap<u64, StrokeStyleHandle>>,
}

impl PrimitiveRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── rectangles ────────────────────────────────────────────────────────

    pub fn draw_rectangle(&self, ctx: &mut RenderCtx<'_>, rect: Rect, paint: &Paint) {
        if !rect.is_drawable() || !self.ready(ctx) {
            return;
        }
        let rect = rect.normalized();
        if let Some(brush) = self.fill_brush(ctx, paint) {
            ctx.surface.fill_rect(rect, brush);
        }
        if let Some(s) = self.stroke(ctx, paint) {
            ctx.surface.draw_rect(rect, s.brush, s.width, s.style);
        }
    }

    /// Radii are clamped to half the rectangle's extent; zero radii draw a
    /// plain rectangle.
    pub fn draw_rounded_rectangle(
        &self,
        ctx: &mut RenderCtx<'_>,
        rect: Rect,
        rx: f32,
        ry: f32,
        paint: &Paint,
    ) {
        if !rect.is_drawable() || !rx.is_finite() || !ry.is_finite() {
            return;
        }
        let rect = rect.normalized();
        let radius = Vec2::new(
            rx.clamp(0.0, rect.width() * 0.5),
            ry.clamp(0.0, rect.height() * 0.5),
        );
        if radius.x <= 0.0 || radius.y <= 0.0 {
            self.draw_rectangle(ctx, rect, paint);
            return;
        }
        if !self.ready(ctx) {
            return;
        }
        if let Some(brush) = self.fill_brush(ctx, paint) {
            ctx.surface.fill_rounded_rect(rect, radius, brush);
        }
        if let Some(s) = self.stroke(ctx, paint) {
            ctx.surface.draw_rounded_rect(rect, radius, s.brush, s.width, s.style);
        }
    }

    /// Draws every rectangle with one brush resolution.
    pub fn draw_rectangles(&self, ctx: &mut RenderCtx<'_>, rects: &[Rect], paint: &Paint) {
        if rects.is_empty() || !self.ready(ctx) {
            return;
        }
        let fill = self.fill_brush(ctx, paint);
        let stroke = self.stroke(ctx, paint);
        for rect in rects.iter().filter(|r| r.is_drawable()).map(|r| r.normalized()) {
            if let Some(brush) = fill {
                ctx.surface.fill_rect(rect, brush);
            }
            if let Some(s) = stroke {
                ctx.surface.draw_rect(rect, s.brush, s.width, s.style);
            }
        }
    }

    // ── ellipses ──────────────────────────────────────────────────────────

    pub fn draw_circle(&self, ctx: &mut RenderCtx<'_>, center: Vec2, radius: f32, paint: &Paint) {
        self.draw_ellipse(ctx, center, radius, radius, paint);
    }

    pub fn draw_ellipse(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        rx: f32,
        ry: f32,
        paint: &Paint,
    ) {
        if !center.is_finite() || !finite_radius(rx) || !finite_radius(ry) || !self.ready(ctx) {
            return;
        }
        let radius = Vec2::new(rx, ry);
        if let Some(brush) = self.fill_brush(ctx, paint) {
            ctx.surface.fill_ellipse(center, radius, brush);
        }
        if let Some(s) = self.stroke(ctx, paint) {
            ctx.surface.draw_ellipse(center, radius, s.brush, s.width, s.style);
        }
    }

    /// Draws every circle with one brush resolution.
    pub fn draw_circles(
        &self,
        ctx: &mut RenderCtx<'_>,
        centers: &[Vec2],
        radius: f32,
        paint: &Paint,
    ) {
        if centers.is_empty() || !finite_radius(radius) || !self.ready(ctx) {
            return;
        }
        let r = Vec2::new(radius, radius);
        let fill = self.fill_brush(ctx, paint);
        let stroke = self.stroke(ctx, paint);
        for &c in centers.iter().filter(|c| c.is_finite()) {
            if let Some(brush) = fill {
                ctx.surface.fill_ellipse(c, r, brush);
            }
            if let Some(s) = stroke {
                ctx.surface.draw_ellipse(c, r, s.brush, s.width, s.style);
            }
        }
    }

    /// Annulus drawn as one stroked circle on the mid radius.
    ///
    /// `inner >= outer` draws nothing. A negative inner radius reads as 0.
    pub fn draw_ring(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        inner: f32,
        outer: f32,
        paint: &Paint,
    ) {
        if !center.is_finite() || !inner.is_finite() || !finite_radius(outer) {
            return;
        }
        let inner = inner.max(0.0);
        if inner >= outer || !self.ready(ctx) {
            return;
        }
        let width = outer - inner;
        let mid = (inner + outer) * 0.5;
        let Some(brush) = ctx.paint_brush(paint) else { return };
        let style = self.stroke_style(ctx, &paint.stroke_style());
        ctx.surface.draw_ellipse(center, Vec2::new(mid, mid), brush, width, style);
    }

    // ── lines ─────────────────────────────────────────────────────────────

    /// Always stroked, whatever the paint style.
    pub fn draw_line(&self, ctx: &mut RenderCtx<'_>, from: Vec2, to: Vec2, paint: &Paint) {
        if !from.is_finite() || !to.is_finite() || !self.ready(ctx) {
            return;
        }
        if let Some(s) = self.forced_stroke(ctx, paint) {
            ctx.surface.draw_line(from, to, s.brush, s.width, s.style);
        }
    }

    /// Open polyline; always stroked. Fewer than 2 points draws nothing.
    pub fn draw_polyline(&self, ctx: &mut RenderCtx<'_>, points: &[Vec2], paint: &Paint) {
        if points.len() < 2 || !self.ready(ctx) {
            return;
        }
        let Some(s) = self.forced_stroke(ctx, paint) else { return };
        let geometry = ctx.geometry;
        if let Some(g) = geometry.create_path_from_points(&mut *ctx.surface, points, false) {
            ctx.surface.draw_geometry(g, s.brush, s.width, s.style);
            ctx.surface.release_geometry(g);
        }
    }

    /// Closed polygon. Fewer than 3 points draws nothing.
    pub fn draw_polygon(&self, ctx: &mut RenderCtx<'_>, points: &[Vec2], paint: &Paint) {
        if points.len() < 3 || !self.ready(ctx) {
            return;
        }
        let geometry = ctx.geometry;
        let g = geometry.create_path_from_points(&mut *ctx.surface, points, true);
        self.paint_adhoc(ctx, g, paint);
    }

    // ── arcs and polygons ─────────────────────────────────────────────────

    /// Open arc, always stroked. Angles in degrees, clockwise from +X.
    pub fn draw_arc(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
        paint: &Paint,
    ) {
        if !finite_radius(radius) || !self.ready(ctx) {
            return;
        }
        let Some(s) = self.forced_stroke(ctx, paint) else { return };
        let geometry = ctx.geometry;
        let arc = geometry.create_arc(&mut *ctx.surface, center, radius, start_deg, sweep_deg);
        if let Some(g) = arc {
            ctx.surface.draw_geometry(g, s.brush, s.width, s.style);
            ctx.surface.release_geometry(g);
        }
    }

    /// Pie slice from `center`.
    pub fn draw_sector(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        sweep_deg: f32,
        paint: &Paint,
    ) {
        if !finite_radius(radius) || !self.ready(ctx) {
            return;
        }
        let geometry = ctx.geometry;
        let g =
            geometry.create_angular_slice(&mut *ctx.surface, center, radius, start_deg, sweep_deg);
        self.paint_adhoc(ctx, g, paint);
    }

    pub fn draw_regular_polygon(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        sides: u32,
        rotation_deg: f32,
        paint: &Paint,
    ) {
        if !center.is_finite() || !finite_radius(radius) || !self.ready(ctx) {
            return;
        }
        let geometry = ctx.geometry;
        let g =
            geometry.create_regular_polygon(&mut *ctx.surface, center, radius, sides, rotation_deg);
        self.paint_adhoc(ctx, g, paint);
    }

    pub fn draw_star(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        outer_radius: f32,
        inner_radius: f32,
        points: u32,
        paint: &Paint,
    ) {
        if !center.is_finite() || !finite_radius(outer_radius) || !finite_radius(inner_radius) {
            return;
        }
        if !self.ready(ctx) {
            return;
        }
        let geometry = ctx.geometry;
        let verts = geometry.generate_star_vertices(center, outer_radius, inner_radius, points);
        let g = geometry.create_path_from_points(&mut *ctx.surface, &verts, true);
        self.paint_adhoc(ctx, g, paint);
    }

    /// Grid lines every `cell` pixels across `rect`, including its edges.
    pub fn draw_grid(&self, ctx: &mut RenderCtx<'_>, rect: Rect, cell: Vec2, paint: &Paint) {
        if !rect.is_drawable() || !finite_radius(cell.x) || !finite_radius(cell.y) {
            return;
        }
        if !self.ready(ctx) {
            return;
        }
        let r = rect.normalized();
        let cols = ((r.width() / cell.x).floor() as usize).min(MAX_GRID_LINES);
        let rows = ((r.height() / cell.y).floor() as usize).min(MAX_GRID_LINES);
        let Some(s) = self.forced_stroke(ctx, paint) else { return };

        let (min, max) = (r.min(), r.max());
        for i in 0..=cols {
            let x = (min.x + cell.x * i as f32).min(max.x);
            let (from, to) = (Vec2::new(x, min.y), Vec2::new(x, max.y));
            ctx.surface.draw_line(from, to, s.brush, s.width, s.style);
        }
        for j in 0..=rows {
            let y = (min.y + cell.y * j as f32).min(max.y);
            let (from, to) = (Vec2::new(min.x, y), Vec2::new(max.x, y));
            ctx.surface.draw_line(from, to, s.brush, s.width, s.style);
        }
    }

    // ── paths ─────────────────────────────────────────────────────────────

    /// Arbitrary path, created for this call and released afterwards.
    pub fn draw_path(&self, ctx: &mut RenderCtx<'_>, path: &PathData, paint: &Paint) {
        if path.is_empty() || !self.ready(ctx) {
            return;
        }
        let g = match ctx.surface.create_geometry(path) {
            Ok(g) => Some(g),
            Err(e) => {
                log::error!("path geometry creation failed: {e}");
                None
            }
        };
        self.paint_adhoc(ctx, g, paint);
    }

    /// Fills and/or strokes a geometry the caller owns (for example a cached one).
    pub fn draw_geometry(&self, ctx: &mut RenderCtx<'_>, geometry: GeometryHandle, paint: &Paint) {
        if !self.ready(ctx) {
            return;
        }
        if let Some(brush) = self.fill_brush(ctx, paint) {
            ctx.surface.fill_geometry(geometry, brush);
        }
        if let Some(s) = self.stroke(ctx, paint) {
            ctx.surface.draw_geometry(geometry, s.brush, s.width, s.style);
        }
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn ready(&self, ctx: &RenderCtx<'_>) -> bool {
        self.attachment.sync(ctx.generation(), "primitive renderer", || {
            self.stroke_styles.borrow_mut().clear();
        })
    }

    fn paint_adhoc(
        &self,
        ctx: &mut RenderCtx<'_>,
        geometry: Option<GeometryHandle>,
        paint: &Paint,
    ) {
        let Some(g) = geometry else { return };
        self.draw_geometry(ctx, g, paint);
        ctx.surface.release_geometry(g);
    }

    fn fill_brush(&self, ctx: &mut RenderCtx<'_>, paint: &Paint) -> Option<BrushHandle> {
        if paint.style.fills() { ctx.paint_brush(paint) } else { None }
    }

    fn stroke(&self, ctx: &mut RenderCtx<'_>, paint: &Paint) -> Option<Stroke> {
        if paint.style.strokes() { self.forced_stroke(ctx, paint) } else { None }
    }

    /// Stroke regardless of paint style, for shapes that have no interior.
    fn forced_stroke(&self, ctx: &mut RenderCtx<'_>, paint: &Paint) -> Option<Stroke> {
        let width = paint.effective_stroke_width()?;
        let brush = ctx.paint_brush(paint)?;
        let style = self.stroke_style(ctx, &paint.stroke_style());
        Some(Stroke { brush, width, style })
    }

    /// Cached surface stroke style; `None` selects the surface default.
    fn stroke_style(
        &self,
        ctx: &mut RenderCtx<'_>,
        desc: &StrokeStyleDesc,
    ) -> Option<StrokeStyleHandle> {
        if *desc == StrokeStyleDesc::default() {
            return None;
        }
        let key = desc.packed_key();
        if let Some(h) = self.stroke_styles.borrow().get(&key) {
            return Some(*h);
        }
        match ctx.surface.create_stroke_style(desc) {
            Ok(h) => {
                let mut styles = self.stroke_styles.borrow_mut();
                if styles.len() >= MAX_STROKE_STYLES {
                    log::debug!("stroke style table full; releasing {} entries", styles.len());
                    for (_, old) in styles.drain() {
                        ctx.surface.release_stroke_style(old);
                    }
                }
                styles.insert(key, h);
                Some(h)
            }
            Err(e) => {
                log::error!("stroke style creation failed, using the default: {e}");
                None
            }
        }
    }
}

impl SurfaceLifecycle for PrimitiveRenderer {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.stroke_styles.get_mut().clear();
        self.attachment.attach(surface.generation());
    }

    fn on_surface_lost(&mut self) {
        self.stroke_styles.get_mut().clear();
        self.attachment.detach();
    }
}
