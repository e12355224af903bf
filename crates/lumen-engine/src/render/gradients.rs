use crate::coords::{Rect, Vec2};
use crate::device::{GeometryHandle, RenderSurface};
use crate::geometry::PathData;
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::{
    normalized_stops, sample_stops, Brush, ColorStop, LinearGradient, RadialGradient,
};

use super::ctx::{Attachment, RenderCtx};

pub const MIN_ANGULAR_SEGMENTS: u32 = 8;
pub const MAX_ANGULAR_SEGMENTS: u32 = 360;
pub const DEFAULT_ANGULAR_SEGMENTS: u32 = 64;

/// Degrees each wedge overlaps its neighbour to hide antialiasing seams.
const WEDGE_OVERLAP_DEG: f32 = 0.5;

/// Gradient fills for rectangles, circles and paths.
///
/// Linear and radial brushes come from the shared resource cache. Angular
/// (conic) gradients have no native brush and are approximated with solid
/// wedges.
#[derive(Default)]
pub struct GradientRenderer {
    attachment: Attachment,
}

impl GradientRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect_linear(
        &self,
        ctx: &mut RenderCtx<'_>,
        rect: Rect,
        gradient: &LinearGradient,
        opacity: f32,
    ) {
        if !rect.is_drawable() || !self.ready(ctx) {
            return;
        }
        if let Some(brush) = ctx.brush(&Brush::Linear(gradient.clone()), opacity) {
            ctx.surface.fill_rect(rect.normalized(), brush);
        }
    }

    /// Top-to-bottom linear gradient spanning `rect`.
    pub fn fill_rect_vertical(
        &self,
        ctx: &mut RenderCtx<'_>,
        rect: Rect,
        stops: &[ColorStop],
        opacity: f32,
    ) {
        let r = rect.normalized();
        let gradient = LinearGradient::new(
            Vec2::new(r.origin.x, r.min().y),
            Vec2::new(r.origin.x, r.max().y),
            stops.to_vec(),
        );
        self.fill_rect_linear(ctx, rect, &gradient, opacity);
    }

    pub fn fill_rect_radial(
        &self,
        ctx: &mut RenderCtx<'_>,
        rect: Rect,
        gradient: &RadialGradient,
        opacity: f32,
    ) {
        if !rect.is_drawable() || !self.ready(ctx) {
            return;
        }
        if let Some(brush) = ctx.brush(&Brush::Radial(gradient.clone()), opacity) {
            ctx.surface.fill_rect(rect.normalized(), brush);
        }
    }

    /// Circle filled with a radial gradient centered on it.
    pub fn fill_circle_radial(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        stops: &[ColorStop],
        opacity: f32,
    ) {
        if !center.is_finite() || !(radius.is_finite() && radius > 0.0) || !self.ready(ctx) {
            return;
        }
        let gradient = RadialGradient::new(center, radius, stops.to_vec());
        if let Some(brush) = ctx.brush(&Brush::Radial(gradient), opacity) {
            ctx.surface.fill_ellipse(center, Vec2::new(radius, radius), brush);
        }
    }

    pub fn fill_path_linear(
        &self,
        ctx: &mut RenderCtx<'_>,
        path: &PathData,
        gradient: &LinearGradient,
        opacity: f32,
    ) {
        self.fill_path(ctx, path, &Brush::Linear(gradient.clone()), opacity);
    }

    pub fn fill_path_radial(
        &self,
        ctx: &mut RenderCtx<'_>,
        path: &PathData,
        gradient: &RadialGradient,
        opacity: f32,
    ) {
        self.fill_path(ctx, path, &Brush::Radial(gradient.clone()), opacity);
    }

    /// Fills a geometry the caller owns with any gradient brush.
    pub fn fill_geometry(
        &self,
        ctx: &mut RenderCtx<'_>,
        geometry: GeometryHandle,
        brush: &Brush,
        opacity: f32,
    ) {
        if !self.ready(ctx) {
            return;
        }
        if let Some(b) = ctx.brush(brush, opacity) {
            ctx.surface.fill_geometry(geometry, b);
        }
    }

    /// Conic gradient around `center`, starting at `start_deg` and turning
    /// clockwise.
    ///
    /// Drawn as `segments` wedges (clamped to [8, 360]), each a solid color
    /// sampled at its mid angle.
    pub fn fill_angular(
        &self,
        ctx: &mut RenderCtx<'_>,
        center: Vec2,
        radius: f32,
        stops: &[ColorStop],
        segments: u32,
        start_deg: f32,
        opacity: f32,
    ) {
        if !center.is_finite() || !(radius.is_finite() && radius > 0.0) || stops.len() < 2 {
            return;
        }
        if !self.ready(ctx) {
            return;
        }
        let stops = normalized_stops(stops);
        if stops.len() < 2 {
            return;
        }
        let n = segments.clamp(MIN_ANGULAR_SEGMENTS, MAX_ANGULAR_SEGMENTS);
        let step = 360.0 / n as f32;
        let start = if start_deg.is_finite() { start_deg } else { 0.0 };
        let geometry = ctx.geometry;

        for i in 0..n {
            let color = sample_stops(&stops, (i as f32 + 0.5) / n as f32);
            let from = start + step * i as f32;
            let sweep = step + WEDGE_OVERLAP_DEG;
            let Some(wedge) =
                geometry.create_angular_slice(&mut *ctx.surface, center, radius, from, sweep)
            else {
                continue;
            };
            if let Some(brush) = ctx.brush(&Brush::Solid(color), opacity) {
                ctx.surface.fill_geometry(wedge, brush);
            }
            ctx.surface.release_geometry(wedge);
        }
    }

    fn fill_path(&self, ctx: &mut RenderCtx<'_>, path: &PathData, brush: &Brush, opacity: f32) {
        if path.is_empty() || !self.ready(ctx) {
            return;
        }
        let Some(b) = ctx.brush(brush, opacity) else { return };
        match ctx.surface.create_geometry(path) {
            Ok(g) => {
                ctx.surface.fill_geometry(g, b);
                ctx.surface.release_geometry(g);
            }
            Err(e) => log::error!("gradient path creation failed: {e}"),
        }
    }

    fn ready(&self, ctx: &RenderCtx<'_>) -> bool {
        self.attachment.sync(ctx.generation(), "gradient renderer", || {})
    }
}

impl SurfaceLifecycle for GradientRenderer {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.attachment.attach(surface.generation());
    }

    fn on_surface_lost(&mut self) {
        self.attachment.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DrawCommand;
    use crate::paint::{even_stops, Color};
    use crate::render::testing::Harness;

    fn stops() -> Vec<ColorStop> {
        even_stops(&[Color::WHITE, Color::BLACK])
    }

    #[test]
    fn vertical_gradient_spans_the_rect() {
        let mut h = Harness::new();
        let mut g = GradientRenderer::new();
        h.attach(&mut g);
        h.frame(|ctx| g.fill_rect_vertical(ctx, Rect::new(10.0, 20.0, 5.0, 30.0), &stops(), 1.0));

        match &h.control.draw_commands()[0] {
            DrawCommand::FillRect { brush, .. } => match &brush.brush {
                Brush::Linear(l) => {
                    assert_eq!(l.start, Vec2::new(10.0, 20.0));
                    assert_eq!(l.end, Vec2::new(10.0, 50.0));
                }
                other => panic!("expected linear brush, got {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn radial_circle_reuses_cached_brush() {
        let mut h = Harness::new();
        let mut g = GradientRenderer::new();
        h.attach(&mut g);
        h.frame(|ctx| {
            g.fill_circle_radial(ctx, Vec2::new(50.0, 50.0), 10.0, &stops(), 1.0);
            g.fill_circle_radial(ctx, Vec2::new(50.0, 50.0), 10.0, &stops(), 0.5);
        });
        assert_eq!(h.control.draw_count(), 2);
        assert_eq!(h.control.stats().brushes_created, 1);
    }

    #[test]
    fn single_stop_gradient_is_skipped() {
        let mut h = Harness::new();
        let mut g = GradientRenderer::new();
        h.attach(&mut g);
        let one = vec![ColorStop::new(0.0, Color::WHITE)];
        h.frame(|ctx| {
            g.fill_circle_radial(ctx, Vec2::new(5.0, 5.0), 3.0, &one, 1.0);
            g.fill_angular(ctx, Vec2::new(5.0, 5.0), 3.0, &one, 16, 0.0, 1.0);
        });
        assert_eq!(h.control.draw_count(), 0);
    }

    #[test]
    fn angular_gradient_draws_clamped_wedges() {
        let mut h = Harness::new();
        let mut g = GradientRenderer::new();
        h.attach(&mut g);
        h.frame(|ctx| g.fill_angular(ctx, Vec2::new(50.0, 50.0), 20.0, &stops(), 2, 0.0, 1.0));

        let cmds = h.control.draw_commands();
        assert_eq!(cmds.len(), MIN_ANGULAR_SEGMENTS as usize);
        let first = cmds[0].brush().map(|b| b.brush.clone());
        let last = cmds[cmds.len() - 1].brush().map(|b| b.brush.clone());
        assert_ne!(first, last);
        assert_eq!(h.control.stats().geometries_released, MIN_ANGULAR_SEGMENTS);
    }

    #[test]
    fn path_fill_releases_its_geometry() {
        let mut h = Harness::new();
        let mut g = GradientRenderer::new();
        h.attach(&mut g);
        let path = PathData::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let lin = LinearGradient::new(Vec2::zero(), Vec2::new(10.0, 0.0), stops());
        h.frame(|ctx| g.fill_path_linear(ctx, &path, &lin, 1.0));
        assert_eq!(h.control.draw_count(), 1);
        assert_eq!(h.control.stats().geometries_released, 1);
    }
}
