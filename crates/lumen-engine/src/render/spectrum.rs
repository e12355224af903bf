use crate::coords::{Rect, Vec2};
use crate::device::RenderSurface;
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::{LinearGradient, Paint, PaintStyle};
use crate::spectrum::{sanitize_magnitude, BarStyle, WaveformStyle};

use super::ctx::{Attachment, RenderCtx};
use super::gradients::GradientRenderer;
use super::primitives::PrimitiveRenderer;

pub const MAX_SCALE_DIVISIONS: u32 = 64;

/// Spectrum bars, waveforms and their scale lines.
///
/// Owns no surface resources of its own: shapes go through the primitive and
/// gradient renderers, and scale lines are cached in the shared resource cache.
#[derive(Default)]
pub struct SpectrumRenderer {
    attachment: Attachment,
}

impl SpectrumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// One bar per value, bottom-aligned in `rect`, left to right.
    ///
    /// Bar width is `(width - spacing * (n - 1)) / n`; when the spacing leaves
    /// no room the bars are packed without gaps. A gradient spans the whole
    /// `rect` from bottom to top, so every bar shares one brush.
    pub fn draw_bars(
        &self,
        ctx: &mut RenderCtx<'_>,
        primitives: &PrimitiveRenderer,
        gradients: &GradientRenderer,
        rect: Rect,
        values: &[f32],
        style: &BarStyle,
    ) {
        if values.is_empty() || !rect.is_drawable() || !self.ready(ctx) {
            return;
        }
        let r = rect.normalized();
        let bars = bar_rects(r, values, style.spacing);
        if bars.is_empty() {
            return;
        }
        let radius =
            if style.corner_radius.is_finite() { style.corner_radius.max(0.0) } else { 0.0 };

        match &style.gradient {
            Some(stops) => {
                let gradient = LinearGradient::new(
                    Vec2::new(r.origin.x, r.max().y),
                    Vec2::new(r.origin.x, r.min().y),
                    stops.clone(),
                );
                if radius > 0.0 {
                    let paint = Paint::from_brush(gradient);
                    for bar in &bars {
                        primitives.draw_rounded_rectangle(ctx, *bar, radius, radius, &paint);
                    }
                } else {
                    for bar in &bars {
                        gradients.fill_rect_linear(ctx, *bar, &gradient, 1.0);
                    }
                }
            }
            None => {
                let paint = Paint::fill(style.color);
                if radius > 0.0 {
                    for bar in &bars {
                        primitives.draw_rounded_rectangle(ctx, *bar, radius, radius, &paint);
                    }
                } else {
                    primitives.draw_rectangles(ctx, &bars, &paint);
                }
            }
        }
    }

    /// Samples as a polyline across `rect`, optionally with a reflected copy
    /// at `paint` alpha times `mirror_alpha`.
    pub fn draw_waveform(
        &self,
        ctx: &mut RenderCtx<'_>,
        primitives: &PrimitiveRenderer,
        rect: Rect,
        samples: &[f32],
        paint: &Paint,
        style: &WaveformStyle,
    ) {
        if samples.len() < 2 || !self.ready(ctx) {
            return;
        }
        let points = ctx.geometry.generate_waveform_points(samples, rect);
        if points.len() < 2 {
            return;
        }
        primitives.draw_polyline(ctx, &points, paint);

        if style.mirror {
            let mid = rect.normalized().center().y;
            let mirrored: Vec<Vec2> =
                points.iter().map(|p| Vec2::new(p.x, 2.0 * mid - p.y)).collect();
            let factor = if style.mirror_alpha.is_finite() {
                style.mirror_alpha.clamp(0.0, 1.0)
            } else {
                1.0
            };
            let faded = paint.with_global_alpha(paint.effective_alpha() * factor);
            primitives.draw_polyline(ctx, &mirrored, &faded);
        }
    }

    /// Horizontal lines splitting `rect` into `divisions` equal bands,
    /// including both edges. The line set is cached per rect and division count.
    pub fn draw_scale(
        &self,
        ctx: &mut RenderCtx<'_>,
        primitives: &PrimitiveRenderer,
        rect: Rect,
        divisions: u32,
        paint: &Paint,
    ) {
        if divisions == 0 || !rect.is_drawable() || !self.ready(ctx) {
            return;
        }
        let r = rect.normalized();
        let n = divisions.min(MAX_SCALE_DIVISIONS);
        let key = format!(
            "spectrum.scale|{:.1},{:.1},{:.1},{:.1}|{n}",
            r.origin.x, r.origin.y, r.size.x, r.size.y
        );
        let (min, max) = (r.min(), r.max());
        let geometry = ctx.resources.path_geometry(&mut *ctx.surface, &key, |sink| {
            for i in 0..=n {
                let y = min.y + r.height() * i as f32 / n as f32;
                sink.begin_figure(Vec2::new(min.x, y), false);
                sink.add_line(Vec2::new(max.x, y));
                sink.end_figure(false);
            }
        });
        if let Some(g) = geometry {
            primitives.draw_geometry(ctx, g, &paint.with_style(PaintStyle::Stroke));
        }
    }

    fn ready(&self, ctx: &RenderCtx<'_>) -> bool {
        self.attachment.sync(ctx.generation(), "spectrum renderer", || {})
    }
}

/// Bottom-aligned bar rectangles; zero-height bars are left out.
fn bar_rects(r: Rect, values: &[f32], spacing: f32) -> Vec<Rect> {
    let n = values.len() as f32;
    let mut spacing = if spacing.is_finite() { spacing.max(0.0) } else { 0.0 };
    let mut bar_w = (r.width() - spacing * (n - 1.0)) / n;
    if bar_w <= 0.0 {
        spacing = 0.0;
        bar_w = r.width() / n;
    }
    let bottom = r.max().y;
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let h = sanitize_magnitude(*v) * r.height();
            (h > 0.0).then(|| {
                Rect::new(r.origin.x + i as f32 * (bar_w + spacing), bottom - h, bar_w, h)
            })
        })
        .collect()
}

impl SurfaceLifecycle for SpectrumRenderer {
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
    use crate::paint::{even_stops, Brush, Color};
    use crate::render::testing::Harness;

    struct Renderers {
        spectrum: SpectrumRenderer,
        primitives: PrimitiveRenderer,
        gradients: GradientRenderer,
    }

    fn setup() -> (Harness, Renderers) {
        let h = Harness::new();
        let mut r = Renderers {
            spectrum: SpectrumRenderer::new(),
            primitives: PrimitiveRenderer::new(),
            gradients: GradientRenderer::new(),
        };
        h.attach(&mut r.spectrum);
        h.attach(&mut r.primitives);
        h.attach(&mut r.gradients);
        (h, r)
    }

    fn fill_rects(h: &Harness) -> Vec<Rect> {
        h.control
            .draw_commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    // ── bars ──

    #[test]
    fn bars_are_laid_out_bottom_aligned() {
        let (mut h, r) = setup();
        let style = BarStyle { spacing: 10.0, ..BarStyle::default() };
        h.frame(|ctx| {
            r.spectrum.draw_bars(
                ctx,
                &r.primitives,
                &r.gradients,
                Rect::new(0.0, 0.0, 100.0, 50.0),
                &[1.0, 0.5, 2.0, f32::NAN],
                &style,
            )
        });

        // (100 - 3 * 10) / 4 = 17.5 wide; the NaN bar is silent.
        assert_eq!(
            fill_rects(&h),
            vec![
                Rect::new(0.0, 0.0, 17.5, 50.0),
                Rect::new(27.5, 25.0, 17.5, 25.0),
                Rect::new(55.0, 0.0, 17.5, 50.0),
            ]
        );
    }

    #[test]
    fn gradient_bars_share_one_brush() {
        let (mut h, r) = setup();
        let style = BarStyle {
            gradient: Some(even_stops(&[Color::BLACK, Color::WHITE])),
            ..BarStyle::default()
        };
        h.frame(|ctx| {
            r.spectrum.draw_bars(
                ctx,
                &r.primitives,
                &r.gradients,
                Rect::new(0.0, 0.0, 100.0, 40.0),
                &[0.2, 0.4, 0.6, 0.8],
                &style,
            )
        });

        let cmds = h.control.draw_commands();
        assert_eq!(cmds.len(), 4);
        match &cmds[0].brush().map(|b| b.brush.clone()) {
            Some(Brush::Linear(g)) => {
                assert_eq!(g.start, Vec2::new(0.0, 40.0));
                assert_eq!(g.end, Vec2::new(0.0, 0.0));
            }
            other => panic!("expected linear brush, got {other:?}"),
        }
        assert_eq!(h.control.stats().brushes_created, 1);
    }

    #[test]
    fn rounded_bars_use_rounded_rects() {
        let (mut h, r) = setup();
        let style = BarStyle { corner_radius: 3.0, ..BarStyle::default() };
        h.frame(|ctx| {
            r.spectrum.draw_bars(
                ctx,
                &r.primitives,
                &r.gradients,
                Rect::new(0.0, 0.0, 100.0, 40.0),
                &[1.0, 1.0],
                &style,
            )
        });
        let cmds = h.control.draw_commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds.iter().all(|c| matches!(c, DrawCommand::FillRoundedRect { .. })));
    }

    #[test]
    fn crowded_bars_drop_the_spacing() {
        let bars = bar_rects(Rect::new(0.0, 0.0, 10.0, 10.0), &[1.0; 5], 5.0);
        assert_eq!(bars.len(), 5);
        assert_eq!(bars[1], Rect::new(2.0, 0.0, 2.0, 10.0));
    }

    #[test]
    fn empty_spectrum_draws_nothing() {
        let (mut h, r) = setup();
        h.frame(|ctx| {
            r.spectrum.draw_bars(
                ctx,
                &r.primitives,
                &r.gradients,
                Rect::new(0.0, 0.0, 100.0, 40.0),
                &[],
                &BarStyle::default(),
            )
        });
        assert_eq!(h.control.draw_count(), 0);
    }

    // ── waveform ──

    #[test]
    fn mirrored_waveform_reflects_about_the_midline() {
        let (mut h, r) = setup();
        let paint = Paint::stroke(Color::WHITE, 1.0);
        let style = WaveformStyle { mirror: true, mirror_alpha: 0.5 };
        h.frame(|ctx| {
            r.spectrum.draw_waveform(
                ctx,
                &r.primitives,
                Rect::new(0.0, 0.0, 10.0, 20.0),
                &[1.0, 0.0, -0.5],
                &paint,
                &style,
            )
        });

        let cmds = h.control.draw_commands();
        assert_eq!(cmds.len(), 2);
        let (
            DrawCommand::DrawGeometry { path: a, brush: ba, .. },
            DrawCommand::DrawGeometry { path: b, brush: bb, .. },
        ) = (&cmds[0], &cmds[1])
        else {
            panic!("expected two stroked geometries");
        };
        let first = a.figures[0].start;
        let mirrored = b.figures[0].start;
        assert_eq!(first, Vec2::new(0.0, 0.0));
        assert_eq!(mirrored, Vec2::new(0.0, 20.0));
        assert_eq!(ba.opacity, 1.0);
        assert_eq!(bb.opacity, 0.5);
    }

    #[test]
    fn single_sample_waveform_is_skipped() {
        let (mut h, r) = setup();
        h.frame(|ctx| {
            r.spectrum.draw_waveform(
                ctx,
                &r.primitives,
                Rect::new(0.0, 0.0, 10.0, 20.0),
                &[0.5],
                &Paint::stroke(Color::WHITE, 1.0),
                &WaveformStyle::default(),
            )
        });
        assert_eq!(h.control.draw_count(), 0);
    }

    // ── scale ──

    #[test]
    fn scale_lines_are_cached_across_frames() {
        let (mut h, r) = setup();
        let rect = Rect::new(0.0, 0.0, 50.0, 40.0);
        let paint = Paint::stroke(Color::WHITE, 1.0);
        h.frame(|ctx| r.spectrum.draw_scale(ctx, &r.primitives, rect, 4, &paint));
        h.frame(|ctx| r.spectrum.draw_scale(ctx, &r.primitives, rect, 4, &paint));

        assert_eq!(h.control.draw_count(), 2);
        assert_eq!(h.control.stats().geometries_created, 1);
        match &h.control.draw_commands()[0] {
            DrawCommand::DrawGeometry { path, .. } => assert_eq!(path.figures.len(), 5),
            other => panic!("unexpected {other:?}"),
        }
    }
}
