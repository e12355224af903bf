use std::cell::RefCell;
use std::collections::HashMap;
use std::f32::consts::FRAC_1_SQRT_2;

use crate::coords::{Rect, Vec2};
use crate::device::{RenderSurface, TextFormatHandle};
use crate::lifecycle::SurfaceLifecycle;
use crate::paint::Color;
use crate::text::{TextOutline, TextStyle};

use super::ctx::{Attachment, RenderCtx};

/// The format table is flushed once it holds this many entries.
pub const MAX_TEXT_FORMATS: usize = 64;

/// Unit offsets for the outline passes: four axes, four diagonals.
const OUTLINE_DIRECTIONS: [(f32, f32); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// Text drawing and measuring.
///
/// Surface text formats are cached by
/// [`TextFormatDesc::cache_key`](crate::text::TextFormatDesc::cache_key),
/// at most [`MAX_TEXT_FORMATS`] at a time.
/// Outlines are eight offset passes in the outline color beneath the main pass.
#[derive(Default)]
pub struct TextRenderer {
    attachment: Attachment,
    formats: RefCell<HashMap<u64, TextFormatHandle>>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached surface format for `style`.
    pub fn text_format(
        &self,
        ctx: &mut RenderCtx<'_>,
        style: &TextStyle,
    ) -> Option<TextFormatHandle> {
        if !(style.size.is_finite() && style.size > 0.0) || !self.ready(ctx) {
            return None;
        }
        let desc = style.format_desc();
        let key = desc.cache_key();
        if let Some(h) = self.formats.borrow().get(&key) {
            return Some(*h);
        }
        match ctx.surface.create_text_format(&desc) {
            Ok(h) => {
                let mut formats = self.formats.borrow_mut();
                if formats.len() >= MAX_TEXT_FORMATS {
                    log::debug!("text format table full; releasing {} entries", formats.len());
                    for (_, old) in formats.drain() {
                        ctx.surface.release_text_format(old);
                    }
                }
                formats.insert(key, h);
                Some(h)
            }
            Err(e) => {
                log::error!(
                    "text format creation failed for '{}' {}px: {e}",
                    desc.family,
                    desc.size
                );
                None
            }
        }
    }

    pub fn format_count(&self) -> usize {
        self.formats.borrow().len()
    }

    /// Draws `text` inside `rect`, with the style's outline when it has one.
    pub fn draw_text(&self, ctx: &mut RenderCtx<'_>, text: &str, rect: Rect, style: &TextStyle) {
        if text.is_empty() || !rect.is_drawable() {
            return;
        }
        let rect = rect.normalized();
        let Some(format) = self.text_format(ctx, style) else { return };

        if let Some(outline) = style.outline.filter(usable_outline) {
            if let Some(brush) = ctx.solid(outline.color) {
                for (dx, dy) in OUTLINE_DIRECTIONS {
                    let offset = Vec2::new(dx * outline.width, dy * outline.width);
                    ctx.surface.draw_text(text, format, rect.translate(offset), brush);
                }
            }
        }
        if let Some(brush) = ctx.solid(style.color) {
            ctx.surface.draw_text(text, format, rect, brush);
        }
    }

    /// Same as [`draw_text`](Self::draw_text) with the outline given explicitly.
    pub fn draw_text_outlined(
        &self,
        ctx: &mut RenderCtx<'_>,
        text: &str,
        rect: Rect,
        style: &TextStyle,
        outline_color: Color,
        outline_width: f32,
    ) {
        let style = style.clone().with_outline(outline_color, outline_width);
        self.draw_text(ctx, text, rect, &style);
    }

    /// Laid-out size of `text`, or zero when it cannot be measured.
    pub fn measure_text(
        &self,
        ctx: &mut RenderCtx<'_>,
        text: &str,
        style: &TextStyle,
        max_width: Option<f32>,
    ) -> Vec2 {
        if text.is_empty() {
            return Vec2::zero();
        }
        let max_width = max_width.filter(|w| w.is_finite() && *w > 0.0);
        self.text_format(ctx, style)
            .and_then(|format| ctx.surface.measure_text(text, format, max_width))
            .unwrap_or_default()
    }

    fn ready(&self, ctx: &RenderCtx<'_>) -> bool {
        self.attachment.sync(ctx.generation(), "text renderer", || {
            self.formats.borrow_mut().clear();
        })
    }
}

fn usable_outline(outline: &TextOutline) -> bool {
    outline.width.is_finite() && outline.width > 0.0 && outline.color.a > 0.0
}

impl SurfaceLifecycle for TextRenderer {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.formats.get_mut().clear();
        self.attachment.attach(surface.generation());
    }

    fn on_surface_lost(&mut self) {
        self.formats.get_mut().clear();
        self.attachment.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DrawCommand;
    use crate::render::testing::Harness;
    use crate::text::FontWeight;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn formats_are_cached_per_description() {
        let mut h = Harness::new();
        let mut t = TextRenderer::new();
        h.attach(&mut t);
        let style = TextStyle::new("Inter", 12.0);
        h.frame(|ctx| {
            let a = t.text_format(ctx, &style);
            let b = t.text_format(ctx, &style.clone().with_color(Color::BLACK));
            assert!(a.is_some());
            assert_eq!(a, b);
            t.text_format(ctx, &style.clone().with_weight(FontWeight::BOLD));
        });
        assert_eq!(t.format_count(), 2);
        assert_eq!(h.control.stats().text_formats_created, 2);
    }

    #[test]
    fn format_table_is_bounded_and_releases_flushed_formats() {
        let mut h = Harness::new();
        let mut t = TextRenderer::new();
        h.attach(&mut t);
        h.frame(|ctx| {
            for i in 0..=MAX_TEXT_FORMATS {
                let style = TextStyle::new("Inter", 8.0 + i as f32);
                assert!(t.text_format(ctx, &style).is_some());
            }
        });
        assert_eq!(t.format_count(), 1);
        let stats = h.control.stats();
        assert_eq!(stats.text_formats_created, MAX_TEXT_FORMATS as u32 + 1);
        assert_eq!(stats.text_formats_released, MAX_TEXT_FORMATS as u32);
    }

    #[test]
    fn outline_draws_eight_passes_beneath() {
        let mut h = Harness::new();
        let mut t = TextRenderer::new();
        h.attach(&mut t);
        let style = TextStyle::new("Inter", 12.0).with_color(Color::WHITE);
        let rect = Rect::new(10.0, 10.0, 100.0, 20.0);
        h.frame(|ctx| t.draw_text_outlined(ctx, "hi", rect, &style, Color::BLACK, 2.0));

        let cmds = h.control.draw_commands();
        assert_eq!(cmds.len(), 9);
        let colors: Vec<Color> = cmds
            .iter()
            .filter_map(|cmd| match &cmd.brush()?.brush {
                crate::paint::Brush::Solid(color) => Some(*color),
                _ => None,
            })
            .collect();
        assert!(colors[..8].iter().all(|c| *c == Color::BLACK));
        assert_eq!(colors[8], Color::WHITE);

        match &cmds[4] {
            DrawCommand::DrawText { rect: r, .. } => {
                assert!(approx_eq(r.origin.x, 10.0 + 2.0 * FRAC_1_SQRT_2));
                assert!(approx_eq(r.origin.y, 10.0 + 2.0 * FRAC_1_SQRT_2));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &cmds[8] {
            DrawCommand::DrawText { rect: r, text, .. } => {
                assert_eq!(*r, rect);
                assert_eq!(text, "hi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_text_and_bad_sizes_are_skipped() {
        let mut h = Harness::new();
        let mut t = TextRenderer::new();
        h.attach(&mut t);
        h.frame(|ctx| {
            t.draw_text(ctx, "", Rect::new(0.0, 0.0, 10.0, 10.0), &TextStyle::default());
            t.draw_text(ctx, "x", Rect::new(0.0, 0.0, 0.0, 10.0), &TextStyle::default());
            t.draw_text(ctx, "x", Rect::new(0.0, 0.0, 10.0, 10.0), &TextStyle::new("a", -1.0));
        });
        assert_eq!(h.control.draw_count(), 0);
    }

    #[test]
    fn measure_falls_back_to_estimate_without_fonts() {
        let mut h = Harness::new();
        let mut t = TextRenderer::new();
        h.attach(&mut t);
        let mut size = Vec2::zero();
        h.frame(|ctx| size = t.measure_text(ctx, "abcd", &TextStyle::new("x", 10.0), None));
        assert!(approx_eq(size.x, 20.0));
        assert!(approx_eq(size.y, 12.0));
    }

    #[test]
    fn dormant_measure_is_zero() {
        let mut h = Harness::new();
        let t = TextRenderer::new();
        let mut size = Vec2::new(1.0, 1.0);
        h.frame(|ctx| size = t.measure_text(ctx, "abcd", &TextStyle::default(), None));
        assert_eq!(size, Vec2::zero());
    }
}
