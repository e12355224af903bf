//! Glyph layout and the R8 coverage atlas.

use std::collections::HashMap;

use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle,
};

use crate::coords::Rect;
use crate::text::TextAlignment;

pub(crate) const ATLAS_SIZE: u32 = 2048;
const GLYPH_PADDING: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct AtlasGlyph {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
}

/// Row-by-row rectangle packer. Never frees; a full atlas stays full until
/// the surface is rebuilt.
#[derive(Debug)]
pub(crate) struct ShelfPacker {
    size: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
}

impl ShelfPacker {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Top-left corner for a `w`×`h` box, or `None` once out of space.
    pub fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.full || w + 2 * GLYPH_PADDING > self.size {
            return None;
        }
        if self.cursor_x + w + GLYPH_PADDING > self.size {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.cursor_y + h + GLYPH_PADDING > self.size {
            log::warn!("glyph atlas is full ({0}x{0}); some glyphs will not be drawn", self.size);
            self.full = true;
            return None;
        }

        let at = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(at)
    }
}

/// One glyph positioned in surface space.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PlacedGlyph {
    pub key: GlyphRasterConfig,
    pub rect: Rect,
}

/// Lays `text` out inside `rect`, wrapping at its width.
pub(crate) fn layout_text(
    layout: &mut Layout<()>,
    font: &fontdue::Font,
    text: &str,
    size: f32,
    rect: Rect,
    alignment: TextAlignment,
) -> Vec<PlacedGlyph> {
    let r = rect.normalized();
    let horizontal_align = match alignment {
        TextAlignment::Leading => HorizontalAlign::Left,
        TextAlignment::Center => HorizontalAlign::Center,
        TextAlignment::Trailing => HorizontalAlign::Right,
    };
    layout.reset(&LayoutSettings {
        x: r.origin.x,
        y: r.origin.y,
        max_width: (r.width() > 0.0).then_some(r.width()),
        horizontal_align,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, size, 0));

    layout
        .glyphs()
        .iter()
        .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
        .map(|g| PlacedGlyph {
            key: g.key,
            rect: Rect::new(g.x, g.y, g.width as f32, g.height as f32),
        })
        .collect()
}

pub(crate) fn new_layout() -> Layout<()> {
    Layout::new(CoordinateSystem::PositiveYDown)
}

/// Coverage atlas shared by every text draw on one surface.
pub(crate) struct GlyphAtlas {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    packer: ShelfPacker,
    // `None` marks glyphs with no coverage or no room; they are not retried.
    glyphs: HashMap<GlyphRasterConfig, Option<AtlasGlyph>>,
}

impl GlyphAtlas {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen glyph atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            packer: ShelfPacker::new(ATLAS_SIZE),
            glyphs: HashMap::new(),
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Atlas entry for `key`, rasterising and uploading it on first use.
    pub fn glyph(
        &mut self,
        queue: &wgpu::Queue,
        font: &fontdue::Font,
        key: GlyphRasterConfig,
    ) -> Option<AtlasGlyph> {
        if let Some(entry) = self.glyphs.get(&key) {
            return *entry;
        }
        let entry = self.rasterize(queue, font, key);
        self.glyphs.insert(key, entry);
        entry
    }

    fn rasterize(
        &mut self,
        queue: &wgpu::Queue,
        font: &fontdue::Font,
        key: GlyphRasterConfig,
    ) -> Option<AtlasGlyph> {
        if self.packer.is_full() {
            return None;
        }
        let (metrics, bitmap) = font.rasterize_config(key);
        let (w, h) = (metrics.width as u32, metrics.height as u32);
        if w == 0 || h == 0 {
            return None;
        }
        let (gx, gy) = self.packer.place(w, h)?;

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: gx, y: gy, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        let atlas = ATLAS_SIZE as f32;
        Some(AtlasGlyph {
            uv_min: [gx as f32 / atlas, gy as f32 / atlas],
            uv_max: [(gx + w) as f32 / atlas, (gy + h) as f32 / atlas],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_fill_rows_left_to_right() {
        let mut packer = ShelfPacker::new(32);
        assert_eq!(packer.place(10, 4), Some((1, 1)));
        assert_eq!(packer.place(10, 6), Some((12, 1)));
        // 23 + 10 + 1 > 32: next shelf starts below the tallest box.
        assert_eq!(packer.place(10, 2), Some((1, 8)));
    }

    #[test]
    fn packer_reports_full_once() {
        let mut packer = ShelfPacker::new(16);
        assert!(packer.place(14, 14).is_some());
        assert_eq!(packer.place(14, 14), None);
        assert!(packer.is_full());
        assert_eq!(packer.place(1, 1), None);
    }

    #[test]
    fn oversized_boxes_are_rejected_without_filling() {
        let mut packer = ShelfPacker::new(16);
        assert_eq!(packer.place(20, 2), None);
        assert!(!packer.is_full());
        assert!(packer.place(4, 4).is_some());
    }
}
