//! Gradient ramps: every gradient brush owns one row of a float texture.
//!
//! Stops are baked into `RAMP_WIDTH` premultiplied texels when the brush is
//! created; the fragment shader interpolates between neighbouring texels.

use crate::paint::{normalized_stops, sample_stops, ColorStop};

pub(crate) const RAMP_WIDTH: u32 = 256;
/// Both cache tables full, plus both flushed tables held until the frame ends.
pub(crate) const RAMP_ROWS: u32 = 4 * crate::resources::MAX_GRADIENT_ENTRIES as u32;

const TEXEL_BYTES: u32 = 16;

/// Bakes `stops` into one ramp row.
pub(crate) fn bake_row(stops: &[ColorStop]) -> Vec<[f32; 4]> {
    let stops = normalized_stops(stops);
    (0..RAMP_WIDTH)
        .map(|i| {
            let c = sample_stops(&stops, i as f32 / (RAMP_WIDTH - 1) as f32);
            [c.r, c.g, c.b, c.a]
        })
        .collect()
}

/// Free-list allocator over ramp rows.
#[derive(Debug, Default)]
pub(crate) struct RowAllocator {
    next: u32,
    free: Vec<u32>,
}

impl RowAllocator {
    pub fn allocate(&mut self) -> Option<u32> {
        if let Some(row) = self.free.pop() {
            return Some(row);
        }
        if self.next >= RAMP_ROWS {
            return None;
        }
        self.next += 1;
        Some(self.next - 1)
    }

    pub fn release(&mut self, row: u32) {
        if row < self.next && !self.free.contains(&row) {
            self.free.push(row);
        }
    }

    pub fn in_use(&self) -> usize {
        self.next as usize - self.free.len()
    }
}

/// Ramp texture plus its row allocator.
pub(crate) struct GradientRamp {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    rows: RowAllocator,
}

impl GradientRamp {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen gradient ramp"),
            size: wgpu::Extent3d {
                width: RAMP_WIDTH,
                height: RAMP_ROWS,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            rows: RowAllocator::default(),
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Uploads `stops` into a free row. `None` when every row is taken.
    pub fn insert(&mut self, queue: &wgpu::Queue, stops: &[ColorStop]) -> Option<u32> {
        let row = self.rows.allocate()?;
        let texels = bake_row(stops);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: row, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(RAMP_WIDTH * TEXEL_BYTES),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: RAMP_WIDTH,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        Some(row)
    }

    pub fn release(&mut self, row: u32) {
        self.rows.release(row);
    }

    pub fn rows_in_use(&self) -> usize {
        self.rows.in_use()
    }
}
