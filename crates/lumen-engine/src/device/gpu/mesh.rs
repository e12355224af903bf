//! Per-frame triangle batch.
//!
//! Every draw call of a frame is appended to one vertex/index list in paint
//! order. Consecutive draws with the same scissor share one indexed draw.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Transform, Vec2};
use crate::paint::{Color, SpreadMode};

use super::glyphs::AtlasGlyph;
use super::init::Scissor;
use super::tessellate::Mesh;

pub(crate) const PAINT_SOLID: u32 = 0;
pub(crate) const PAINT_LINEAR: u32 = 1;
pub(crate) const PAINT_RADIAL: u32 = 2;
/// Coverage comes from the glyph atlas.
pub(crate) const FLAG_GLYPH: u32 = 4;

/// Vertex layout (80 bytes):
///
///  offset  0  pos    [f32; 2]  loc 0  surface pixels after transform
///  offset  8  local  [f32; 2]  loc 1  brush space
///  offset 16  uv     [f32; 2]  loc 2  glyph atlas
///  offset 24  color  [f32; 4]  loc 3  premultiplied color or gradient tint
///  offset 40  paint  [f32; 4]  loc 4  linear: start, end / radial: center, radii
///  offset 56  focus  [f32; 2]  loc 5  radial origin offset
///  offset 64  flags  [u32; 4]  loc 6  kind | FLAG_GLYPH, spread, ramp row, 0
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshVertex {
    pub pos: [f32; 2],
    pub local: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub paint: [f32; 4],
    pub focus: [f32; 2],
    pub flags: [u32; 4],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x2,
        6 => Uint32x4
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Brush state resolved for one draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PaintParams {
    pub color: [f32; 4],
    pub paint: [f32; 4],
    pub focus: [f32; 2],
    pub flags: [u32; 4],
}

impl PaintParams {
    pub fn solid(color: Color) -> Self {
        Self {
            color: [color.r, color.g, color.b, color.a],
            paint: [0.0; 4],
            focus: [0.0; 2],
            flags: [PAINT_SOLID, 0, 0, 0],
        }
    }

    pub fn linear(start: Vec2, end: Vec2, spread: SpreadMode, row: u32) -> Self {
        Self {
            color: [1.0; 4],
            paint: [start.x, start.y, end.x, end.y],
            focus: [0.0; 2],
            flags: [PAINT_LINEAR, spread_code(spread), row, 0],
        }
    }

    pub fn radial(
        center: Vec2,
        radius: Vec2,
        focus: Vec2,
        spread: SpreadMode,
        row: u32,
    ) -> Self {
        Self {
            color: [1.0; 4],
            paint: [center.x, center.y, radius.x, radius.y],
            focus: [focus.x, focus.y],
            flags: [PAINT_RADIAL, spread_code(spread), row, 0],
        }
    }

    /// Multiplies every channel; colors are premultiplied.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        let a = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 };
        for c in &mut self.color {
            *c *= a;
        }
        self
    }

    pub fn glyph(mut self) -> Self {
        self.flags[0] |= FLAG_GLYPH;
        self
    }

    fn vertex(&self, pos: Vec2, local: Vec2, uv: [f32; 2]) -> MeshVertex {
        MeshVertex {
            pos: [pos.x, pos.y],
            local: [local.x, local.y],
            uv,
            color: self.color,
            paint: self.paint,
            focus: self.focus,
            flags: self.flags,
        }
    }
}

fn spread_code(spread: SpreadMode) -> u32 {
    match spread {
        SpreadMode::Pad => 0,
        SpreadMode::Repeat => 1,
        SpreadMode::Reflect => 2,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub indices: Range<u32>,
    pub scissor: Scissor,
}

#[derive(Debug, Default)]
pub(crate) struct MeshBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    calls: Vec<DrawCall>,
}

impl MeshBatch {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.calls.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Appends a local-space mesh, mapping positions through `transform`.
    pub fn push_mesh(
        &mut self,
        mesh: &Mesh,
        transform: Transform,
        paint: &PaintParams,
        scissor: Scissor,
    ) {
        if mesh.is_empty() {
            return;
        }
        let base = self.vertices.len() as u32;
        self.vertices.extend(
            mesh.positions
                .iter()
                .map(|&p| paint.vertex(transform.transform_point(p), p, [0.0; 2])),
        );
        let start = self.indices.len() as u32;
        self.indices.extend(mesh.indices.iter().map(|i| i + base));
        self.extend_call(start..self.indices.len() as u32, scissor);
    }

    /// Appends one glyph quad covering `rect`.
    pub fn push_glyph(
        &mut self,
        rect: Rect,
        glyph: &AtlasGlyph,
        transform: Transform,
        paint: &PaintParams,
        scissor: Scissor,
    ) {
        let (min, max) = (rect.min(), rect.max());
        let [u0, v0] = glyph.uv_min;
        let [u1, v1] = glyph.uv_max;
        let corners = [
            (min, [u0, v0]),
            (Vec2::new(max.x, min.y), [u1, v0]),
            (max, [u1, v1]),
            (Vec2::new(min.x, max.y), [u0, v1]),
        ];

        let base = self.vertices.len() as u32;
        self.vertices.extend(
            corners
                .iter()
                .map(|&(p, uv)| paint.vertex(transform.transform_point(p), p, uv)),
        );
        let start = self.indices.len() as u32;
        self.indices.extend([0, 1, 2, 0, 2, 3].map(|i| i + base));
        self.extend_call(start..self.indices.len() as u32, scissor);
    }

    fn extend_call(&mut self, range: Range<u32>, scissor: Scissor) {
        if let Some(last) = self.calls.last_mut() {
            if last.scissor == scissor && last.indices.end == range.start {
                last.indices.end = range.end;
                return;
            }
        }
        self.calls.push(DrawCall { indices: range, scissor });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SurfaceSize;

    fn full() -> Scissor {
        Scissor::full(SurfaceSize::new(100, 100))
    }

    fn quad() -> Mesh {
        Mesh::quad(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn vertex_layout_matches_the_shader() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 80);
    }

    #[test]
    fn same_scissor_draws_are_merged() {
        let mut batch = MeshBatch::default();
        let paint = PaintParams::solid(Color::WHITE);
        batch.push_mesh(&quad(), Transform::identity(), &paint, full());
        batch.push_mesh(&quad(), Transform::identity(), &paint, full());
        assert_eq!(batch.calls(), &[DrawCall { indices: 0..12, scissor: full() }]);
        assert_eq!(batch.indices()[6..], [4, 5, 6, 4, 6, 7]);

        let clip = Scissor { x: 0, y: 0, width: 5, height: 5 };
        batch.push_mesh(&quad(), Transform::identity(), &paint, clip);
        assert_eq!(batch.calls().len(), 2);
        assert_eq!(batch.calls()[1].indices, 12..18);
    }

    #[test]
    fn transform_moves_position_but_not_brush_space() {
        let mut batch = MeshBatch::default();
        let paint = PaintParams::solid(Color::WHITE);
        batch.push_mesh(&quad(), Transform::translation(5.0, 7.0), &paint, full());
        let v = batch.vertices()[2];
        assert_eq!(v.pos, [15.0, 17.0]);
        assert_eq!(v.local, [10.0, 10.0]);
    }

    #[test]
    fn empty_meshes_add_no_calls() {
        let mut batch = MeshBatch::default();
        let paint = PaintParams::solid(Color::WHITE);
        batch.push_mesh(&Mesh::default(), Transform::identity(), &paint, full());
        assert!(batch.is_empty());
        assert!(batch.calls().is_empty());
    }

    #[test]
    fn glyph_quads_carry_atlas_coordinates() {
        let mut batch = MeshBatch::default();
        let glyph = AtlasGlyph { uv_min: [0.0, 0.5], uv_max: [0.25, 0.75] };
        let paint = PaintParams::solid(Color::WHITE).glyph();
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        batch.push_glyph(rect, &glyph, Transform::identity(), &paint, full());
        assert_eq!(batch.vertices()[2].uv, [0.25, 0.75]);
        assert_eq!(batch.vertices()[0].flags[0], PAINT_SOLID | FLAG_GLYPH);
    }

    #[test]
    fn alpha_scales_premultiplied_channels() {
        let p = PaintParams::solid(Color::from_premul(0.5, 0.5, 0.5, 1.0)).with_alpha(0.5);
        assert_eq!(p.color, [0.25, 0.25, 0.25, 0.5]);
        let g = PaintParams::linear(Vec2::zero(), Vec2::new(1.0, 0.0), SpreadMode::Reflect, 3)
            .with_alpha(f32::NAN);
        assert_eq!(g.color, [0.0; 4]);
        assert_eq!(g.flags, [PAINT_LINEAR, 2, 3, 0]);
    }
}
