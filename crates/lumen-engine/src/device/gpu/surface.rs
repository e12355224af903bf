use std::rc::Rc;
use std::sync::Arc;

use fontdue::layout::Layout;
use slotmap::SlotMap;
use winit::window::Window;

use crate::coords::{Rect, SurfaceSize, Transform, Vec2};
use crate::device::{
    BrushHandle, BrushKey, EndDrawStatus, Generation, GeometryHandle, GeometryKey, Handle,
    RenderSurface, StrokeStyleHandle, StrokeStyleKey, SurfaceError, SurfaceProvider,
    TextFormatHandle, TextFormatKey,
};
use crate::geometry::flatten::{flatten, Polyline};
use crate::geometry::PathData;
use crate::paint::{Color, LinearGradient, RadialGradient, StrokeStyleDesc};
use crate::text::{FontSystem, TextFormatDesc};

use super::context::GpuContext;
use super::glyphs::{self, GlyphAtlas};
use super::init::{classify_surface_error, clip_to_scissor, AcquireFailure, Scissor};
use super::mesh::{MeshBatch, PaintParams};
use super::pipeline::MeshPipeline;
use super::ramp::GradientRamp;
use super::tessellate::{self, Mesh};
use super::GpuInit;

// ── provider ──────────────────────────────────────────────────────────────

/// Builds [`GpuSurface`]s for one window.
pub struct GpuProvider {
    window: Arc<Window>,
    init: GpuInit,
    fonts: Rc<FontSystem>,
    context: Option<Rc<GpuContext>>,
}

impl GpuProvider {
    pub fn new(window: Arc<Window>, init: GpuInit, fonts: Rc<FontSystem>) -> Self {
        Self {
            window,
            init,
            fonts,
            context: None,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn build_context(&self) -> anyhow::Result<Rc<GpuContext>> {
        let context = pollster::block_on(GpuContext::new(self.window.clone(), &self.init))?;
        Ok(Rc::new(context))
    }
}

impl SurfaceProvider for GpuProvider {
    type Surface = GpuSurface;

    fn initialize(&mut self) -> anyhow::Result<()> {
        if self.context.is_none() {
            self.context = Some(self.build_context()?);
        }
        Ok(())
    }

    fn drawable_size(&self) -> SurfaceSize {
        let s = self.window.inner_size();
        SurfaceSize::new(s.width, s.height)
    }

    fn create_surface(
        &mut self,
        generation: Generation,
        size: SurfaceSize,
    ) -> Result<GpuSurface, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::EmptySize);
        }
        if self.context.as_ref().is_none_or(|c| c.is_lost()) {
            // The window surface must be released before a new one is made.
            self.context = None;
            log::debug!("rebuilding wgpu device");
            let context = self
                .build_context()
                .map_err(|e| SurfaceError::Backend(format!("{e:#}")))?;
            self.context = Some(context);
        }
        let Some(context) = self.context.clone() else {
            return Err(SurfaceError::Lost);
        };
        Ok(GpuSurface::new(context, generation, size, &self.init, self.fonts.clone()))
    }
}

// ── surface ───────────────────────────────────────────────────────────────

enum BrushKind {
    Solid(Color),
    Linear { gradient: LinearGradient, row: u32 },
    Radial { gradient: RadialGradient, row: u32 },
}

struct GpuBrush {
    kind: BrushKind,
    opacity: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct StrokeKey {
    width_bits: u32,
    style: Option<StrokeStyleKey>,
}

/// Flattened once at creation; meshes are built on first use.
struct GpuGeometry {
    polylines: Vec<Polyline>,
    fill: Option<Mesh>,
    stroke: Option<(StrokeKey, Mesh)>,
}

#[derive(Debug, Copy, Clone)]
struct Layer {
    // Product of every open layer's opacity.
    alpha: f32,
    clipped: bool,
}

/// wgpu render target for one surface generation.
///
/// Draw calls are tessellated on the CPU into one batch per frame; the batch
/// is uploaded and drawn in a single render pass at `end_draw`. Opacity
/// layers scale vertex alpha instead of compositing an offscreen group.
pub struct GpuSurface {
    context: Rc<GpuContext>,
    config: wgpu::SurfaceConfiguration,
    generation: Generation,
    size: SurfaceSize,
    transform: Transform,
    tolerance: f32,

    pipeline: MeshPipeline,
    ramp: GradientRamp,
    atlas: GlyphAtlas,
    fonts: Rc<FontSystem>,
    layout: Layout<()>,

    brushes: SlotMap<BrushKey, GpuBrush>,
    geometries: SlotMap<GeometryKey, GpuGeometry>,
    stroke_styles: SlotMap<StrokeStyleKey, StrokeStyleDesc>,
    text_formats: SlotMap<TextFormatKey, TextFormatDesc>,

    drawing: bool,
    clear_color: Color,
    batch: MeshBatch,
    layers: Vec<Layer>,
    clips: Vec<Rect>,
}

impl GpuSurface {
    fn new(
        context: Rc<GpuContext>,
        generation: Generation,
        size: SurfaceSize,
        init: &GpuInit,
        fonts: Rc<FontSystem>,
    ) -> Self {
        let config = context.surface_config(size.width, size.height, init);
        context.surface().configure(context.device(), &config);

        let ramp = GradientRamp::new(context.device());
        let atlas = GlyphAtlas::new(context.device());
        let pipeline =
            MeshPipeline::new(context.device(), context.format(), ramp.view(), atlas.view());

        Self {
            context,
            config,
            generation,
            size,
            transform: Transform::identity(),
            tolerance: init.tolerance.max(0.01),
            pipeline,
            ramp,
            atlas,
            fonts,
            layout: glyphs::new_layout(),
            brushes: SlotMap::with_key(),
            geometries: SlotMap::with_key(),
            stroke_styles: SlotMap::with_key(),
            text_formats: SlotMap::with_key(),
            drawing: false,
            clear_color: Color::transparent(),
            batch: MeshBatch::default(),
            layers: Vec::new(),
            clips: Vec::new(),
        }
    }

    pub fn live_brushes(&self) -> usize {
        self.brushes.len()
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    fn check<K: slotmap::Key>(&self, handle: Handle<K>) -> Option<K> {
        handle.belongs_to(self.generation).then(|| handle.key())
    }

    fn layer_alpha(&self) -> f32 {
        self.layers.last().map_or(1.0, |l| l.alpha)
    }

    /// Paint for a draw, or `None` outside a frame or for a dead brush.
    fn paint(&self, brush: BrushHandle) -> Option<PaintParams> {
        if !self.drawing {
            return None;
        }
        let entry = self.brushes.get(self.check(brush)?)?;
        let params = match &entry.kind {
            BrushKind::Solid(c) => PaintParams::solid(*c),
            BrushKind::Linear { gradient: g, row } => {
                PaintParams::linear(g.start, g.end, g.spread, *row)
            }
            BrushKind::Radial { gradient: g, row } => PaintParams::radial(
                g.center,
                Vec2::new(g.radius_x, g.radius_y),
                g.origin_offset,
                g.spread,
                *row,
            ),
        };
        Some(params.with_alpha(entry.opacity * self.layer_alpha()))
    }

    /// Paint and scissor for a draw that would be visible.
    fn target(&self, brush: BrushHandle) -> Option<(PaintParams, Scissor)> {
        let paint = self.paint(brush)?;
        let scissor = clip_to_scissor(self.clips.last().copied(), self.size)?;
        Some((paint, scissor))
    }

    /// Flattening tolerance in local space for the current transform.
    fn local_tolerance(&self) -> f32 {
        self.tolerance / self.transform.approx_scale().max(1e-3)
    }

    fn stroke_desc(&self, style: Option<StrokeStyleHandle>) -> StrokeStyleDesc {
        style
            .and_then(|s| self.check(s))
            .and_then(|k| self.stroke_styles.get(k))
            .cloned()
            .unwrap_or_default()
    }

    fn emit(&mut self, brush: BrushHandle, mesh: impl FnOnce(&Self) -> Mesh) {
        let Some((paint, scissor)) = self.target(brush) else { return };
        let mesh = mesh(self);
        self.batch.push_mesh(&mesh, self.transform, &paint, scissor);
    }

    fn fill_path(&mut self, path: PathData, brush: BrushHandle) {
        self.emit(brush, |s| {
            let tol = s.local_tolerance();
            tessellate::fill(&flatten(&path, tol), tol)
        });
    }

    fn stroke_path(
        &mut self,
        path: PathData,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        self.emit(brush, |s| {
            let tol = s.local_tolerance();
            tessellate::stroke(&flatten(&path, tol), width, &s.stroke_desc(style), tol)
        });
    }

    fn ramp_full(&self) -> SurfaceError {
        SurfaceError::InvalidResource(format!(
            "gradient ramp is full ({} rows in use)",
            self.ramp.rows_in_use()
        ))
    }

    fn present(&mut self) -> EndDrawStatus {
        let context = self.context.clone();
        if context.is_lost() {
            return EndDrawStatus::RecreateTarget;
        }

        let frame = match context.surface().get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                return match classify_surface_error(&e) {
                    AcquireFailure::Recreate => EndDrawStatus::RecreateTarget,
                    AcquireFailure::Reconfigure => {
                        context.surface().configure(context.device(), &self.config);
                        EndDrawStatus::Failed(SurfaceError::Backend(e.to_string()))
                    }
                    AcquireFailure::Skip => {
                        EndDrawStatus::Failed(SurfaceError::Backend(e.to_string()))
                    }
                };
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        let c = self.clear_color;
        let clear = wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        };
        self.pipeline.encode(
            context.device(),
            context.queue(),
            &mut encoder,
            &view,
            self.size,
            clear,
            &self.batch,
        );

        context.queue().submit(std::iter::once(encoder.finish()));
        let suboptimal = frame.suboptimal;
        frame.present();

        if suboptimal {
            context.surface().configure(context.device(), &self.config);
        }
        if context.is_lost() {
            return EndDrawStatus::RecreateTarget;
        }
        EndDrawStatus::Ok
    }
}

impl RenderSurface for GpuSurface {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), SurfaceError> {
        if self.context.is_lost() {
            return Err(SurfaceError::Lost);
        }
        if size.is_empty() {
            return Err(SurfaceError::EmptySize);
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.context
            .surface()
            .configure(self.context.device(), &self.config);
        self.size = size;
        Ok(())
    }

    fn begin_draw(&mut self) {
        self.drawing = true;
        self.clear_color = Color::transparent();
        self.batch.clear();
        self.layers.clear();
        self.clips.clear();
    }

    fn end_draw(&mut self) -> EndDrawStatus {
        if !self.drawing {
            return EndDrawStatus::Failed(SurfaceError::Backend(
                "end_draw without begin_draw".into(),
            ));
        }
        self.drawing = false;
        self.present()
    }

    fn clear(&mut self, color: Color) {
        if !self.drawing {
            return;
        }
        match self.clips.last().copied() {
            None => {
                self.batch.clear();
                self.clear_color = color;
            }
            Some(clip) => {
                let Some(scissor) = clip_to_scissor(Some(clip), self.size) else { return };
                let paint = PaintParams::solid(color);
                self.batch
                    .push_mesh(&Mesh::quad(clip), Transform::identity(), &paint, scissor);
            }
        }
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    // ── resources ─────────────────────────────────────────────────────────

    fn create_solid_brush(&mut self, color: Color) -> Result<BrushHandle, SurfaceError> {
        if !color.is_finite() {
            return Err(SurfaceError::InvalidResource("non-finite color".into()));
        }
        let key = self.brushes.insert(GpuBrush {
            kind: BrushKind::Solid(color),
            opacity: 1.0,
        });
        Ok(Handle::new(key, self.generation))
    }

    fn set_solid_brush_color(&mut self, brush: BrushHandle, color: Color) {
        let Some(key) = self.check(brush) else { return };
        if let Some(GpuBrush { kind: BrushKind::Solid(c), .. }) = self.brushes.get_mut(key) {
            *c = color;
        }
    }

    fn create_linear_gradient_brush(
        &mut self,
        gradient: &LinearGradient,
    ) -> Result<BrushHandle, SurfaceError> {
        if !gradient.is_valid() {
            return Err(SurfaceError::InvalidResource("invalid linear gradient".into()));
        }
        let row = self
            .ramp
            .insert(self.context.queue(), &gradient.stops)
            .ok_or_else(|| self.ramp_full())?;
        let key = self.brushes.insert(GpuBrush {
            kind: BrushKind::Linear { gradient: gradient.clone(), row },
            opacity: 1.0,
        });
        Ok(Handle::new(key, self.generation))
    }

    fn create_radial_gradient_brush(
        &mut self,
        gradient: &RadialGradient,
    ) -> Result<BrushHandle, SurfaceError> {
        if !gradient.is_valid() {
            return Err(SurfaceError::InvalidResource("invalid radial gradient".into()));
        }
        let row = self
            .ramp
            .insert(self.context.queue(), &gradient.stops)
            .ok_or_else(|| self.ramp_full())?;
        let key = self.brushes.insert(GpuBrush {
            kind: BrushKind::Radial { gradient: gradient.clone(), row },
            opacity: 1.0,
        });
        Ok(Handle::new(key, self.generation))
    }

    fn set_brush_opacity(&mut self, brush: BrushHandle, opacity: f32) {
        let Some(key) = self.check(brush) else { return };
        if let Some(entry) = self.brushes.get_mut(key) {
            entry.opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 0.0 };
        }
    }

    fn release_brush(&mut self, brush: BrushHandle) {
        let Some(key) = self.check(brush) else { return };
        if let Some(BrushKind::Linear { row, .. } | BrushKind::Radial { row, .. }) =
            self.brushes.remove(key).map(|b| b.kind)
        {
            self.ramp.release(row);
        }
    }

    fn create_geometry(&mut self, path: &PathData) -> Result<GeometryHandle, SurfaceError> {
        let polylines = flatten(path, self.tolerance);
        let key = self.geometries.insert(GpuGeometry {
            polylines,
            fill: None,
            stroke: None,
        });
        Ok(Handle::new(key, self.generation))
    }

    fn release_geometry(&mut self, geometry: GeometryHandle) {
        if let Some(key) = self.check(geometry) {
            self.geometries.remove(key);
        }
    }

    fn create_stroke_style(
        &mut self,
        desc: &StrokeStyleDesc,
    ) -> Result<StrokeStyleHandle, SurfaceError> {
        if !desc.miter_limit.is_finite() {
            return Err(SurfaceError::InvalidResource("non-finite miter limit".into()));
        }
        let key = self.stroke_styles.insert(desc.clone());
        Ok(Handle::new(key, self.generation))
    }

    fn release_stroke_style(&mut self, style: StrokeStyleHandle) {
        if let Some(key) = self.check(style) {
            self.stroke_styles.remove(key);
        }
    }

    fn create_text_format(
        &mut self,
        desc: &TextFormatDesc,
    ) -> Result<TextFormatHandle, SurfaceError> {
        if !(desc.size.is_finite() && desc.size > 0.0) {
            return Err(SurfaceError::InvalidResource(format!(
                "invalid font size {}",
                desc.size
            )));
        }
        let key = self.text_formats.insert(desc.clone());
        Ok(Handle::new(key, self.generation))
    }

    fn release_text_format(&mut self, format: TextFormatHandle) {
        if let Some(key) = self.check(format) {
            self.text_formats.remove(key);
        }
    }

    // ── drawing ───────────────────────────────────────────────────────────

    fn fill_geometry(&mut self, geometry: GeometryHandle, brush: BrushHandle) {
        let Some(key) = self.check(geometry) else { return };
        let Some((paint, scissor)) = self.target(brush) else { return };
        let tol = self.tolerance;
        let Some(entry) = self.geometries.get_mut(key) else { return };
        let mesh = entry
            .fill
            .get_or_insert_with(|| tessellate::fill(&entry.polylines, tol));
        self.batch.push_mesh(mesh, self.transform, &paint, scissor);
    }

    fn draw_geometry(
        &mut self,
        geometry: GeometryHandle,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let Some(key) = self.check(geometry) else { return };
        let Some((paint, scissor)) = self.target(brush) else { return };
        let desc = self.stroke_desc(style);
        let stroke_key = StrokeKey {
            width_bits: width.to_bits(),
            style: style.and_then(|s| self.check(s)),
        };
        let tol = self.tolerance;
        let Some(entry) = self.geometries.get_mut(key) else { return };
        if entry.stroke.as_ref().is_none_or(|(k, _)| *k != stroke_key) {
            let mesh = tessellate::stroke(&entry.polylines, width, &desc, tol);
            entry.stroke = Some((stroke_key, mesh));
        }
        if let Some((_, mesh)) = &entry.stroke {
            self.batch.push_mesh(mesh, self.transform, &paint, scissor);
        }
    }

    fn fill_rect(&mut self, rect: Rect, brush: BrushHandle) {
        self.emit(brush, |_| Mesh::quad(rect));
    }

    fn draw_rect(
        &mut self,
        rect: Rect,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        self.stroke_path(PathData::rect(rect), brush, width, style);
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: Vec2, brush: BrushHandle) {
        self.fill_path(PathData::rounded_rect(rect, radius.x, radius.y), brush);
    }

    fn draw_rounded_rect(
        &mut self,
        rect: Rect,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        self.stroke_path(PathData::rounded_rect(rect, radius.x, radius.y), brush, width, style);
    }

    fn fill_ellipse(&mut self, center: Vec2, radius: Vec2, brush: BrushHandle) {
        self.fill_path(PathData::ellipse(center, radius.x, radius.y), brush);
    }

    fn draw_ellipse(
        &mut self,
        center: Vec2,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        self.stroke_path(PathData::ellipse(center, radius.x, radius.y), brush, width, style);
    }

    fn draw_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        self.stroke_path(PathData::line(from, to), brush, width, style);
    }

    fn draw_text(&mut self, text: &str, format: TextFormatHandle, rect: Rect, brush: BrushHandle) {
        let Some((paint, scissor)) = self.target(brush) else { return };
        let Some(key) = self.check(format) else { return };
        let Some(desc) = self.text_formats.get(key) else { return };
        let Some(font) = self
            .fonts
            .resolve(&desc.family, desc.weight, desc.style)
            .and_then(|id| self.fonts.get(id))
        else {
            log::debug!("no font face for family {:?}; text skipped", desc.family);
            return;
        };

        let placed =
            glyphs::layout_text(&mut self.layout, font, text, desc.size, rect, desc.alignment);
        let paint = paint.glyph();
        for g in placed {
            if let Some(entry) = self.atlas.glyph(self.context.queue(), font, g.key) {
                self.batch
                    .push_glyph(g.rect, &entry, self.transform, &paint, scissor);
            }
        }
    }

    fn measure_text(
        &self,
        text: &str,
        format: TextFormatHandle,
        max_width: Option<f32>,
    ) -> Option<Vec2> {
        let desc = self.text_formats.get(self.check(format)?)?;
        let id = self.fonts.resolve(&desc.family, desc.weight, desc.style)?;
        Some(self.fonts.measure_text(text, id, desc.size, max_width))
    }

    // ── scopes ────────────────────────────────────────────────────────────

    fn push_layer(&mut self, opacity: f32, bounds: Option<Rect>) {
        let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 0.0 };
        let clipped = bounds.is_some();
        if let Some(b) = bounds {
            self.push_clip(b);
        }
        self.layers.push(Layer {
            alpha: self.layer_alpha() * opacity,
            clipped,
        });
    }

    fn pop_layer(&mut self) {
        if let Some(layer) = self.layers.pop() {
            if layer.clipped {
                self.pop_clip();
            }
        }
    }

    fn push_clip(&mut self, rect: Rect) {
        let device = if rect.is_finite() {
            self.transform.transform_rect_bounds(rect)
        } else {
            Rect::default()
        };
        let clip = match self.clips.last() {
            Some(current) => current.intersect(device).unwrap_or_default(),
            None => device,
        };
        self.clips.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}
