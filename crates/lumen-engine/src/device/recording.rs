//! Headless backend that records draw commands.
//!
//! Every surface created by a [`RecordingProvider`] appends to the command log
//! of a shared [`RecordingControl`]. The control also injects faults (device
//! loss, failed resizes, refused resources) so the lifecycle can be exercised
//! without a GPU.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::coords::{Rect, SurfaceSize, Transform, Vec2};
use crate::geometry::PathData;
use crate::paint::{Brush, Color, LinearGradient, RadialGradient, StrokeStyleDesc};
use crate::text::{FontSystem, TextFormatDesc};

use super::{
    BrushHandle, BrushKey, EndDrawStatus, Generation, GeometryHandle, GeometryKey, Handle,
    RenderSurface, StrokeStyleHandle, StrokeStyleKey, SurfaceError, SurfaceProvider,
    TextFormatHandle, TextFormatKey,
};

/// Brush as it was when a command was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushState {
    pub handle: BrushHandle,
    pub brush: Brush,
    pub opacity: f32,
}

/// Stroke parameters as recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeState {
    pub width: f32,
    pub style: Option<StrokeStyleDesc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginDraw,
    EndDraw,
    Clear(Color),
    SetTransform(Transform),
    FillGeometry {
        geometry: GeometryHandle,
        path: PathData,
        brush: BrushState,
    },
    DrawGeometry {
        geometry: GeometryHandle,
        path: PathData,
        brush: BrushState,
        stroke: StrokeState,
    },
    FillRect {
        rect: Rect,
        brush: BrushState,
    },
    DrawRect {
        rect: Rect,
        brush: BrushState,
        stroke: StrokeState,
    },
    FillRoundedRect {
        rect: Rect,
        radius: Vec2,
        brush: BrushState,
    },
    DrawRoundedRect {
        rect: Rect,
        radius: Vec2,
        brush: BrushState,
        stroke: StrokeState,
    },
    FillEllipse {
        center: Vec2,
        radius: Vec2,
        brush: BrushState,
    },
    DrawEllipse {
        center: Vec2,
        radius: Vec2,
        brush: BrushState,
        stroke: StrokeState,
    },
    DrawLine {
        from: Vec2,
        to: Vec2,
        brush: BrushState,
        stroke: StrokeState,
    },
    DrawText {
        text: String,
        format: TextFormatDesc,
        rect: Rect,
        brush: BrushState,
    },
    PushLayer {
        opacity: f32,
        bounds: Option<Rect>,
    },
    PopLayer,
    PushClip(Rect),
    PopClip,
}

impl DrawCommand {
    /// True for commands that put pixels on the target.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DrawCommand::FillGeometry { .. }
                | DrawCommand::DrawGeometry { .. }
                | DrawCommand::FillRect { .. }
                | DrawCommand::DrawRect { .. }
                | DrawCommand::FillRoundedRect { .. }
                | DrawCommand::DrawRoundedRect { .. }
                | DrawCommand::FillEllipse { .. }
                | DrawCommand::DrawEllipse { .. }
                | DrawCommand::DrawLine { .. }
                | DrawCommand::DrawText { .. }
        )
    }

    /// Brush used by a drawing command.
    pub fn brush(&self) -> Option<&BrushState> {
        match self {
            DrawCommand::FillGeometry { brush, .. }
            | DrawCommand::DrawGeometry { brush, .. }
            | DrawCommand::FillRect { brush, .. }
            | DrawCommand::DrawRect { brush, .. }
            | DrawCommand::FillRoundedRect { brush, .. }
            | DrawCommand::DrawRoundedRect { brush, .. }
            | DrawCommand::FillEllipse { brush, .. }
            | DrawCommand::DrawEllipse { brush, .. }
            | DrawCommand::DrawLine { brush, .. }
            | DrawCommand::DrawText { brush, .. } => Some(brush),
            _ => None,
        }
    }
}

/// Creation and release counters, summed over every surface of a provider.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RecordingStats {
    pub surfaces_created: u32,
    pub brushes_created: u32,
    pub brushes_released: u32,
    pub geometries_created: u32,
    pub geometries_released: u32,
    pub stroke_styles_created: u32,
    pub stroke_styles_released: u32,
    pub text_formats_created: u32,
    pub text_formats_released: u32,
    pub frames_presented: u32,
    pub resizes: u32,
}

#[derive(Debug, Default)]
struct Faults {
    fail_initialize: bool,
    fail_surface_creation: u32,
    recreate_on_end_draw: u32,
    fail_end_draw: u32,
    fail_resize: bool,
    fail_resources: bool,
}

#[derive(Debug, Default)]
struct ControlState {
    commands: Vec<DrawCommand>,
    stats: RecordingStats,
    faults: Faults,
    drawable_size: SurfaceSize,
}

/// Shared view into a recording provider and all of its surfaces.
///
/// Cloning is cheap; every clone observes the same state.
#[derive(Debug, Clone, Default)]
pub struct RecordingControl {
    state: Rc<RefCell<ControlState>>,
}

impl RecordingControl {
    // ── inspection ────────────────────────────────────────────────────────

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.state.borrow().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Commands that put pixels on the target, in order.
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.is_draw())
            .cloned()
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.state.borrow().commands.iter().filter(|c| c.is_draw()).count()
    }

    pub fn stats(&self) -> RecordingStats {
        self.state.borrow().stats
    }

    // ── fault injection ───────────────────────────────────────────────────

    pub fn set_drawable_size(&self, size: SurfaceSize) {
        self.state.borrow_mut().drawable_size = size;
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.state.borrow_mut().faults.fail_initialize = fail;
    }

    /// The next `count` surface creations fail.
    pub fn fail_surface_creation(&self, count: u32) {
        self.state.borrow_mut().faults.fail_surface_creation = count;
    }

    /// The next `count` frames end with [`EndDrawStatus::RecreateTarget`].
    pub fn lose_device_on_end_draw(&self, count: u32) {
        self.state.borrow_mut().faults.recreate_on_end_draw = count;
    }

    /// The next `count` frames end with a non-fatal failure.
    pub fn fail_end_draw(&self, count: u32) {
        self.state.borrow_mut().faults.fail_end_draw = count;
    }

    pub fn fail_resize(&self, fail: bool) {
        self.state.borrow_mut().faults.fail_resize = fail;
    }

    /// While set, every `create_*` call returns an error.
    pub fn fail_resource_creation(&self, fail: bool) {
        self.state.borrow_mut().faults.fail_resources = fail;
    }

    // ── surface side ──────────────────────────────────────────────────────

    fn record(&self, cmd: DrawCommand) {
        self.state.borrow_mut().commands.push(cmd);
    }

    fn stats_mut(&self, f: impl FnOnce(&mut RecordingStats)) {
        f(&mut self.state.borrow_mut().stats);
    }

    fn resources_refused(&self) -> bool {
        self.state.borrow().faults.fail_resources
    }

    fn take_fault(counter: &mut u32) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }
}

/// Provider producing [`RecordingSurface`]s.
pub struct RecordingProvider {
    control: RecordingControl,
    fonts: Option<Rc<FontSystem>>,
    initialized: bool,
}

impl RecordingProvider {
    pub fn new(size: SurfaceSize) -> Self {
        let control = RecordingControl::default();
        control.set_drawable_size(size);
        Self {
            control,
            fonts: None,
            initialized: false,
        }
    }

    /// Real text measurement through `fonts` instead of the fixed-advance estimate.
    pub fn with_fonts(mut self, fonts: Rc<FontSystem>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn control(&self) -> RecordingControl {
        self.control.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl SurfaceProvider for RecordingProvider {
    type Surface = RecordingSurface;

    fn initialize(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.control.state.borrow().faults.fail_initialize,
            "recording provider initialization refused"
        );
        self.initialized = true;
        Ok(())
    }

    fn drawable_size(&self) -> SurfaceSize {
        self.control.state.borrow().drawable_size
    }

    fn create_surface(
        &mut self,
        generation: Generation,
        size: SurfaceSize,
    ) -> Result<RecordingSurface, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::EmptySize);
        }
        {
            let mut state = self.control.state.borrow_mut();
            if RecordingControl::take_fault(&mut state.faults.fail_surface_creation) {
                return Err(SurfaceError::Backend("surface creation refused".into()));
            }
            state.stats.surfaces_created += 1;
        }
        Ok(RecordingSurface::new(
            self.control.clone(),
            generation,
            size,
            self.fonts.clone(),
        ))
    }
}

struct BrushEntry {
    brush: Brush,
    opacity: f32,
}

/// Surface that appends every call to its control's command log.
pub struct RecordingSurface {
    control: RecordingControl,
    generation: Generation,
    size: SurfaceSize,
    transform: Transform,
    drawing: bool,
    fonts: Option<Rc<FontSystem>>,
    brushes: SlotMap<BrushKey, BrushEntry>,
    geometries: SlotMap<GeometryKey, PathData>,
    stroke_styles: SlotMap<StrokeStyleKey, StrokeStyleDesc>,
    text_formats: SlotMap<TextFormatKey, TextFormatDesc>,
}

impl RecordingSurface {
    pub fn new(
        control: RecordingControl,
        generation: Generation,
        size: SurfaceSize,
        fonts: Option<Rc<FontSystem>>,
    ) -> Self {
        Self {
            control,
            generation,
            size,
            transform: Transform::identity(),
            drawing: false,
            fonts,
            brushes: SlotMap::with_key(),
            geometries: SlotMap::with_key(),
            stroke_styles: SlotMap::with_key(),
            text_formats: SlotMap::with_key(),
        }
    }

    pub fn control(&self) -> &RecordingControl {
        &self.control
    }

    pub fn live_brushes(&self) -> usize {
        self.brushes.len()
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    fn refuse_if_faulted(&self) -> Result<(), SurfaceError> {
        if self.control.resources_refused() {
            Err(SurfaceError::Backend("resource creation refused".into()))
        } else {
            Ok(())
        }
    }

    fn check<K: slotmap::Key>(&self, handle: Handle<K>) -> Option<K> {
        handle.belongs_to(self.generation).then(|| handle.key())
    }

    fn brush_state(&self, handle: BrushHandle) -> Option<BrushState> {
        let entry = self.brushes.get(self.check(handle)?)?;
        Some(BrushState {
            handle,
            brush: entry.brush.clone(),
            opacity: entry.opacity,
        })
    }

    fn path(&self, handle: GeometryHandle) -> Option<PathData> {
        self.geometries.get(self.check(handle)?).cloned()
    }

    fn stroke_state(&self, width: f32, style: Option<StrokeStyleHandle>) -> StrokeState {
        StrokeState {
            width,
            style: style
                .and_then(|s| self.check(s))
                .and_then(|k| self.stroke_styles.get(k))
                .cloned(),
        }
    }

    /// Records a draw command when a frame is open and the brush is live.
    fn draw(&self, brush: BrushHandle, build: impl FnOnce(BrushState) -> Option<DrawCommand>) {
        if !self.drawing {
            log::debug!("draw call outside of a frame ignored");
            return;
        }
        let Some(state) = self.brush_state(brush) else {
            log::debug!("draw call with a dead brush ignored");
            return;
        };
        if let Some(cmd) = build(state) {
            self.control.record(cmd);
        }
    }

    fn approximate_text_size(text: &str, size: f32, max_width: Option<f32>) -> Vec2 {
        let line_h = size * 1.2;
        let w = text.chars().count() as f32 * size * 0.5;
        match max_width {
            Some(max) if max > 0.0 && w > max => {
                let lines = (w / max).ceil();
                Vec2::new(max, line_h * lines)
            }
            _ => Vec2::new(w, line_h),
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), SurfaceError> {
        let mut state = self.control.state.borrow_mut();
        if state.faults.fail_resize {
            return Err(SurfaceError::Backend("resize refused".into()));
        }
        if size.is_empty() {
            return Err(SurfaceError::EmptySize);
        }
        state.stats.resizes += 1;
        state.drawable_size = size;
        self.size = size;
        Ok(())
    }

    fn begin_draw(&mut self) {
        self.drawing = true;
        self.control.record(DrawCommand::BeginDraw);
    }

    fn end_draw(&mut self) -> EndDrawStatus {
        self.drawing = false;
        self.control.record(DrawCommand::EndDraw);
        let mut state = self.control.state.borrow_mut();
        if RecordingControl::take_fault(&mut state.faults.recreate_on_end_draw) {
            return EndDrawStatus::RecreateTarget;
        }
        if RecordingControl::take_fault(&mut state.faults.fail_end_draw) {
            return EndDrawStatus::Failed(SurfaceError::Backend("present failed".into()));
        }
        state.stats.frames_presented += 1;
        EndDrawStatus::Ok
    }

    fn clear(&mut self, color: Color) {
        if self.drawing {
            self.control.record(DrawCommand::Clear(color));
        }
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.control.record(DrawCommand::SetTransform(transform));
    }

    fn create_solid_brush(&mut self, color: Color) -> Result<BrushHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        let key = self.brushes.insert(BrushEntry {
            brush: Brush::Solid(color),
            opacity: 1.0,
        });
        self.control.stats_mut(|s| s.brushes_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn set_solid_brush_color(&mut self, brush: BrushHandle, color: Color) {
        let Some(key) = self.check(brush) else { return };
        if let Some(entry) = self.brushes.get_mut(key) {
            if let Brush::Solid(c) = &mut entry.brush {
                *c = color;
            }
        }
    }

    fn create_linear_gradient_brush(
        &mut self,
        gradient: &LinearGradient,
    ) -> Result<BrushHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        if !gradient.is_valid() {
            return Err(SurfaceError::InvalidResource("linear gradient".into()));
        }
        let key = self.brushes.insert(BrushEntry {
            brush: Brush::Linear(gradient.clone()),
            opacity: 1.0,
        });
        self.control.stats_mut(|s| s.brushes_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn create_radial_gradient_brush(
        &mut self,
        gradient: &RadialGradient,
    ) -> Result<BrushHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        if !gradient.is_valid() {
            return Err(SurfaceError::InvalidResource("radial gradient".into()));
        }
        let key = self.brushes.insert(BrushEntry {
            brush: Brush::Radial(gradient.clone()),
            opacity: 1.0,
        });
        self.control.stats_mut(|s| s.brushes_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn set_brush_opacity(&mut self, brush: BrushHandle, opacity: f32) {
        let Some(key) = self.check(brush) else { return };
        if let Some(entry) = self.brushes.get_mut(key) {
            entry.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn release_brush(&mut self, brush: BrushHandle) {
        let Some(key) = self.check(brush) else { return };
        if self.brushes.remove(key).is_some() {
            self.control.stats_mut(|s| s.brushes_released += 1);
        }
    }

    fn create_geometry(&mut self, path: &PathData) -> Result<GeometryHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        if path.is_empty() {
            return Err(SurfaceError::InvalidResource("empty path".into()));
        }
        let key = self.geometries.insert(path.clone());
        self.control.stats_mut(|s| s.geometries_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn release_geometry(&mut self, geometry: GeometryHandle) {
        let Some(key) = self.check(geometry) else { return };
        if self.geometries.remove(key).is_some() {
            self.control.stats_mut(|s| s.geometries_released += 1);
        }
    }

    fn create_stroke_style(
        &mut self,
        desc: &StrokeStyleDesc,
    ) -> Result<StrokeStyleHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        let key = self.stroke_styles.insert(desc.clone());
        self.control.stats_mut(|s| s.stroke_styles_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn release_stroke_style(&mut self, style: StrokeStyleHandle) {
        let Some(key) = self.check(style) else { return };
        if self.stroke_styles.remove(key).is_some() {
            self.control.stats_mut(|s| s.stroke_styles_released += 1);
        }
    }

    fn create_text_format(
        &mut self,
        desc: &TextFormatDesc,
    ) -> Result<TextFormatHandle, SurfaceError> {
        self.refuse_if_faulted()?;
        if !(desc.size.is_finite() && desc.size > 0.0) {
            return Err(SurfaceError::InvalidResource(format!("font size {}", desc.size)));
        }
        let key = self.text_formats.insert(desc.clone());
        self.control.stats_mut(|s| s.text_formats_created += 1);
        Ok(Handle::new(key, self.generation))
    }

    fn release_text_format(&mut self, format: TextFormatHandle) {
        let Some(key) = self.check(format) else { return };
        if self.text_formats.remove(key).is_some() {
            self.control.stats_mut(|s| s.text_formats_released += 1);
        }
    }

    fn fill_geometry(&mut self, geometry: GeometryHandle, brush: BrushHandle) {
        let Some(path) = self.path(geometry) else { return };
        self.draw(brush, |brush| {
            Some(DrawCommand::FillGeometry { geometry, path, brush })
        });
    }

    fn draw_geometry(
        &mut self,
        geometry: GeometryHandle,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let Some(path) = self.path(geometry) else { return };
        let stroke = self.stroke_state(width, style);
        self.draw(brush, |brush| {
            Some(DrawCommand::DrawGeometry { geometry, path, brush, stroke })
        });
    }

    fn fill_rect(&mut self, rect: Rect, brush: BrushHandle) {
        self.draw(brush, |brush| Some(DrawCommand::FillRect { rect, brush }));
    }

    fn draw_rect(
        &mut self,
        rect: Rect,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let stroke = self.stroke_state(width, style);
        self.draw(brush, |brush| Some(DrawCommand::DrawRect { rect, brush, stroke }));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: Vec2, brush: BrushHandle) {
        self.draw(brush, |brush| {
            Some(DrawCommand::FillRoundedRect { rect, radius, brush })
        });
    }

    fn draw_rounded_rect(
        &mut self,
        rect: Rect,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let stroke = self.stroke_state(width, style);
        self.draw(brush, |brush| {
            Some(DrawCommand::DrawRoundedRect { rect, radius, brush, stroke })
        });
    }

    fn fill_ellipse(&mut self, center: Vec2, radius: Vec2, brush: BrushHandle) {
        self.draw(brush, |brush| {
            Some(DrawCommand::FillEllipse { center, radius, brush })
        });
    }

    fn draw_ellipse(
        &mut self,
        center: Vec2,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let stroke = self.stroke_state(width, style);
        self.draw(brush, |brush| {
            Some(DrawCommand::DrawEllipse { center, radius, brush, stroke })
        });
    }

    fn draw_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    ) {
        let stroke = self.stroke_state(width, style);
        self.draw(brush, |brush| Some(DrawCommand::DrawLine { from, to, brush, stroke }));
    }

    fn draw_text(&mut self, text: &str, format: TextFormatHandle, rect: Rect, brush: BrushHandle) {
        let Some(format) = self.check(format).and_then(|k| self.text_formats.get(k)).cloned()
        else {
            return;
        };
        self.draw(brush, |brush| {
            Some(DrawCommand::DrawText {
                text: text.to_string(),
                format,
                rect,
                brush,
            })
        });
    }

    fn measure_text(
        &self,
        text: &str,
        format: TextFormatHandle,
        max_width: Option<f32>,
    ) -> Option<Vec2> {
        let desc = self.text_formats.get(self.check(format)?)?;
        let measured = self.fonts.as_ref().and_then(|fonts| {
            let id = fonts.resolve(&desc.family, desc.weight, desc.style)?;
            Some(fonts.measure_text(text, id, desc.size, max_width))
        });
        Some(measured.unwrap_or_else(|| Self::approximate_text_size(text, desc.size, max_width)))
    }

    fn push_layer(&mut self, opacity: f32, bounds: Option<Rect>) {
        self.control.record(DrawCommand::PushLayer { opacity, bounds });
    }

    fn pop_layer(&mut self) {
        self.control.record(DrawCommand::PopLayer);
    }

    fn push_clip(&mut self, rect: Rect) {
        self.control.record(DrawCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.control.record(DrawCommand::PopClip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> (RecordingSurface, RecordingControl) {
        let mut provider = RecordingProvider::new(SurfaceSize::new(64, 64));
        let control = provider.control();
        let surface = provider
            .create_surface(Generation(1), SurfaceSize::new(64, 64))
            .unwrap();
        (surface, control)
    }

    #[test]
    fn draws_outside_a_frame_are_ignored() {
        let (mut s, control) = surface();
        let brush = s.create_solid_brush(Color::WHITE).unwrap();
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), brush);
        assert_eq!(control.draw_count(), 0);

        s.begin_draw();
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), brush);
        assert_eq!(s.end_draw(), EndDrawStatus::Ok);
        assert_eq!(control.draw_count(), 1);
    }

    #[test]
    fn handles_from_other_generations_do_nothing() {
        let (mut s, control) = surface();
        let brush = s.create_solid_brush(Color::WHITE).unwrap();
        let foreign = BrushHandle::new(brush.key(), Generation(7));

        s.begin_draw();
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), foreign);
        s.release_brush(foreign);
        s.end_draw();

        assert_eq!(control.draw_count(), 0);
        assert_eq!(s.live_brushes(), 1);
    }

    #[test]
    fn released_geometry_cannot_be_drawn() {
        let (mut s, control) = surface();
        let brush = s.create_solid_brush(Color::WHITE).unwrap();
        let geom = s.create_geometry(&PathData::rect(Rect::new(0.0, 0.0, 2.0, 2.0))).unwrap();
        s.release_geometry(geom);

        s.begin_draw();
        s.fill_geometry(geom, brush);
        s.end_draw();

        assert_eq!(control.draw_count(), 0);
        assert_eq!(control.stats().geometries_released, 1);
    }

    #[test]
    fn solid_brush_color_is_recorded_at_draw_time() {
        let (mut s, control) = surface();
        let brush = s.create_solid_brush(Color::WHITE).unwrap();
        s.begin_draw();
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), brush);
        s.set_solid_brush_color(brush, Color::BLACK);
        s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), brush);
        s.end_draw();

        let colors: Vec<Brush> = control
            .draw_commands()
            .iter()
            .filter_map(|c| c.brush().map(|b| b.brush.clone()))
            .collect();
        assert_eq!(colors, vec![Brush::Solid(Color::WHITE), Brush::Solid(Color::BLACK)]);
    }

    // ── fault injection ───────────────────────────────────────────────────

    #[test]
    fn end_draw_faults_are_consumed_in_order() {
        let (mut s, control) = surface();
        control.lose_device_on_end_draw(1);
        control.fail_end_draw(1);

        s.begin_draw();
        assert_eq!(s.end_draw(), EndDrawStatus::RecreateTarget);
        s.begin_draw();
        assert!(matches!(s.end_draw(), EndDrawStatus::Failed(_)));
        s.begin_draw();
        assert_eq!(s.end_draw(), EndDrawStatus::Ok);
        assert_eq!(control.stats().frames_presented, 1);
    }

    #[test]
    fn refused_resources_report_errors() {
        let (mut s, control) = surface();
        control.fail_resource_creation(true);
        assert!(s.create_solid_brush(Color::WHITE).is_err());
        assert!(s.create_stroke_style(&StrokeStyleDesc::default()).is_err());
        control.fail_resource_creation(false);
        assert!(s.create_solid_brush(Color::WHITE).is_ok());
    }

    #[test]
    fn provider_faults() {
        let mut provider = RecordingProvider::new(SurfaceSize::new(8, 8));
        let control = provider.control();
        control.fail_initialize(true);
        assert!(provider.initialize().is_err());
        control.fail_initialize(false);
        assert!(provider.initialize().is_ok());

        control.fail_surface_creation(1);
        assert!(provider.create_surface(Generation(1), SurfaceSize::new(8, 8)).is_err());
        assert!(provider.create_surface(Generation(2), SurfaceSize::new(8, 8)).is_ok());
        assert!(matches!(
            provider.create_surface(Generation(3), SurfaceSize::new(0, 8)),
            Err(SurfaceError::EmptySize)
        ));
    }

    #[test]
    fn text_measure_estimate_wraps() {
        let (mut s, _) = surface();
        let format = s
            .create_text_format(&TextFormatDesc {
                family: "Mono".into(),
                size: 10.0,
                weight: Default::default(),
                style: Default::default(),
                stretch: Default::default(),
                alignment: Default::default(),
            })
            .unwrap();
        assert_eq!(s.measure_text("abcd", format, None), Some(Vec2::new(20.0, 12.0)));
        assert_eq!(s.measure_text("abcd", format, Some(10.0)), Some(Vec2::new(10.0, 24.0)));
    }
}
