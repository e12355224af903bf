use crate::coords::{Rect, SurfaceSize, Transform, Vec2};
use crate::geometry::PathData;
use crate::paint::{Color, LinearGradient, RadialGradient, StrokeStyleDesc};
use crate::text::TextFormatDesc;

use super::{
    BrushHandle, EndDrawStatus, Generation, GeometryHandle, StrokeStyleHandle, SurfaceError,
    TextFormatHandle,
};

/// A live drawable target together with its resource factory.
///
/// Every resource a surface hands out carries the surface's [`Generation`].
/// Drawing with a handle from another generation, or with one that has been
/// released, does nothing. Draw calls outside a `begin_draw`/`end_draw`
/// bracket do nothing either.
///
/// Coordinates are surface pixels, origin top-left, +Y down. Every draw call
/// is affected by the current [`transform`](Self::transform).
pub trait RenderSurface {
    fn generation(&self) -> Generation;
    fn size(&self) -> SurfaceSize;
    fn resize(&mut self, size: SurfaceSize) -> Result<(), SurfaceError>;

    // ── frame ─────────────────────────────────────────────────────────────

    fn begin_draw(&mut self);
    fn end_draw(&mut self) -> EndDrawStatus;
    fn clear(&mut self, color: Color);

    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    // ── resources ─────────────────────────────────────────────────────────

    fn create_solid_brush(&mut self, color: Color) -> Result<BrushHandle, SurfaceError>;
    /// Re-targets an existing solid brush. Ignored for gradient brushes.
    fn set_solid_brush_color(&mut self, brush: BrushHandle, color: Color);
    fn create_linear_gradient_brush(
        &mut self,
        gradient: &LinearGradient,
    ) -> Result<BrushHandle, SurfaceError>;
    fn create_radial_gradient_brush(
        &mut self,
        gradient: &RadialGradient,
    ) -> Result<BrushHandle, SurfaceError>;
    fn set_brush_opacity(&mut self, brush: BrushHandle, opacity: f32);
    fn release_brush(&mut self, brush: BrushHandle);

    fn create_geometry(&mut self, path: &PathData) -> Result<GeometryHandle, SurfaceError>;
    fn release_geometry(&mut self, geometry: GeometryHandle);

    fn create_stroke_style(
        &mut self,
        desc: &StrokeStyleDesc,
    ) -> Result<StrokeStyleHandle, SurfaceError>;
    fn release_stroke_style(&mut self, style: StrokeStyleHandle);
    fn create_text_format(&mut self, desc: &TextFormatDesc)
    -> Result<TextFormatHandle, SurfaceError>;
    fn release_text_format(&mut self, format: TextFormatHandle);

    // ── drawing ───────────────────────────────────────────────────────────

    fn fill_geometry(&mut self, geometry: GeometryHandle, brush: BrushHandle);
    fn draw_geometry(
        &mut self,
        geometry: GeometryHandle,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    );

    fn fill_rect(&mut self, rect: Rect, brush: BrushHandle);
    fn draw_rect(
        &mut self,
        rect: Rect,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    );

    fn fill_rounded_rect(&mut self, rect: Rect, radius: Vec2, brush: BrushHandle);
    fn draw_rounded_rect(
        &mut self,
        rect: Rect,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    );

    fn fill_ellipse(&mut self, center: Vec2, radius: Vec2, brush: BrushHandle);
    fn draw_ellipse(
        &mut self,
        center: Vec2,
        radius: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    );

    fn draw_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        brush: BrushHandle,
        width: f32,
        style: Option<StrokeStyleHandle>,
    );

    /// Lays `text` out inside `rect` (wrapping at its width) and fills it.
    fn draw_text(&mut self, text: &str, format: TextFormatHandle, rect: Rect, brush: BrushHandle);
    /// Laid-out size of `text`, or `None` when the format is unknown.
    fn measure_text(
        &self,
        text: &str,
        format: TextFormatHandle,
        max_width: Option<f32>,
    ) -> Option<Vec2>;

    // ── scopes ────────────────────────────────────────────────────────────

    /// Starts an opacity group. `bounds` limits the affected area when given.
    fn push_layer(&mut self, opacity: f32, bounds: Option<Rect>);
    fn pop_layer(&mut self);
    /// Intersects the clip with `rect`, mapped through the current transform.
    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);
}

/// Platform side of the engine: knows how to build surfaces.
pub trait SurfaceProvider {
    type Surface: RenderSurface + 'static;

    /// Creates the platform drawing-system handles. Called once by
    /// [`RenderEngine::initialize`](crate::engine::RenderEngine::initialize).
    fn initialize(&mut self) -> anyhow::Result<()>;

    /// Current size of the drawable area in physical pixels.
    fn drawable_size(&self) -> SurfaceSize;

    fn create_surface(
        &mut self,
        generation: Generation,
        size: SurfaceSize,
    ) -> Result<Self::Surface, SurfaceError>;
}
