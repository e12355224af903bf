use std::cell::Cell;

use crate::device::{BrushHandle, Generation, RenderSurface};
use crate::geometry::GeometryBuilder;
use crate::lifecycle::SurfaceSlot;
use crate::paint::{Brush, Color, Paint};
use crate::resources::ResourceCache;

/// Renderer-facing context: the live surface plus shared services.
///
/// Built per call by the canvas; renderers never store it.
pub struct RenderCtx<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub resources: &'a ResourceCache,
    pub geometry: &'a GeometryBuilder,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        surface: &'a mut dyn RenderSurface,
        resources: &'a ResourceCache,
        geometry: &'a GeometryBuilder,
    ) -> Self {
        Self {
            surface,
            resources,
            geometry,
        }
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.surface.generation()
    }

    pub fn brush(&mut self, brush: &Brush, global_alpha: f32) -> Option<BrushHandle> {
        self.resources.brush(&mut *self.surface, brush, global_alpha)
    }

    /// The paint's brush with its effective alpha applied.
    pub fn paint_brush(&mut self, paint: &Paint) -> Option<BrushHandle> {
        self.resources.brush(&mut *self.surface, &paint.brush, paint.effective_alpha())
    }

    pub fn solid(&mut self, color: Color) -> Option<BrushHandle> {
        self.resources.brush(&mut *self.surface, &Brush::Solid(color), 1.0)
    }
}

/// Surface attachment for renderers whose methods take `&self`.
#[derive(Debug, Default)]
pub(crate) struct Attachment(Cell<SurfaceSlot>);

impl Attachment {
    pub fn attach(&mut self, generation: Generation) {
        self.0.get_mut().attach(generation);
    }

    pub fn detach(&mut self) {
        self.0.get_mut().detach();
    }

    /// False while dormant. When `generation` differs from the attached one,
    /// `flush` runs and the new generation is adopted.
    pub fn sync(&self, generation: Generation, owner: &str, flush: impl FnOnce()) -> bool {
        let mut slot = self.0.get();
        match slot.generation() {
            None => false,
            Some(live) if live == generation => true,
            Some(live) => {
                log::warn!("{owner} saw surface {generation} while attached to {live}; flushing");
                flush();
                slot.attach(generation);
                self.0.set(slot);
                true
            }
        }
    }
}
