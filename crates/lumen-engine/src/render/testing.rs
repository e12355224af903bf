//! Test fixture: one recording surface with a live resource cache.

use crate::coords::SurfaceSize;
use crate::device::{
    Generation, RecordingControl, RecordingProvider, RecordingSurface, SurfaceProvider,
};
use crate::geometry::GeometryBuilder;
use crate::lifecycle::SurfaceLifecycle;
use crate::resources::ResourceCache;

use super::RenderCtx;

pub(crate) struct Harness {
    pub surface: RecordingSurface,
    pub control: RecordingControl,
    pub resources: ResourceCache,
    pub geometry: GeometryBuilder,
}

impl Harness {
    pub fn new() -> Self {
        let mut provider = RecordingProvider::new(SurfaceSize::new(200, 200));
        let control = provider.control();
        let surface = provider
            .create_surface(Generation(1), SurfaceSize::new(200, 200))
            .expect("recording surface");
        let mut resources = ResourceCache::default();
        resources.on_surface_changed(&surface);
        Self {
            surface,
            control,
            resources,
            geometry: GeometryBuilder::new(),
        }
    }

    pub fn attach(&self, component: &mut dyn SurfaceLifecycle) {
        component.on_surface_changed(&self.surface);
    }

    /// Runs `f` inside one begin/end bracket.
    pub fn frame(&mut self, f: impl FnOnce(&mut RenderCtx<'_>)) {
        use crate::device::RenderSurface;

        self.surface.begin_draw();
        {
            let mut ctx = RenderCtx::new(&mut self.surface, &self.resources, &self.geometry);
            f(&mut ctx);
        }
        self.surface.end_draw();
    }
}
