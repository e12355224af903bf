use crate::coords::SurfaceSize;
use crate::device::{Generation, RenderSurface};
use crate::lifecycle::SurfaceLifecycle;

/// Read-only facts about the live surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SurfaceInfo {
    pub generation: Generation,
    pub size: SurfaceSize,
}

/// The canvas's lifecycle component. Holds no resources, only what the
/// canvas reports through [`Canvas::surface_info`](super::Canvas::surface_info).
#[derive(Debug, Default)]
pub struct CanvasState {
    info: Option<SurfaceInfo>,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn info(&self) -> Option<SurfaceInfo> {
        self.info
    }

    /// Tracks a resize of the live surface.
    pub fn set_size(&mut self, size: SurfaceSize) {
        if let Some(info) = &mut self.info {
            info.size = size;
        }
    }
}

impl SurfaceLifecycle for CanvasState {
    fn on_surface_changed(&mut self, surface: &dyn RenderSurface) {
        self.info = Some(SurfaceInfo {
            generation: surface.generation(),
            size: surface.size(),
        });
    }

    fn on_surface_lost(&mut self) {
        self.info = None;
    }
}
