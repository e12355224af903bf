use crate::canvas::Canvas;
use crate::device::SurfaceProvider;
use crate::paint::Color;

use super::{FrameOutcome, RenderEngine};

/// An open frame. Ends the frame when dropped.
///
/// Use [`end`](Self::end) to observe the outcome; a dropped frame logs
/// nothing beyond what the engine already logs.
pub struct Frame<'e, P: SurfaceProvider> {
    engine: &'e mut RenderEngine<P>,
    ended: bool,
}

impl<'e, P: SurfaceProvider> Frame<'e, P> {
    pub(super) fn new(engine: &'e mut RenderEngine<P>) -> Self {
        Self { engine, ended: false }
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        self.engine.canvas()
    }

    pub fn clear(&mut self, color: Color) {
        self.engine.clear(color);
    }

    pub fn end(mut self) -> FrameOutcome {
        self.ended = true;
        self.engine.end_draw()
    }
}

impl<P: SurfaceProvider> Drop for Frame<'_, P> {
    fn drop(&mut self) {
        if !self.ended {
            self.engine.end_draw();
        }
    }
}
