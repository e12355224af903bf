use winit::event::WindowEvent;

use crate::canvas::Canvas;
use crate::engine::FrameOutcome;
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per drawn frame. The canvas is already cleared.
    ///
    /// Frames are skipped while the window has no drawable area.
    fn on_frame(&mut self, canvas: &mut Canvas<'_>, time: FrameTime) -> AppControl;

    /// Called after each drawn frame with what became of it.
    fn on_frame_end(&mut self, outcome: &FrameOutcome) {
        let _ = outcome;
    }
}
