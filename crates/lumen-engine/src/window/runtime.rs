use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::SurfaceSize;
use crate::core::{App, AppControl};
use crate::device::gpu::{GpuInit, GpuProvider};
use crate::engine::{EngineConfig, FrameOutcome, RenderEngine};
use crate::text::FontSystem;
use crate::time::FrameClock;

/// Window, GPU and engine configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub gpu: GpuInit,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            gpu: GpuInit::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// Fails if the event loop cannot start or the first window cannot get a
    /// GPU device.
    pub fn run<A>(config: RuntimeConfig, fonts: FontSystem, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, Rc::new(fonts), app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct WindowEntry {
    window: Arc<Window>,
    engine: RenderEngine<GpuProvider>,
    clock: FrameClock,
}

impl WindowEntry {
    fn id(&self) -> WindowId {
        self.window.id()
    }
}

struct AppState<A: App + 'static> {
    config: RuntimeConfig,
    fonts: Rc<FontSystem>,
    app: A,

    entry: Option<WindowEntry>,
    fatal: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A: App + 'static> AppState<A> {
    fn new(config: RuntimeConfig, fonts: Rc<FontSystem>, app: A) -> Self {
        Self {
            config,
            fonts,
            app,
            entry: None,
            fatal: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let provider =
            GpuProvider::new(window.clone(), self.config.gpu.clone(), self.fonts.clone());
        let mut engine = RenderEngine::new(provider, self.config.engine.clone());
        engine.initialize().context("GPU initialization failed for window")?;

        window.request_redraw();
        self.entry = Some(WindowEntry {
            window,
            engine,
            clock: FrameClock::default(),
        });
        Ok(())
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn resize(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            let s = entry.window.inner_size();
            entry.engine.resize(SurfaceSize::new(s.width, s.height));
            entry.window.request_redraw();
        }
    }

    fn redraw(&mut self) -> AppControl {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return AppControl::Continue;
        };

        let time = entry.clock.tick();
        let Some(mut frame) = entry.engine.frame() else {
            return AppControl::Continue;
        };
        let control = app.on_frame(&mut frame.canvas(), time);
        let outcome = frame.end();

        if outcome == FrameOutcome::SurfaceLost {
            log::info!("surface lost; recreating on the next frame");
            entry.clock.reset();
        }
        app.on_frame_end(&outcome);
        control
    }
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.fatal = Some(e);
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation is paced by the swap chain.
        if let Some(entry) = self.entry.as_ref() {
            entry.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        if self.entry.as_ref().is_none_or(|e| e.id() != window_id) {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                // Drop the engine (and its surface) before the window goes.
                self.entry = None;
                self.request_exit(event_loop);
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),
            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }
            _ => {}
        }
    }
}
