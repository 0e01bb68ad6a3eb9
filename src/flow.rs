//! Flow control and the application event loop.
//!
//! One render loop drives everything:
//!
//! ```text
//! Uninitialized --resumed--> Initialized --first redraw--> Running
//!       |                         |                          |
//!       +-------- init error / close / Escape / exiting -----+--> Terminated
//! ```
//!
//! Each redraw of the `Running` phase performs, in order:
//! 1. tick the [`FrameClock`]
//! 2. apply the input to the camera
//! 3. add the items requested since the last frame
//! 4. advance the scene
//! 5. upload uniforms and instances, draw, present
//! 6. clear the per-frame input deltas and request the next redraw
//!
//! Leaving the loop releases the renderer, then the scene, then the GPU
//! context, and reports the resource ledger.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    clock::FrameClock,
    config::EngineConfig,
    context::Context,
    data_structures::scene::Scene,
    errors::{CubeError, Result},
    render::Renderer,
};

/// Life-cycle phase of the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Running,
    Terminated,
}

/// Inputs of the phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Window, context and renderer were built (`true`) or failed (`false`).
    Resumed { ok: bool },
    Redraw,
    /// Close request, quit key or event loop exit.
    Quit,
}

impl Phase {
    pub fn on(self, event: LoopEvent) -> Phase {
        match (self, event) {
            (Phase::Terminated, _) => Phase::Terminated,
            (_, LoopEvent::Quit) => Phase::Terminated,
            (Phase::Uninitialized, LoopEvent::Resumed { ok: true }) => Phase::Initialized,
            (Phase::Uninitialized, LoopEvent::Resumed { ok: false }) => Phase::Terminated,
            (Phase::Initialized | Phase::Running, LoopEvent::Redraw) => Phase::Running,
            (phase, _) => phase,
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Phase::Initialized | Phase::Running)
    }
}

/// Everything that exists between initialization and termination.
///
/// Field order is drop order: GPU users go before the context.
struct Session {
    renderer: Renderer,
    scene: Scene,
    clock: FrameClock,
    ctx: Context,
}

impl Session {
    async fn new(window: Arc<Window>, config: &EngineConfig) -> Result<Self> {
        let ctx = Context::new(window, config).await?;
        let renderer = Renderer::new(&ctx, config).await?;

        let spin = cgmath::Deg(config.scene.spin_deg_per_sec);
        let mut scene = match config.scene.seed {
            Some(seed) => Scene::with_seed(spin, seed),
            None => Scene::new(spin),
        };
        for primitive in &config.scene.initial_items {
            scene.add_item(*primitive);
        }

        Ok(Self {
            renderer,
            scene,
            clock: FrameClock::new(),
            ctx,
        })
    }

    fn frame(&mut self) {
        let Session {
            renderer,
            scene,
            clock,
            ctx,
        } = self;

        let time = clock.tick();
        ctx.controller.update(&mut ctx.camera, &ctx.input, time.dt);
        for primitive in ctx.input.take_pending_items() {
            scene.add_item(primitive);
        }
        scene.update(time.dt);
        renderer.prepare(ctx, scene, &time);

        match renderer.render(ctx) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.window.inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }

        ctx.input.end_frame();
        ctx.window.request_redraw();
    }

    /// Releases the renderer, the scene and then the context. Returns `true`
    /// when every tracked GPU handle was released.
    fn shutdown(self) -> bool {
        let Session {
            renderer,
            scene,
            clock,
            ctx,
        } = self;
        log::info!(
            "shutting down after {} frames with {} items",
            clock.frame_index(),
            scene.len()
        );
        drop(renderer);
        drop(scene);
        let ledger = ctx.ledger.clone();
        drop(ctx);
        ledger.report()
    }
}

pub struct App {
    config: EngineConfig,
    async_runtime: tokio::runtime::Runtime,
    phase: Phase,
    session: Option<Session>,
    error: Option<CubeError>,
}

impl App {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            config,
            async_runtime,
            phase: Phase::Uninitialized,
            session: None,
            error: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The error that terminated the loop, if any.
    pub fn take_error(&mut self) -> Option<CubeError> {
        self.error.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        self.async_runtime
            .block_on(Session::new(window, &self.config))
    }

    fn terminate(&mut self, event_loop: &ActiveEventLoop) {
        self.phase = self.phase.on(LoopEvent::Quit);
        if let Some(session) = self.session.take() {
            if !session.shutdown() {
                log::warn!("GPU handles were still alive at shutdown");
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // resumed fires again after a suspend on some platforms
        if self.phase != Phase::Uninitialized {
            return;
        }
        match self.init(event_loop) {
            Ok(session) => {
                self.phase = self.phase.on(LoopEvent::Resumed { ok: true });
                session.ctx.window.request_redraw();
                self.session = Some(session);
                log::info!("initialized");
            }
            Err(e) => {
                log::error!("App initialization failed: {}", e);
                self.phase = self.phase.on(LoopEvent::Resumed { ok: false });
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let session = match &mut self.session {
            Some(session) if self.phase.is_live() => session,
            _ => return,
        };
        session.ctx.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => self.terminate(event_loop),
            WindowEvent::Resized(size) => session.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if self.phase == Phase::Initialized {
                    // loading time is not frame time
                    session.clock.reset();
                    log::info!("running");
                }
                self.phase = self.phase.on(LoopEvent::Redraw);
                session.frame();
            }
            _ => {}
        }

        if self
            .session
            .as_ref()
            .is_some_and(|session| session.ctx.input.quit_requested)
        {
            self.terminate(event_loop);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let (Some(session), DeviceEvent::MouseMotion { delta: (dx, dy) }) = (&mut self.session, event) {
            session.ctx.input.handle_mouse_motion(dx, dy);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != Phase::Terminated {
            self.terminate(event_loop);
        }
    }
}

/// Opens the window and runs the render loop until it terminates.
///
/// Returns the initialization error, if that is what ended the loop.
pub fn run(config: EngineConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;
    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
