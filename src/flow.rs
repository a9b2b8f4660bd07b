//! Application event loop.
//!
//! [`App`] is the winit [`ApplicationHandler`]. Once the window exists it owns
//! an [`AppState`]: the render context, the demo scene and the frame clock.
//! Each frame follows the same steps:
//! 1. Collect window/device events into the camera controller
//! 2. Measure the frame delta on `RedrawRequested`
//! 3. Move the camera, then write the camera and light uniforms
//! 4. Record one render pass with the scene's draws
//! 5. Present the frame

use std::{iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{config::DemoConfig, context::Context, error::Result, render::DemoScene};

/// Time between consecutive frames.
#[derive(Debug)]
pub struct FrameClock {
    last_time: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_time: Instant::now(),
        }
    }

    /// Elapsed time since the previous call (or since creation).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last_time);
        self.last_time = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that exists once the window does.
pub struct AppState {
    pub ctx: Context,
    pub scene: DemoScene,
    clock: FrameClock,
}

impl AppState {
    fn new(window: Arc<Window>, config: &DemoConfig) -> Result<Self> {
        let mut ctx = Context::new(window)?;
        ctx.clear_colour = config.clear_colour;
        let scene = DemoScene::new(&ctx, config)?;
        Ok(Self {
            ctx,
            scene,
            clock: FrameClock::new(),
        })
    }

    fn update(&mut self) {
        let dt = self.clock.tick();
        let camera = &mut self.ctx.camera;
        camera.controller.update(&mut camera.camera, dt);
        self.ctx.update_uniforms();
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.scene.draw(&self.ctx, &mut render_pass);
        }

        self.ctx.gpu.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    config: DemoConfig,
    state: Option<AppState>,
    // first fatal error, handed back by `run`
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        if let Err(e) = window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        {
            log::warn!("cursor could not be grabbed: {e}");
        }
        window.set_cursor_visible(false);

        AppState::new(window, &self.config)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyE => state.ctx.lights.toggle_spot_light(),
                _ => {}
            },
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                state.update();
                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        self.fail(event_loop, anyhow::anyhow!("the GPU ran out of memory"));
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open the window and run the demo until it is closed.
///
/// Start-up failures (window, GPU, model loading) end the loop and are
/// returned here.
pub fn run(config: DemoConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
