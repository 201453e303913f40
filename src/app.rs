//! Window and frame loop.
//!
//! Each redraw advances the clock, steps the aquarium, draws the tuning
//! panel and renders. Left-drag orbits the camera and the wheel zooms.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::aquarium::Aquarium;
use crate::config::Tuning;
use crate::error::ViewerError;
#[cfg(feature = "egui")]
use crate::gpu::EguiIntegration;
use crate::gpu::Renderer;
use crate::time::Clock;

/// Radians of orbit per pixel dragged.
const ORBIT_SPEED: f32 = 0.005;

/// Open a window and run the aquarium until it is closed.
pub fn run(aquarium: Aquarium, tuning: Tuning) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(aquarium, tuning);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    aquarium: Aquarium,
    tuning: Tuning,
    clock: Clock,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Startup failure, returned from [`run`] once the loop exits.
    error: Option<ViewerError>,
}

impl App {
    fn new(aquarium: Aquarium, tuning: Tuning) -> Self {
        Self {
            aquarium,
            tuning,
            clock: Clock::new(),
            window: None,
            renderer: None,
            #[cfg(feature = "egui")]
            egui: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title("Aquarium")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(Renderer::new(window.clone()))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(
                renderer.device(),
                renderer.surface_format(),
                &window,
            ));
        }

        self.renderer = Some(renderer);
        self.window = Some(window);
        // Don't count the setup time as the first frame.
        self.clock.reset();
        Ok(())
    }

    fn pointer_over_ui(&self) -> bool {
        #[cfg(feature = "egui")]
        if let Some(egui) = &self.egui {
            return egui.wants_pointer();
        }
        false
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.clock.set_paused(self.tuning.paused);
        self.clock.set_time_scale(self.tuning.time_scale);
        let (elapsed, delta) = self.clock.update();

        let report = self.aquarium.frame(&self.tuning, elapsed, delta);
        tracing::trace!(
            substeps = report.substeps,
            updated = report.updated,
            skipped = report.skipped,
            nudges = report.nudges,
            "frame"
        );

        let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) else {
            return;
        };

        #[cfg(feature = "egui")]
        let ui_output = self.egui.as_mut().map(|egui| {
            egui.run(window, |ctx| {
                crate::ui::draw(ctx, &mut self.aquarium, &mut self.tuning, &self.clock)
            })
        });

        let size = renderer.size();
        let result = renderer.render(
            self.aquarium.drawables(),
            &self.tuning,
            elapsed,
            |device, queue, encoder, view| {
                #[cfg(feature = "egui")]
                if let (Some(egui), Some(output)) = (self.egui.as_mut(), ui_output.as_ref()) {
                    egui.paint(device, queue, encoder, view, size, output);
                }
                #[cfg(not(feature = "egui"))]
                let _ = (device, queue, encoder, view, size);
            },
        );

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => tracing::warn!(error = ?e, "render error"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!(error = %e, "failed to start viewer");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(egui), Some(window)) = (&mut self.egui, &self.window) {
            let consumed = egui.on_window_event(window, &event);
            if consumed
                && matches!(
                    event,
                    WindowEvent::MouseWheel { .. } | WindowEvent::KeyboardInput { .. }
                )
            {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed && !self.pointer_over_ui();
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;

                        if let Some(renderer) = &mut self.renderer {
                            renderer.camera.orbit(-dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.pointer_over_ui() {
                    return;
                }
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(renderer) = &mut self.renderer {
                    renderer.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
