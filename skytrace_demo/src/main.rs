//! Skytrace demo
//!
//! Opens a window, builds the sphere-grid scene and drives the ray tracer
//! once per redraw. Startup and frame failures end the process with the
//! error message and a non-zero exit code.

mod camera;
mod scene;

use camera::Camera;
use skytrace_engine::skytrace::config::RendererConfig;
use skytrace_engine::skytrace::render::{DirectionalLight, ImageCrateDecoder, Settings, DEFAULT_ANGLE_RATE};
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::{engine_error, engine_info};
use skytrace_engine_renderer_vulkan::{can_present, PresentationWindow, VulkanRayTracer, WinitPresentationWindow};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const WINDOW_TITLE: &str = "Skytrace";
const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;
const FOV_DEGREES: f32 = 40.0;

struct Demo {
    config: RendererConfig,
    // Dropped before the window it presents to
    tracer: Option<VulkanRayTracer>,
    window: Option<WinitPresentationWindow>,
    camera: Camera,
    settings: Settings,
    keys: HashSet<KeyCode>,
    last_frame: Instant,
    error: Option<Error>,
}

impl Demo {
    fn new(config: RendererConfig) -> Self {
        let camera = Camera::new(FOV_DEGREES, WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32);
        let settings = Settings::new(camera.projection(), camera.world_transform(), DirectionalLight::default());

        Self {
            config,
            tracer: None,
            window: None,
            camera,
            settings,
            keys: HashSet::new(),
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = event_loop.create_window(attrs).map_err(|e| {
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;
        let window = WinitPresentationWindow::new(Arc::new(window));

        let (width, height) = window.framebuffer_size();
        if width > 0 && height > 0 {
            self.camera = Camera::new(FOV_DEGREES, width as f32 / height as f32);
            self.settings.projection = self.camera.projection();
        }

        let scene = scene::build_scene(&mut rand::thread_rng())?;
        let tracer = VulkanRayTracer::new(&window, &self.config, &scene, &ImageCrateDecoder)?;
        engine_info!("skytrace::demo", "Init done on {}", tracer.device_name());

        self.tracer = Some(tracer);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn frame(&mut self) -> Result<()> {
        let (Some(tracer), Some(window)) = (self.tracer.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.camera.update(&self.keys, elapsed);
        self.settings.transform = self.camera.world_transform();
        self.settings.advance(elapsed, DEFAULT_ANGLE_RATE);

        if !can_present(window) {
            return Ok(());
        }
        tracer.update_settings(&self.settings)?;
        tracer.render_frame(window)?;
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        engine_error!("skytrace::demo", "{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(window) = &self.window {
                    window.request_close();
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys.insert(code);
                        }
                        ElementState::Released => {
                            self.keys.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            if !window.should_close() {
                window.window().request_redraw();
            }
        }
    }
}

fn main() {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };

    let mut demo = Demo::new(RendererConfig::default());
    if let Err(e) = event_loop.run_app(&mut demo) {
        eprintln!("Event loop terminated: {}", e);
        std::process::exit(1);
    }

    // Release GPU objects before the window goes away
    demo.tracer = None;

    if let Some(error) = demo.error.take() {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
