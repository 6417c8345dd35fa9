//! Integration tests for VulkanRayTracer
//!
//! Tests that build a full ray tracer require a GPU, the compiled shader
//! programs and the skybox images under `data/` (override the directory with
//! SKYTRACE_DATA). They are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_ray_tracer_tests -- --ignored

use skytrace_engine::glam::{Mat4, Vec3};
use skytrace_engine::skytrace::config::{RendererConfig, ShaderPaths, SkyboxPaths};
use skytrace_engine::skytrace::render::{
    DecodedImage, FrameState, ImageDecoder, Plane, Scene, Settings, Sphere,
};
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine_renderer_vulkan::{PresentationWindow, VulkanRayTracer, WinitPresentationWindow};
use std::cell::Cell;
use std::ffi::c_char;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use winit::event_loop::EventLoop;
use winit::window::Window;

fn data_dir() -> PathBuf {
    std::env::var_os("SKYTRACE_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data"))
}

fn test_config() -> RendererConfig {
    let data = data_dir();
    RendererConfig {
        shaders: ShaderPaths {
            vertex: data.join("shaders/rendering.vert.spv"),
            fragment: data.join("shaders/rendering.frag.spv"),
            compute: data.join("shaders/ray_tracing.comp.spv"),
        },
        skybox: SkyboxPaths::from_directory(data.join("skybox"), "jpg"),
        ..RendererConfig::default()
    }
}

fn test_scene() -> Scene {
    let spheres = vec![
        Sphere::new(Vec3::new(0.0, 1.0, 0.0), 2.0, Vec3::new(0.8, 0.2, 0.2), Vec3::splat(0.1)),
        Sphere::new(Vec3::new(7.0, 1.0, 0.0), 2.0, Vec3::ZERO, Vec3::splat(0.9)),
    ];
    let planes = vec![Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, Vec3::ONE, Vec3::splat(0.3))];
    Scene::new(spheres, planes).unwrap()
}

/// Every face decodes to the same 4x4 opaque image
struct SolidDecoder;

impl ImageDecoder for SolidDecoder {
    fn decode(&self, _path: &Path) -> Result<DecodedImage> {
        Ok(DecodedImage {
            width: 4,
            height: 4,
            pixels: [10u8, 20, 30, 255].repeat(16),
        })
    }
}

/// Helper to create a hidden test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (WinitPresentationWindow, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Skytrace Test")
        .with_inner_size(winit::dpi::LogicalSize::new(320, 240))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (WinitPresentationWindow::new(Arc::new(window)), event_loop)
}

// ============================================================================
// STARTUP ORDER (no GPU needed)
// ============================================================================

/// Window that records whether the renderer ever asked for Vulkan objects
struct UntouchedWindow {
    touched: Cell<bool>,
}

impl PresentationWindow for UntouchedWindow {
    fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        self.touched.set(true);
        Err(Error::InitializationFailed("unexpected instance creation".to_string()))
    }

    fn create_surface(&self, _entry: &ash::Entry, _instance: &ash::Instance) -> Result<ash::vk::SurfaceKHR> {
        self.touched.set(true);
        Err(Error::InitializationFailed("unexpected surface creation".to_string()))
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (320, 240)
    }

    fn is_minimized(&self) -> bool {
        false
    }

    fn should_close(&self) -> bool {
        false
    }
}

/// Fails on the fourth face
struct FailingDecoder {
    calls: Cell<u32>,
}

impl ImageDecoder for FailingDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == 4 {
            return Err(Error::ResourceFailed(format!("cannot decode {}", path.display())));
        }
        SolidDecoder.decode(path)
    }
}

#[test]
fn test_skybox_failure_aborts_before_vulkan() {
    let window = UntouchedWindow { touched: Cell::new(false) };
    let decoder = FailingDecoder { calls: Cell::new(0) };

    let result = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &decoder);

    assert!(matches!(result, Err(Error::ResourceFailed(_))));
    assert_eq!(decoder.calls.get(), 4);
    assert!(!window.touched.get());
}

// ============================================================================
// RAY TRACER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_initializes() {
    let (window, _event_loop) = create_test_window();
    let tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &SolidDecoder).unwrap();

    assert!(!tracer.device_name().is_empty());
    assert!(tracer.swapchain_image_count() >= 2);
    assert_eq!(tracer.frame_count(), 0);
    assert_eq!(tracer.frame_state(), FrameState::Idle);
    assert_eq!(tracer.target_layout(), ash::vk::ImageLayout::GENERAL);
    assert_eq!(tracer.skybox_extent(), ash::vk::Extent2D { width: 4, height: 4 });

    let families = tracer.queue_families();
    assert_eq!(tracer.graphics_queue_family(), families.graphics);
    assert_eq!(tracer.compute_queue_family(), families.compute);
}

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_starts_with_default_settings() {
    let (window, _event_loop) = create_test_window();
    let tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &SolidDecoder).unwrap();

    assert_eq!(tracer.read_settings().unwrap(), Settings::default());
}

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_update_settings() {
    let (window, _event_loop) = create_test_window();
    let mut tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &SolidDecoder).unwrap();

    let mut settings = Settings::default();
    settings.transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    settings.advance(0.5, 0.8);
    tracer.update_settings(&settings).unwrap();

    assert_eq!(tracer.read_settings().unwrap(), settings);
}

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_draws_frames() {
    let (window, _event_loop) = create_test_window();
    let mut tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &SolidDecoder).unwrap();

    for _ in 0..3 {
        let image_index = tracer.draw_frame().unwrap();
        assert!(image_index < tracer.swapchain_image_count());
        assert_eq!(tracer.frame_state(), FrameState::Idle);
    }
    assert_eq!(tracer.frame_count(), 3);

    tracer.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_real_skybox() {
    let (window, _event_loop) = create_test_window();
    let decoder = skytrace_engine::skytrace::render::ImageCrateDecoder;
    let mut tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &decoder).unwrap();

    assert!(tracer.render_frame(&window).unwrap());
}

/// Presents through `inner` but reports itself minimized
struct MinimizedWindow<'a> {
    inner: &'a WinitPresentationWindow,
}

impl PresentationWindow for MinimizedWindow<'_> {
    fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        self.inner.required_extensions()
    }

    fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<ash::vk::SurfaceKHR> {
        self.inner.create_surface(entry, instance)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.inner.framebuffer_size()
    }

    fn is_minimized(&self) -> bool {
        true
    }

    fn should_close(&self) -> bool {
        false
    }
}

#[test]
#[ignore] // Requires GPU
fn test_ray_tracer_skips_minimized_window() {
    let (window, _event_loop) = create_test_window();
    let mut tracer = VulkanRayTracer::new(&window, &test_config(), &test_scene(), &SolidDecoder).unwrap();

    tracer.draw_frame().unwrap();
    let minimized = MinimizedWindow { inner: &window };

    assert!(!tracer.render_frame(&minimized).unwrap());
    assert_eq!(tracer.frame_count(), 1);
    assert_eq!(tracer.frame_state(), FrameState::Idle);

    assert!(tracer.render_frame(&window).unwrap());
    assert_eq!(tracer.frame_count(), 2);
}
