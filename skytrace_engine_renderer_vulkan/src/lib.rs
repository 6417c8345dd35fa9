/*!
# Skytrace Engine - Vulkan Backend

Vulkan implementation of the Skytrace compute ray tracer.

A compute pipeline ray traces the scene into a storage image; a graphics
pipeline then samples that image onto a full-screen triangle that is
presented through the swapchain. Command buffers are recorded once at
startup and replayed every frame.

Memory is allocated explicitly with `vkAllocateMemory`; there is one
allocation per buffer or image.

```no_run
use skytrace_engine::skytrace::config::RendererConfig;
use skytrace_engine::glam::Vec3;
use skytrace_engine::skytrace::render::{ImageCrateDecoder, Plane, Scene, Sphere};
use skytrace_engine_renderer_vulkan::{VulkanRayTracer, WinitPresentationWindow};
# fn run(window: std::sync::Arc<winit::window::Window>) -> skytrace_engine::skytrace::Result<()> {
let window = WinitPresentationWindow::new(window);
// At least one sphere and one plane
let sphere = Sphere::new(Vec3::new(0.0, 1.0, 0.0), 2.0, Vec3::new(0.8, 0.2, 0.2), Vec3::splat(0.1));
let ground = Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, Vec3::ONE, Vec3::splat(0.3));
let scene = Scene::new(vec![sphere], vec![ground])?;
let mut tracer = VulkanRayTracer::new(&window, &RendererConfig::default(), &scene, &ImageCrateDecoder)?;
tracer.render_frame(&window)?;
# Ok(())
# }
```
*/

// Device and queues
mod vulkan_context;
mod vulkan_device_selector;
mod vulkan_queue_family;
mod vulkan_debug;
mod vulkan_window;

// Resources
mod vulkan_memory;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_descriptor_set;

// Presentation and frames
mod vulkan_swapchain;
mod vulkan_pipeline;
mod vulkan_barrier;
mod vulkan_sync;
mod vulkan_frame;
mod vulkan;

pub use vulkan::VulkanRayTracer;
pub use vulkan_window::{
    can_present, create_window_surface, surface_extensions, PresentationWindow, WinitPresentationWindow,
};
pub use vulkan_queue_family::QueueFamilyIndices;
pub use vulkan_device_selector::{select_best, DeviceCandidate, SelectedDevice};
pub use vulkan_memory::find_memory_type;
pub use vulkan_swapchain::{choose_extent, choose_image_count, choose_present_mode, choose_surface_format};

// Re-export debug utilities
pub use vulkan_debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
