/// Presentation window contract
///
/// The renderer never talks to the windowing system directly. Everything it
/// needs (instance extensions, a surface, the framebuffer size and the
/// minimized/close state) goes through `PresentationWindow`.

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use skytrace_engine::skytrace::Result;
use skytrace_engine::engine_err;
use std::ffi::c_char;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use winit::window::Window;

/// Window collaborator consumed by the renderer
pub trait PresentationWindow {
    /// Instance extensions needed to create a surface for this window
    fn required_extensions(&self) -> Result<Vec<*const c_char>>;

    /// Create the presentation surface
    fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<vk::SurfaceKHR>;

    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    fn is_minimized(&self) -> bool;

    fn should_close(&self) -> bool;
}

/// Whether a frame can be presented to `window` right now
///
/// A minimized window or one with an empty framebuffer has no usable
/// swapchain image, so the frame is skipped instead.
pub fn can_present(window: &dyn PresentationWindow) -> bool {
    let (width, height) = window.framebuffer_size();
    !window.is_minimized() && width > 0 && height > 0
}

/// Instance extensions for any raw-window-handle window
pub fn surface_extensions<W: HasDisplayHandle>(window: &W) -> Result<Vec<*const c_char>> {
    let display_handle = window.display_handle().map_err(|e| {
        engine_err!("skytrace::vulkan::window", InitializationFailed,
            "Failed to get display handle: {}", e)
    })?;

    let extensions = ash_window::enumerate_required_extensions(display_handle.as_raw()).map_err(|e| {
        engine_err!("skytrace::vulkan::window", InitializationFailed,
            "Failed to get required extensions: {:?}", e)
    })?;

    Ok(extensions.to_vec())
}

/// Surface for any raw-window-handle window
pub fn create_window_surface<W: HasDisplayHandle + HasWindowHandle>(
    window: &W,
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<vk::SurfaceKHR> {
    let display_handle = window.display_handle().map_err(|e| {
        engine_err!("skytrace::vulkan::window", InitializationFailed,
            "Failed to get display handle: {}", e)
    })?;
    let window_handle = window.window_handle().map_err(|e| {
        engine_err!("skytrace::vulkan::window", InitializationFailed,
            "Failed to get window handle: {}", e)
    })?;

    unsafe {
        ash_window::create_surface(entry, instance, display_handle.as_raw(), window_handle.as_raw(), None)
            .map_err(|e| {
                engine_err!("skytrace::vulkan::window", InitializationFailed,
                    "Failed to create surface: {:?}", e)
            })
    }
}

/// winit-backed presentation window
///
/// winit reports closing as an event, so the application forwards it with
/// `request_close`.
pub struct WinitPresentationWindow {
    window: Arc<Window>,
    close_requested: AtomicBool,
}

impl WinitPresentationWindow {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            close_requested: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn request_close(&self) {
        self.close_requested.store(true, Ordering::Relaxed);
    }
}

impl PresentationWindow for WinitPresentationWindow {
    fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        surface_extensions(self.window.as_ref())
    }

    fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<vk::SurfaceKHR> {
        create_window_surface(self.window.as_ref(), entry, instance)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn is_minimized(&self) -> bool {
        let (width, height) = self.framebuffer_size();
        self.window.is_minimized().unwrap_or(false) || width == 0 || height == 0
    }

    fn should_close(&self) -> bool {
        self.close_requested.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "vulkan_window_tests.rs"]
mod tests;
