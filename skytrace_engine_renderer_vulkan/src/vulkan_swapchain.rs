/// Swapchain - presentable image chain, its render pass and framebuffers
///
/// Built once at startup; window resize is not handled. The choice helpers
/// are pure functions over surface queries so they can be tested without a
/// device.

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::{engine_bail, engine_err, engine_info};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::color_range;
use crate::vulkan_window::PresentationWindow;

/// Prefer a format usable as a storage image with the standard non-linear
/// color space; otherwise the first reported format
pub fn choose_surface_format<F>(formats: &[vk::SurfaceFormatKHR], supports_storage: F) -> Option<vk::SurfaceFormatKHR>
where
    F: Fn(vk::Format) -> bool,
{
    formats
        .iter()
        .find(|candidate| {
            candidate.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR && supports_storage(candidate.format)
        })
        .or_else(|| formats.first())
        .copied()
}

/// Mailbox when available, FIFO otherwise
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Surface extent, or the framebuffer size clamped to the surface limits
/// when the surface leaves the choice to the application
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, framebuffer_size: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (width, height) = framebuffer_size;
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// One image more than the minimum, capped by the maximum (0 = unbounded)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let wanted = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        wanted.min(capabilities.max_image_count)
    } else {
        wanted
    }
}

/// Color attachment, plus transfer source/destination when supported
pub fn choose_image_usage(capabilities: &vk::SurfaceCapabilitiesKHR) -> vk::ImageUsageFlags {
    let mut usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
    for extra in [vk::ImageUsageFlags::TRANSFER_SRC, vk::ImageUsageFlags::TRANSFER_DST] {
        if capabilities.supported_usage_flags.contains(extra) {
            usage |= extra;
        }
    }
    usage
}

/// Single color attachment: cleared, stored, handed to presentation
pub(crate) fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

/// Color writes of the subpass wait for earlier color output
pub(crate) fn external_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
}

/// Vulkan swapchain with views, render pass and framebuffers
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Swapchain {
    pub fn new(ctx: Arc<GpuContext>, window: &dyn PresentationWindow) -> Result<Self> {
        let loader = ash::khr::swapchain::Device::new(ctx.instance(), &ctx.device);

        let (capabilities, formats, present_modes) = unsafe {
            let surface_loader = ctx.surface_loader();
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                        "Failed to get surface capabilities: {:?}", e)
                })?;
            let formats = surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                        "Failed to get surface formats: {:?}", e)
                })?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                        "Failed to get present modes: {:?}", e)
                })?;
            (capabilities, formats, present_modes)
        };

        let surface_format = choose_surface_format(&formats, |format| {
            let properties = unsafe {
                ctx.instance().get_physical_device_format_properties(ctx.physical_device, format)
            };
            properties.optimal_tiling_features.contains(vk::FormatFeatureFlags::STORAGE_IMAGE)
        });
        let Some(surface_format) = surface_format else {
            engine_bail!("skytrace::vulkan::swapchain", InitializationFailed, "Surface reports no formats");
        };

        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, window.framebuffer_size());
        let image_count = choose_image_count(&capabilities);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(choose_image_usage(&capabilities))
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain = unsafe {
            loader.create_swapchain(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                    "Failed to create swapchain: {:?}", e)
            })?
        };

        let mut owned = Self {
            ctx,
            loader,
            swapchain,
            images: Vec::new(),
            views: Vec::new(),
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            format: surface_format.format,
            extent,
        };

        owned.images = unsafe {
            owned.loader.get_swapchain_images(swapchain).map_err(|e| {
                engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                    "Failed to get swapchain images: {:?}", e)
            })?
        };

        owned.create_views()?;
        owned.create_render_pass()?;
        owned.create_framebuffers()?;

        engine_info!(
            "skytrace::vulkan::swapchain",
            "Swapchain {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            owned.images.len(),
            surface_format.format,
            present_mode
        );

        Ok(owned)
    }

    fn create_views(&mut self) -> Result<()> {
        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(color_range(1));

            let view = unsafe {
                self.ctx.device.create_image_view(&create_info, None).map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                        "Failed to create swapchain image view: {:?}", e)
                })?
            };
            self.views.push(view);
        }
        Ok(())
    }

    fn create_render_pass(&mut self) -> Result<()> {
        let attachments = [color_attachment(self.format)];
        let color_refs = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];
        let dependencies = [external_dependency()];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        self.render_pass = unsafe {
            self.ctx.device.create_render_pass(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                    "Failed to create render pass: {:?}", e)
            })?
        };
        Ok(())
    }

    fn create_framebuffers(&mut self) -> Result<()> {
        for &view in &self.views {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);

            let framebuffer = unsafe {
                self.ctx.device.create_framebuffer(&create_info, None).map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", InitializationFailed,
                        "Failed to create framebuffer: {:?}", e)
                })?
            };
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    /// Acquire the next image, signaling `semaphore` when it is ready
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<u32> {
        unsafe {
            let (image_index, _suboptimal) = self
                .loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::swapchain", FrameFailed,
                        "Failed to acquire next swapchain image: {:?}", e)
                })?;
            Ok(image_index)
        }
    }

    /// Queue `image_index` for presentation once `wait` is signaled
    pub fn present(&self, queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> Result<()> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.loader.queue_present(queue, &present_info).map_err(|e| {
                engine_err!("skytrace::vulkan::swapchain", FrameFailed,
                    "Failed to present swapchain image: {:?}", e)
            })?;
        }
        Ok(())
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn framebuffers(&self) -> &[vk::Framebuffer] {
        &self.framebuffers
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                self.ctx.device.destroy_render_pass(self.render_pass, None);
            }
            for &view in &self.views {
                self.ctx.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
