/// Texture - device images with their own memory and view
///
/// Covers the ray-traced target image (2D, storage + sampled) and the skybox
/// cube map (6 layers, uploaded once through a staging buffer).

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::skytrace::render::CubemapPixels;
use skytrace_engine::{engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{GpuContext, QueueRole};
use crate::vulkan_memory::find_memory_type;

/// Color subresource range covering `layer_count` layers of mip 0
pub(crate) fn color_range(layer_count: u32) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(layer_count)
}

/// Layout transition barrier that keeps queue family ownership
pub(crate) fn layout_barrier(
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
    layer_count: u32,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_range(layer_count))
}

/// Region copying tightly packed faces into consecutive array layers
pub(crate) fn layered_copy_region(width: u32, height: u32, layer_count: u32) -> vk::BufferImageCopy {
    vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(
            vk::ImageSubresourceLayers::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .mip_level(0)
                .base_array_layer(0)
                .layer_count(layer_count),
        )
        .image_offset(vk::Offset3D::default())
        .image_extent(vk::Extent3D { width, height, depth: 1 })
}

/// Transition an image between layouts and wait for completion
pub fn change_image_layout(
    ctx: &GpuContext,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
    layer_count: u32,
) -> Result<()> {
    let barrier = layout_barrier(image, old_layout, new_layout, src_access, dst_access, layer_count);

    ctx.one_shot(QueueRole::Graphics, |device, cmd| unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    })
}

/// Image shape requested from `Image::create`
struct ImageShape {
    extent: vk::Extent2D,
    layers: u32,
    flags: vk::ImageCreateFlags,
    view_type: vk::ImageViewType,
}

/// Vulkan image, memory and view
pub struct Image {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    memory: vk::DeviceMemory,
    pub(crate) view: vk::ImageView,
    format: vk::Format,
    extent: vk::Extent2D,
    layers: u32,
    layout: vk::ImageLayout,
}

impl Image {
    /// 2D image with a 2D view
    pub fn new_2d(
        ctx: Arc<GpuContext>,
        format: vk::Format,
        extent: vk::Extent2D,
        usage: vk::ImageUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        let shape = ImageShape {
            extent,
            layers: 1,
            flags: vk::ImageCreateFlags::empty(),
            view_type: vk::ImageViewType::TYPE_2D,
        };
        Self::create(ctx, format, shape, usage, properties)
    }

    /// Cube-compatible image with 6 layers and a cube view
    pub fn new_cube(
        ctx: Arc<GpuContext>,
        format: vk::Format,
        face_extent: vk::Extent2D,
        usage: vk::ImageUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        let shape = ImageShape {
            extent: face_extent,
            layers: CubemapPixels::FACES,
            flags: vk::ImageCreateFlags::CUBE_COMPATIBLE,
            view_type: vk::ImageViewType::CUBE,
        };
        Self::create(ctx, format, shape, usage, properties)
    }

    fn create(
        ctx: Arc<GpuContext>,
        format: vk::Format,
        shape: ImageShape,
        usage: vk::ImageUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        let create_info = vk::ImageCreateInfo::default()
            .flags(shape.flags)
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: shape.extent.width,
                height: shape.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(shape.layers)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            ctx.device.create_image(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::texture", ResourceFailed,
                    "Failed to create image: {:?}", e)
            })?
        };

        let mut owned = Self {
            ctx,
            image,
            memory: vk::DeviceMemory::null(),
            view: vk::ImageView::null(),
            format,
            extent: shape.extent,
            layers: shape.layers,
            layout: vk::ImageLayout::UNDEFINED,
        };

        let requirements = unsafe { owned.ctx.device.get_image_memory_requirements(image) };
        let memory_type = find_memory_type(&owned.ctx.memory_properties, requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);

        unsafe {
            owned.memory = owned.ctx.device.allocate_memory(&alloc_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::texture", ResourceFailed,
                    "Failed to allocate image memory: {:?}", e)
            })?;

            owned.ctx.device.bind_image_memory(image, owned.memory, 0).map_err(|e| {
                engine_err!("skytrace::vulkan::texture", ResourceFailed,
                    "Failed to bind image memory: {:?}", e)
            })?;

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(shape.view_type)
                .format(format)
                .subresource_range(color_range(shape.layers));

            owned.view = owned.ctx.device.create_image_view(&view_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::texture", ResourceFailed,
                    "Failed to create image view: {:?}", e)
            })?;
        }

        Ok(owned)
    }

    /// Storage target written by the compute pass and sampled by the
    /// presentation pass; left in GENERAL layout
    pub fn new_storage_target(ctx: Arc<GpuContext>, format: vk::Format, extent: vk::Extent2D) -> Result<Self> {
        let mut target = Self::new_2d(
            ctx,
            format,
            extent,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::STORAGE,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        target.transition_layout(
            vk::ImageLayout::GENERAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::SHADER_WRITE,
        )?;
        Ok(target)
    }

    /// Cube map filled from six decoded faces
    pub fn cube_from_pixels(ctx: Arc<GpuContext>, format: vk::Format, pixels: &CubemapPixels) -> Result<Self> {
        let bytes = pixels.bytes();
        let mut staging = Buffer::new_mapped(
            Arc::clone(&ctx),
            vk::BufferUsageFlags::TRANSFER_SRC,
            bytes.len() as vk::DeviceSize,
        )?;
        staging.write(0, bytes)?;

        let mut cube = Self::new_cube(
            ctx,
            format,
            vk::Extent2D { width: pixels.width, height: pixels.height },
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        cube.transition_layout(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
        )?;

        let region = layered_copy_region(pixels.width, pixels.height, CubemapPixels::FACES);
        let (source, destination) = (staging.handle(), cube.image);
        cube.ctx.one_shot(QueueRole::Graphics, |device, cmd| unsafe {
            device.cmd_copy_buffer_to_image(
                cmd,
                source,
                destination,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        })?;

        cube.transition_layout(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
        )?;

        engine_debug!("skytrace::vulkan::texture", "Uploaded {}x{} cube map", pixels.width, pixels.height);
        Ok(cube)
    }

    /// Move every layer to `new_layout`, waiting for completion
    pub fn transition_layout(
        &mut self,
        new_layout: vk::ImageLayout,
        src_access: vk::AccessFlags,
        dst_access: vk::AccessFlags,
    ) -> Result<()> {
        change_image_layout(&self.ctx, self.image, self.layout, new_layout, src_access, dst_access, self.layers)?;
        self.layout = new_layout;
        Ok(())
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            self.ctx.device.destroy_image(self.image, None);
            if self.memory != vk::DeviceMemory::null() {
                self.ctx.device.free_memory(self.memory, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_texture_tests.rs"]
mod tests;
