/// Barriers between the compute and graphics queues
///
/// The target image stays in GENERAL layout; only its queue family ownership
/// and memory visibility change. When both roles share a family no ownership
/// transfer is recorded, and the graphics side falls back to a plain
/// compute-write to fragment-read barrier.
///
/// Every ownership transfer is a release on one queue matched by an acquire
/// on the other:
///
/// | barrier          | queue    | families            |
/// |------------------|----------|---------------------|
/// | initial release  | graphics | graphics → compute  |
/// | compute acquire  | compute  | graphics → compute  |
/// | compute release  | compute  | compute → graphics  |
/// | graphics acquire | graphics | compute → graphics  |
/// | graphics release | graphics | graphics → compute  |
///
/// Scene buffers and the skybox are filled through the graphics queue and
/// only read by compute, so they change owner once, right after upload:
///
/// | barrier          | queue    | families            |
/// |------------------|----------|---------------------|
/// | upload release   | graphics | graphics → compute  |
/// | upload acquire   | compute  | graphics → compute  |

use ash::vk;

use crate::vulkan_queue_family::QueueFamilyIndices;
use crate::vulkan_texture::color_range;

/// Stages, access masks and families of one barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierSpec {
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_family: u32,
    pub dst_family: u32,
}

impl BarrierSpec {
    /// Whether the barrier moves ownership between queue families
    pub fn is_ownership_transfer(&self) -> bool {
        self.src_family != self.dst_family
    }

    pub fn image_barrier(&self, image: vk::Image) -> vk::ImageMemoryBarrier<'static> {
        self.image_barrier_in(image, vk::ImageLayout::GENERAL, 1)
    }

    /// Image barrier that keeps `layout` across all `layers`
    pub fn image_barrier_in(
        &self,
        image: vk::Image,
        layout: vk::ImageLayout,
        layers: u32,
    ) -> vk::ImageMemoryBarrier<'static> {
        vk::ImageMemoryBarrier::default()
            .src_access_mask(self.src_access)
            .dst_access_mask(self.dst_access)
            .old_layout(layout)
            .new_layout(layout)
            .src_queue_family_index(self.src_family)
            .dst_queue_family_index(self.dst_family)
            .image(image)
            .subresource_range(color_range(layers))
    }

    /// Whole-buffer barrier
    pub fn buffer_barrier(&self, buffer: vk::Buffer) -> vk::BufferMemoryBarrier<'static> {
        vk::BufferMemoryBarrier::default()
            .src_access_mask(self.src_access)
            .dst_access_mask(self.dst_access)
            .src_queue_family_index(self.src_family)
            .dst_queue_family_index(self.dst_family)
            .buffer(buffer)
            .offset(0)
            .size(vk::WHOLE_SIZE)
    }

    pub fn record(&self, device: &ash::Device, cmd: vk::CommandBuffer, image: vk::Image) {
        self.record_resources(device, cmd, &[], &[self.image_barrier(image)]);
    }

    /// Record one pipeline barrier covering `buffers` and prepared image barriers
    pub fn record_resources(
        &self,
        device: &ash::Device,
        cmd: vk::CommandBuffer,
        buffers: &[vk::Buffer],
        images: &[vk::ImageMemoryBarrier],
    ) {
        let buffer_barriers: Vec<vk::BufferMemoryBarrier> =
            buffers.iter().map(|buffer| self.buffer_barrier(*buffer)).collect();

        unsafe {
            device.cmd_pipeline_barrier(
                cmd,
                self.src_stage,
                self.dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &buffer_barriers,
                images,
            );
        }
    }
}

fn release(src_stage: vk::PipelineStageFlags, src_access: vk::AccessFlags, src_family: u32, dst_family: u32) -> BarrierSpec {
    BarrierSpec {
        src_stage,
        dst_stage: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        src_access,
        dst_access: vk::AccessFlags::empty(),
        src_family,
        dst_family,
    }
}

fn acquire(dst_stage: vk::PipelineStageFlags, dst_access: vk::AccessFlags, src_family: u32, dst_family: u32) -> BarrierSpec {
    BarrierSpec {
        src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
        dst_stage,
        src_access: vk::AccessFlags::empty(),
        dst_access,
        src_family,
        dst_family,
    }
}

/// Graphics queue hands the target to compute before the first frame
pub fn initial_release(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        release(
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::AccessFlags::empty(),
            families.graphics,
            families.compute,
        )
    })
}

/// Start of the compute command buffer
pub fn compute_acquire(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        acquire(
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::AccessFlags::SHADER_WRITE,
            families.graphics,
            families.compute,
        )
    })
}

/// End of the compute command buffer
pub fn compute_release(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        release(
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::AccessFlags::SHADER_WRITE,
            families.compute,
            families.graphics,
        )
    })
}

/// Start of each graphics command buffer
pub fn graphics_acquire(families: &QueueFamilyIndices) -> BarrierSpec {
    if families.needs_ownership_transfer() {
        acquire(
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::AccessFlags::SHADER_READ,
            families.compute,
            families.graphics,
        )
    } else {
        BarrierSpec {
            src_stage: vk::PipelineStageFlags::COMPUTE_SHADER,
            dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            src_access: vk::AccessFlags::SHADER_WRITE,
            dst_access: vk::AccessFlags::SHADER_READ,
            src_family: vk::QUEUE_FAMILY_IGNORED,
            dst_family: vk::QUEUE_FAMILY_IGNORED,
        }
    }
}

/// End of each graphics command buffer; the fragment shader only reads
pub fn graphics_release(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        release(
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::AccessFlags::empty(),
            families.graphics,
            families.compute,
        )
    })
}

/// Graphics queue hands uploaded scene resources to compute
pub fn upload_release(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        release(
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_WRITE,
            families.graphics,
            families.compute,
        )
    })
}

/// Compute queue takes uploaded scene resources before the first dispatch
pub fn upload_acquire(families: &QueueFamilyIndices) -> Option<BarrierSpec> {
    families.needs_ownership_transfer().then(|| {
        acquire(
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::AccessFlags::SHADER_READ,
            families.graphics,
            families.compute,
        )
    })
}

#[cfg(test)]
#[path = "vulkan_barrier_tests.rs"]
mod tests;
