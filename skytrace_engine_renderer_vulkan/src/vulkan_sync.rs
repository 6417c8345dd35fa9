/// Frame synchronization primitives, created once and reused every frame

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::engine_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct SyncObjects {
    ctx: Arc<GpuContext>,
    /// Signaled when the compute dispatch finishes; created signaled so the
    /// first frame does not block
    pub compute_complete: vk::Fence,
    /// Signaled when the acquired swapchain image is ready
    pub present_complete: vk::Semaphore,
    /// Signaled when the graphics submission finishes
    pub render_complete: vk::Semaphore,
}

impl SyncObjects {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let mut sync = Self {
            ctx,
            compute_complete: vk::Fence::null(),
            present_complete: vk::Semaphore::null(),
            render_complete: vk::Semaphore::null(),
        };

        unsafe {
            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            sync.compute_complete = sync.ctx.device.create_fence(&fence_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::sync", InitializationFailed,
                    "Failed to create compute fence: {:?}", e)
            })?;

            let semaphore_info = vk::SemaphoreCreateInfo::default();
            sync.present_complete = sync.ctx.device.create_semaphore(&semaphore_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::sync", InitializationFailed,
                    "Failed to create present semaphore: {:?}", e)
            })?;
            sync.render_complete = sync.ctx.device.create_semaphore(&semaphore_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::sync", InitializationFailed,
                    "Failed to create render semaphore: {:?}", e)
            })?;
        }

        Ok(sync)
    }
}

impl Drop for SyncObjects {
    fn drop(&mut self) {
        unsafe {
            if self.render_complete != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.render_complete, None);
            }
            if self.present_complete != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.present_complete, None);
            }
            if self.compute_complete != vk::Fence::null() {
                self.ctx.device.destroy_fence(self.compute_complete, None);
            }
        }
    }
}
