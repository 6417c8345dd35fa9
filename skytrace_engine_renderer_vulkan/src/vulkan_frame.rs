/// FrameOrchestrator - prerecorded command buffers and the per-frame protocol
///
/// Command buffers are recorded once at startup: one compute buffer that
/// dispatches the ray tracer over the target image, and one graphics buffer
/// per swapchain image that draws the target as a full-screen triangle.
///
/// Each frame:
/// 1. wait for the compute fence, then reset it
/// 2. submit compute, signaling the fence
/// 3. acquire a swapchain image (signals `present_complete`)
/// 4. submit that image's graphics buffer (waits `present_complete`,
///    signals `render_complete`)
/// 5. present (waits `render_complete`), then wait for the graphics queue
///
/// At most one compute dispatch is in flight, and frames never overlap.
///
/// A failing step puts the state back to Idle and every later frame returns
/// the same failure without touching the device.

use ash::vk;
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::skytrace::render::{
    dispatch_group_counts, FrameEvent, FrameState, FrameTracker, WORKGROUP_SIZE,
};
use skytrace_engine::{engine_bail, engine_debug, engine_err, engine_trace};
use std::sync::Arc;

use crate::vulkan_barrier::{compute_acquire, compute_release, graphics_acquire, graphics_release, initial_release};
use crate::vulkan_context::{GpuContext, QueueRole};
use crate::vulkan_pipeline::PipelineStage;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_sync::SyncObjects;
use crate::vulkan_texture::Image;

/// Vertices of the full-screen triangle generated by the vertex shader
const FULL_SCREEN_VERTICES: u32 = 3;

pub struct FrameOrchestrator {
    ctx: Arc<GpuContext>,
    sync: SyncObjects,
    compute_queue: vk::Queue,
    compute_pool: vk::CommandPool,
    compute_commands: vk::CommandBuffer,
    graphics_queue: vk::Queue,
    graphics_pool: vk::CommandPool,
    graphics_commands: Vec<vk::CommandBuffer>,
    tracker: FrameTracker,
}

impl FrameOrchestrator {
    /// Record every command buffer and hand the target image to the compute
    /// queue when the two roles use different families
    pub fn new(
        ctx: Arc<GpuContext>,
        compute: &PipelineStage,
        graphics: &PipelineStage,
        swapchain: &Swapchain,
        target: &Image,
        clear_color: [f32; 4],
    ) -> Result<Self> {
        let sync = SyncObjects::new(Arc::clone(&ctx))?;

        let mut frames = Self {
            ctx,
            sync,
            compute_queue: compute.queue().queue,
            compute_pool: compute.queue().command_pool,
            compute_commands: vk::CommandBuffer::null(),
            graphics_queue: graphics.queue().queue,
            graphics_pool: graphics.queue().command_pool,
            graphics_commands: Vec::new(),
            tracker: FrameTracker::new(),
        };

        frames.graphics_commands = graphics.allocate_command_buffers(swapchain.image_count())?;
        frames.compute_commands = compute
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InitializationFailed("No compute command buffer returned".to_string()))?;

        frames.record_compute(compute, target)?;
        for (index, &cmd) in frames.graphics_commands.iter().enumerate() {
            frames.record_graphics(cmd, index, graphics, swapchain, target, clear_color)?;
        }

        if let Some(release) = initial_release(&frames.ctx.queue_families) {
            let image = target.image;
            frames.ctx.one_shot(QueueRole::Graphics, |device, cmd| release.record(device, cmd, image))?;
            engine_debug!("skytrace::vulkan::frame", "Target image released to the compute family");
        }

        Ok(frames)
    }

    fn begin(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .begin_command_buffer(cmd, &vk::CommandBufferBeginInfo::default())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::frame", InitializationFailed,
                        "Failed to begin command buffer: {:?}", e)
                })
        }
    }

    fn end(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.ctx.device.end_command_buffer(cmd).map_err(|e| {
                engine_err!("skytrace::vulkan::frame", InitializationFailed,
                    "Failed to end command buffer: {:?}", e)
            })
        }
    }

    fn record_compute(&self, compute: &PipelineStage, target: &Image) -> Result<()> {
        let cmd = self.compute_commands;
        let device = &self.ctx.device;
        let families = &self.ctx.queue_families;
        let extent = target.extent();

        self.begin(cmd)?;

        if let Some(barrier) = compute_acquire(families) {
            barrier.record(device, cmd, target.image);
        }

        compute.bind(cmd);
        let [x, y, z] = dispatch_group_counts(extent.width, extent.height, WORKGROUP_SIZE);
        unsafe {
            device.cmd_dispatch(cmd, x, y, z);
        }

        if let Some(barrier) = compute_release(families) {
            barrier.record(device, cmd, target.image);
        }

        self.end(cmd)?;
        engine_trace!("skytrace::vulkan::frame", "Compute buffer dispatches {}x{}x{} groups", x, y, z);
        Ok(())
    }

    fn record_graphics(
        &self,
        cmd: vk::CommandBuffer,
        image_index: usize,
        graphics: &PipelineStage,
        swapchain: &Swapchain,
        target: &Image,
        clear_color: [f32; 4],
    ) -> Result<()> {
        let device = &self.ctx.device;
        let families = &self.ctx.queue_families;

        let Some(&framebuffer) = swapchain.framebuffers().get(image_index) else {
            engine_bail!("skytrace::vulkan::frame", InitializationFailed,
                "No framebuffer for swapchain image {}", image_index);
        };

        self.begin(cmd)?;

        graphics_acquire(families).record(device, cmd, target.image);

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        }];
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(swapchain.render_pass())
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: swapchain.extent(),
            })
            .clear_values(&clear_values);

        unsafe {
            device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);
            graphics.bind(cmd);
            device.cmd_draw(cmd, FULL_SCREEN_VERTICES, 1, 0, 0);
            device.cmd_end_render_pass(cmd);
        }

        if let Some(barrier) = graphics_release(families) {
            barrier.record(device, cmd, target.image);
        }

        self.end(cmd)
    }

    /// Run one frame; returns the presented swapchain image
    pub fn draw_frame(&mut self, swapchain: &Swapchain) -> Result<u32> {
        self.tracker.ensure_usable()?;
        self.run_frame(swapchain).map_err(|e| {
            engine_debug!("skytrace::vulkan::frame", "Frame aborted in state {}", self.tracker.state());
            self.tracker.fail(e)
        })
    }

    fn run_frame(&mut self, swapchain: &Swapchain) -> Result<u32> {
        let device = &self.ctx.device;
        let fence = self.sync.compute_complete;

        unsafe {
            device.wait_for_fences(&[fence], true, u64::MAX).map_err(|e| {
                engine_err!("skytrace::vulkan::frame", FrameFailed,
                    "Failed to wait for compute fence: {:?}", e)
            })?;
            device.reset_fences(&[fence]).map_err(|e| {
                engine_err!("skytrace::vulkan::frame", FrameFailed,
                    "Failed to reset compute fence: {:?}", e)
            })?;

            let compute_buffers = [self.compute_commands];
            let compute_submit = vk::SubmitInfo::default().command_buffers(&compute_buffers);
            device.queue_submit(self.compute_queue, &[compute_submit], fence).map_err(|e| {
                engine_err!("skytrace::vulkan::frame", FrameFailed,
                    "Failed to submit compute work: {:?}", e)
            })?;
        }
        self.tracker.advance(FrameEvent::SubmitCompute)?;

        let image_index = swapchain.acquire_next_image(self.sync.present_complete)?;
        self.tracker.advance(FrameEvent::AcquireImage { image_index })?;

        let Some(&graphics_commands) = self.graphics_commands.get(image_index as usize) else {
            engine_bail!("skytrace::vulkan::frame", FrameFailed,
                "Swapchain returned image {} but only {} are recorded", image_index, self.graphics_commands.len());
        };

        unsafe {
            let wait_semaphores = [self.sync.present_complete];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let signal_semaphores = [self.sync.render_complete];
            let graphics_buffers = [graphics_commands];
            let graphics_submit = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&graphics_buffers)
                .signal_semaphores(&signal_semaphores);

            device
                .queue_submit(self.graphics_queue, &[graphics_submit], vk::Fence::null())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::frame", FrameFailed,
                        "Failed to submit graphics work: {:?}", e)
                })?;
        }
        self.tracker.advance(FrameEvent::SubmitGraphics)?;

        swapchain.present(self.graphics_queue, image_index, self.sync.render_complete)?;
        self.tracker.advance(FrameEvent::Present)?;

        unsafe {
            device.queue_wait_idle(self.graphics_queue).map_err(|e| {
                engine_err!("skytrace::vulkan::frame", FrameFailed,
                    "Failed to wait for the graphics queue: {:?}", e)
            })?;
        }
        self.tracker.advance(FrameEvent::Finish)?;

        Ok(image_index)
    }

    pub fn state(&self) -> FrameState {
        self.tracker.state()
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.tracker.frame_count()
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            if !self.graphics_commands.is_empty() {
                self.ctx.device.free_command_buffers(self.graphics_pool, &self.graphics_commands);
            }
            if self.compute_commands != vk::CommandBuffer::null() {
                self.ctx.device.free_command_buffers(self.compute_pool, &[self.compute_commands]);
            }
        }
        // self.sync drops next
    }
}
