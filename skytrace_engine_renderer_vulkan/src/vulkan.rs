/// VulkanRayTracer - compute ray tracing presented through a swapchain
///
/// Startup order: skybox faces are decoded first (a bad face aborts before
/// any Vulkan object exists), then GPU context, swapchain, sampler, target
/// image, skybox cube map, buffers, descriptors, pipelines and finally the
/// prerecorded frame command buffers. Uploads go through the graphics queue;
/// with a separate compute family the uploaded resources are handed over to
/// it before the first dispatch.

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::skytrace::config::RendererConfig;
use skytrace_engine::skytrace::render::{CubemapPixels, FrameState, ImageDecoder, Scene, Settings};
use skytrace_engine::{engine_debug, engine_err, engine_info, engine_trace};
use std::sync::Arc;

use crate::vulkan_barrier::{upload_acquire, upload_release};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{validation_enabled, GpuContext, QueueRole};
use crate::vulkan_debug::print_validation_stats_report;
use crate::vulkan_queue_family::QueueFamilyIndices;
use crate::vulkan_descriptor_set::{BoundResources, DescriptorBinder};
use crate::vulkan_frame::FrameOrchestrator;
use crate::vulkan_pipeline::PipelineStage;
use crate::vulkan_sampler::Sampler;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::Image;
use crate::vulkan_window::{can_present, PresentationWindow};

/// Scene buffers plus the persistently mapped settings uniform
struct SceneBuffers {
    settings: Buffer,
    spheres: Buffer,
    planes: Buffer,
}

impl SceneBuffers {
    fn new(ctx: &Arc<GpuContext>, scene: &Scene) -> Result<Self> {
        let scene_usage = vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER;

        let mut settings = Buffer::new_mapped(
            Arc::clone(ctx),
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            Settings::SIZE as vk::DeviceSize,
        )?;
        settings.write(0, bytemuck::bytes_of(&Settings::default()))?;

        let spheres = Buffer::new_device_local_with_data(Arc::clone(ctx), scene_usage, scene.sphere_bytes())?;
        let planes = Buffer::new_device_local_with_data(Arc::clone(ctx), scene_usage, scene.plane_bytes())?;

        Ok(Self { settings, spheres, planes })
    }
}

/// Move the uploaded scene buffers and skybox from graphics to compute
///
/// Nothing to do when both roles share a family.
fn hand_over_uploads(ctx: &GpuContext, buffers: &SceneBuffers, skybox: &Image) -> Result<()> {
    let families = ctx.queue_families;
    let (Some(release), Some(acquire)) = (upload_release(&families), upload_acquire(&families)) else {
        return Ok(());
    };

    let scene_buffers = [buffers.spheres.handle(), buffers.planes.handle()];
    for (role, barrier) in [(QueueRole::Graphics, release), (QueueRole::Compute, acquire)] {
        let cube = barrier.image_barrier_in(skybox.image, skybox.layout(), skybox.layers());
        ctx.one_shot(role, |device, cmd| barrier.record_resources(device, cmd, &scene_buffers, &[cube]))?;
    }

    engine_debug!(
        "skytrace::vulkan",
        "Scene resources moved from family {} to {}",
        families.graphics,
        families.compute
    );
    Ok(())
}

/// Vulkan compute ray tracer
///
/// Fields drop top to bottom, the reverse of creation order.
pub struct VulkanRayTracer {
    frames: FrameOrchestrator,
    compute: PipelineStage,
    graphics: PipelineStage,
    _descriptors: DescriptorBinder,
    buffers: SceneBuffers,
    skybox: Image,
    target: Image,
    _sampler: Sampler,
    swapchain: Swapchain,
    ctx: Arc<GpuContext>,
    validation: bool,
}

impl VulkanRayTracer {
    /// Build the whole renderer for `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Presentation window (surface, framebuffer size)
    /// * `config` - Renderer configuration (shaders, skybox, validation)
    /// * `scene` - Spheres and planes, uploaded once
    /// * `decoder` - Image decoder used for the skybox faces
    pub fn new(
        window: &dyn PresentationWindow,
        config: &RendererConfig,
        scene: &Scene,
        decoder: &dyn ImageDecoder,
    ) -> Result<Self> {
        let skybox_pixels = CubemapPixels::load(&config.skybox, decoder)?;

        let ctx = GpuContext::new(window, config)?;
        let swapchain = Swapchain::new(Arc::clone(&ctx), window)?;
        let sampler = Sampler::new(Arc::clone(&ctx))?;
        let target = Image::new_storage_target(Arc::clone(&ctx), swapchain.format(), swapchain.extent())?;
        let skybox = Image::cube_from_pixels(Arc::clone(&ctx), swapchain.format(), &skybox_pixels)?;
        let buffers = SceneBuffers::new(&ctx, scene)?;
        hand_over_uploads(&ctx, &buffers, &skybox)?;

        let descriptors = DescriptorBinder::new(
            Arc::clone(&ctx),
            swapchain.image_count(),
            &BoundResources {
                sampler: sampler.sampler,
                target_view: target.view,
                skybox_view: skybox.view,
                settings: buffers.settings.handle(),
                spheres: buffers.spheres.handle(),
                planes: buffers.planes.handle(),
            },
        )?;

        let graphics = PipelineStage::graphics(
            Arc::clone(&ctx),
            &config.shaders.vertex,
            &config.shaders.fragment,
            swapchain.render_pass(),
            swapchain.extent(),
            descriptors.graphics_layout(),
            descriptors.graphics_set(),
        )?;
        let compute = PipelineStage::compute(
            Arc::clone(&ctx),
            &config.shaders.compute,
            descriptors.compute_layout(),
            descriptors.compute_set(),
        )?;

        let frames = FrameOrchestrator::new(
            Arc::clone(&ctx),
            &compute,
            &graphics,
            &swapchain,
            &target,
            config.clear_color,
        )?;

        engine_info!(
            "skytrace::vulkan",
            "Ray tracer ready: {} spheres, {} planes, {}x{}",
            scene.spheres().len(),
            scene.planes().len(),
            swapchain.extent().width,
            swapchain.extent().height
        );

        Ok(Self {
            frames,
            compute,
            graphics,
            _descriptors: descriptors,
            buffers,
            skybox,
            target,
            _sampler: sampler,
            swapchain,
            ctx,
            validation: validation_enabled(config),
        })
    }

    /// Write per-frame settings into the mapped uniform buffer
    ///
    /// The write is not fenced; the compute shader may observe a mix of the
    /// old and new values for one frame.
    pub fn update_settings(&mut self, settings: &Settings) -> Result<()> {
        let Some(mapped) = self.buffers.settings.mapped_mut() else {
            return Err(engine_err!("skytrace::vulkan", ResourceFailed,
                "Settings buffer is not mapped"));
        };
        settings.write_to(mapped)
    }

    /// Settings currently held by the uniform buffer
    pub fn read_settings(&self) -> Result<Settings> {
        let Some(mapped) = self.buffers.settings.mapped() else {
            return Err(engine_err!("skytrace::vulkan", ResourceFailed,
                "Settings buffer is not mapped"));
        };
        Settings::read_from(mapped)
    }

    /// Run one frame of the compute/graphics/present protocol
    pub fn draw_frame(&mut self) -> Result<u32> {
        self.frames.draw_frame(&self.swapchain)
    }

    /// Draw a frame unless the window is minimized; returns whether one was drawn
    ///
    /// A skipped frame leaves the frame count and state untouched.
    pub fn render_frame(&mut self, window: &dyn PresentationWindow) -> Result<bool> {
        if !can_present(window) {
            engine_trace!("skytrace::vulkan", "Window minimized, frame skipped");
            return Ok(false);
        }
        self.draw_frame()?;
        Ok(true)
    }

    /// Block until every submitted frame has finished
    pub fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    pub fn swapchain_format(&self) -> vk::Format {
        self.swapchain.format()
    }

    pub fn swapchain_image_count(&self) -> u32 {
        self.swapchain.image_count()
    }

    pub fn device_name(&self) -> &str {
        &self.ctx.device_name
    }

    pub fn queue_families(&self) -> QueueFamilyIndices {
        self.ctx.queue_families
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.frame_count()
    }

    pub fn frame_state(&self) -> FrameState {
        self.frames.state()
    }

    pub fn skybox_extent(&self) -> vk::Extent2D {
        self.skybox.extent()
    }

    pub fn target_layout(&self) -> vk::ImageLayout {
        self.target.layout()
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics.queue().family
    }

    pub fn compute_queue_family(&self) -> u32 {
        self.compute.queue().family
    }
}

impl Drop for VulkanRayTracer {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();

        if self.validation {
            print_validation_stats_report();
        }
        // Fields drop next, in declaration order
    }
}
