/// PipelineStage - one pipeline bound to its queue and descriptor set
///
/// The graphics and compute sides of the renderer are two instances of the
/// same type; they differ only in how the pipeline is built and in what gets
/// recorded after `bind`.

use ash::vk;
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::{engine_debug, engine_err};
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, QueueContext, QueueRole};
use crate::vulkan_shader::ShaderModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Graphics,
    Compute,
}

impl StageKind {
    pub fn bind_point(self) -> vk::PipelineBindPoint {
        match self {
            StageKind::Graphics => vk::PipelineBindPoint::GRAPHICS,
            StageKind::Compute => vk::PipelineBindPoint::COMPUTE,
        }
    }

    pub fn queue_role(self) -> QueueRole {
        match self {
            StageKind::Graphics => QueueRole::Graphics,
            StageKind::Compute => QueueRole::Compute,
        }
    }
}

/// Viewport covering the whole swapchain extent
pub(crate) fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

pub(crate) fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

pub(crate) fn rasterization_state() -> vk::PipelineRasterizationStateCreateInfo<'static> {
    vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::CLOCKWISE)
        .depth_bias_enable(false)
}

pub(crate) fn opaque_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::default()
        .blend_enable(false)
        .color_write_mask(vk::ColorComponentFlags::RGBA)
}

/// Pipeline, layout and descriptor set for one queue role
pub struct PipelineStage {
    ctx: Arc<GpuContext>,
    kind: StageKind,
    queue: QueueContext,
    descriptor_set: vk::DescriptorSet,
    layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

impl PipelineStage {
    fn with_layout(
        ctx: Arc<GpuContext>,
        kind: StageKind,
        set_layout: vk::DescriptorSetLayout,
        descriptor_set: vk::DescriptorSet,
    ) -> Result<Self> {
        let set_layouts = [set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);

        let layout = unsafe {
            ctx.device.create_pipeline_layout(&layout_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::pipeline", InitializationFailed,
                    "Failed to create {:?} pipeline layout: {:?}", kind, e)
            })?
        };

        let queue = *ctx.queue(kind.queue_role());
        Ok(Self {
            ctx,
            kind,
            queue,
            descriptor_set,
            layout,
            pipeline: vk::Pipeline::null(),
        })
    }

    /// Full-screen triangle pipeline sampling the target image
    pub fn graphics(
        ctx: Arc<GpuContext>,
        vertex_path: &Path,
        fragment_path: &Path,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        set_layout: vk::DescriptorSetLayout,
        descriptor_set: vk::DescriptorSet,
    ) -> Result<Self> {
        let mut stage = Self::with_layout(ctx, StageKind::Graphics, set_layout, descriptor_set)?;

        let vertex = ShaderModule::load(Arc::clone(&stage.ctx), vertex_path)?;
        let fragment = ShaderModule::load(Arc::clone(&stage.ctx), fragment_path)?;
        let stages = [
            vertex.stage_info(vk::ShaderStageFlags::VERTEX),
            fragment.stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        // Positions are generated in the vertex shader
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [full_viewport(extent)];
        let scissors = [full_scissor(extent)];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization = rasterization_state();
        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .sample_shading_enable(false);

        let blend_attachments = [opaque_blend_attachment()];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .layout(stage.layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            stage
                .ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| {
                    engine_err!("skytrace::vulkan::pipeline", InitializationFailed,
                        "Failed to create graphics pipeline: {:?}", e)
                })?
        };
        stage.pipeline = first_pipeline(pipelines)?;

        engine_debug!("skytrace::vulkan::pipeline", "Graphics pipeline ready");
        Ok(stage)
    }

    /// Ray-tracing compute pipeline
    pub fn compute(
        ctx: Arc<GpuContext>,
        compute_path: &Path,
        set_layout: vk::DescriptorSetLayout,
        descriptor_set: vk::DescriptorSet,
    ) -> Result<Self> {
        let mut stage = Self::with_layout(ctx, StageKind::Compute, set_layout, descriptor_set)?;

        let module = ShaderModule::load(Arc::clone(&stage.ctx), compute_path)?;
        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(module.stage_info(vk::ShaderStageFlags::COMPUTE))
            .layout(stage.layout);

        let pipelines = unsafe {
            stage
                .ctx
                .device
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| {
                    engine_err!("skytrace::vulkan::pipeline", InitializationFailed,
                        "Failed to create compute pipeline: {:?}", e)
                })?
        };
        stage.pipeline = first_pipeline(pipelines)?;

        engine_debug!("skytrace::vulkan::pipeline", "Compute pipeline ready");
        Ok(stage)
    }

    /// Bind the pipeline and its descriptor set
    pub fn bind(&self, cmd: vk::CommandBuffer) {
        let bind_point = self.kind.bind_point();
        unsafe {
            self.ctx.device.cmd_bind_pipeline(cmd, bind_point, self.pipeline);
            self.ctx.device.cmd_bind_descriptor_sets(
                cmd,
                bind_point,
                self.layout,
                0,
                &[self.descriptor_set],
                &[],
            );
        }
    }

    /// Primary command buffers from this stage's pool
    pub fn allocate_command_buffers(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.queue.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe {
            self.ctx.device.allocate_command_buffers(&alloc_info).map_err(|e| {
                engine_err!("skytrace::vulkan::pipeline", InitializationFailed,
                    "Failed to allocate {:?} command buffers: {:?}", self.kind, e)
            })
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn queue(&self) -> &QueueContext {
        &self.queue
    }
}

fn first_pipeline(pipelines: Vec<vk::Pipeline>) -> Result<vk::Pipeline> {
    pipelines
        .into_iter()
        .next()
        .ok_or_else(|| Error::InitializationFailed("Driver returned no pipeline".to_string()))
}

impl Drop for PipelineStage {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
