/// DescriptorBinder - descriptor pool, layouts and the two bound sets
///
/// The graphics set exposes the ray-traced target to the fragment shader.
/// The compute set exposes the skybox, the target as a storage image, the
/// settings uniform and the two scene storage buffers. Both are written once
/// and never updated afterwards.
///
/// The fragment stage samples the target in GENERAL layout while the compute
/// stage writes it in the same layout.

use ash::vk;
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::engine_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Compute set binding slots
pub mod compute_binding {
    pub const SKYBOX: u32 = 0;
    pub const TARGET: u32 = 1;
    pub const SETTINGS: u32 = 2;
    pub const SPHERES: u32 = 3;
    pub const PLANES: u32 = 4;
}

/// Graphics set binding slot of the sampled target
pub const GRAPHICS_TARGET_BINDING: u32 = 0;

/// Pool capacity shared by both sets
pub fn descriptor_pool_sizes() -> [vk::DescriptorPoolSize; 4] {
    [
        vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: 2 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER, descriptor_count: 4 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_IMAGE, descriptor_count: 1 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: 2 },
    ]
}

fn binding(slot: u32, ty: vk::DescriptorType, stage: vk::ShaderStageFlags) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(slot)
        .descriptor_type(ty)
        .descriptor_count(1)
        .stage_flags(stage)
}

pub fn graphics_layout_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 1] {
    [binding(
        GRAPHICS_TARGET_BINDING,
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        vk::ShaderStageFlags::FRAGMENT,
    )]
}

pub fn compute_layout_bindings() -> [vk::DescriptorSetLayoutBinding<'static>; 5] {
    let stage = vk::ShaderStageFlags::COMPUTE;
    [
        binding(compute_binding::SKYBOX, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, stage),
        binding(compute_binding::TARGET, vk::DescriptorType::STORAGE_IMAGE, stage),
        binding(compute_binding::SETTINGS, vk::DescriptorType::UNIFORM_BUFFER, stage),
        binding(compute_binding::SPHERES, vk::DescriptorType::STORAGE_BUFFER, stage),
        binding(compute_binding::PLANES, vk::DescriptorType::STORAGE_BUFFER, stage),
    ]
}

/// Resources referenced by the descriptor sets
#[derive(Debug, Clone, Copy)]
pub struct BoundResources {
    pub sampler: vk::Sampler,
    pub target_view: vk::ImageView,
    pub skybox_view: vk::ImageView,
    pub settings: vk::Buffer,
    pub spheres: vk::Buffer,
    pub planes: vk::Buffer,
}

/// Descriptor pool with the graphics and compute sets
pub struct DescriptorBinder {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    graphics_layout: vk::DescriptorSetLayout,
    compute_layout: vk::DescriptorSetLayout,
    graphics_set: vk::DescriptorSet,
    compute_set: vk::DescriptorSet,
}

impl DescriptorBinder {
    /// Create the pool (at most `max_sets` sets), both layouts, and allocate
    /// and write both sets
    pub fn new(ctx: Arc<GpuContext>, max_sets: u32, resources: &BoundResources) -> Result<Self> {
        let pool_sizes = descriptor_pool_sizes();
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets.max(2));

        let pool = unsafe {
            ctx.device.create_descriptor_pool(&pool_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::descriptor", InitializationFailed,
                    "Failed to create descriptor pool: {:?}", e)
            })?
        };

        let mut binder = Self {
            ctx,
            pool,
            graphics_layout: vk::DescriptorSetLayout::null(),
            compute_layout: vk::DescriptorSetLayout::null(),
            graphics_set: vk::DescriptorSet::null(),
            compute_set: vk::DescriptorSet::null(),
        };

        binder.graphics_layout = binder.create_layout(&graphics_layout_bindings())?;
        binder.compute_layout = binder.create_layout(&compute_layout_bindings())?;

        let layouts = [binder.graphics_layout, binder.compute_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);

        let sets = unsafe {
            binder.ctx.device.allocate_descriptor_sets(&alloc_info).map_err(|e| {
                engine_err!("skytrace::vulkan::descriptor", InitializationFailed,
                    "Failed to allocate descriptor sets: {:?}", e)
            })?
        };
        let [graphics_set, compute_set] = sets[..] else {
            return Err(Error::InitializationFailed(format!(
                "Expected 2 descriptor sets, got {}",
                sets.len()
            )));
        };
        binder.graphics_set = graphics_set;
        binder.compute_set = compute_set;

        binder.write(resources);
        Ok(binder)
    }

    fn create_layout(&self, bindings: &[vk::DescriptorSetLayoutBinding]) -> Result<vk::DescriptorSetLayout> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);
        unsafe {
            self.ctx.device.create_descriptor_set_layout(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::descriptor", InitializationFailed,
                    "Failed to create descriptor set layout: {:?}", e)
            })
        }
    }

    fn write(&self, resources: &BoundResources) {
        let target_sampled = [vk::DescriptorImageInfo::default()
            .sampler(resources.sampler)
            .image_view(resources.target_view)
            .image_layout(vk::ImageLayout::GENERAL)];
        let skybox = [vk::DescriptorImageInfo::default()
            .sampler(resources.sampler)
            .image_view(resources.skybox_view)
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
        let target_storage = [vk::DescriptorImageInfo::default()
            .image_view(resources.target_view)
            .image_layout(vk::ImageLayout::GENERAL)];
        let whole = |buffer: vk::Buffer| {
            [vk::DescriptorBufferInfo::default().buffer(buffer).offset(0).range(vk::WHOLE_SIZE)]
        };
        let settings = whole(resources.settings);
        let spheres = whole(resources.spheres);
        let planes = whole(resources.planes);

        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(self.graphics_set)
                .dst_binding(GRAPHICS_TARGET_BINDING)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&target_sampled),
            vk::WriteDescriptorSet::default()
                .dst_set(self.compute_set)
                .dst_binding(compute_binding::SKYBOX)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&skybox),
            vk::WriteDescriptorSet::default()
                .dst_set(self.compute_set)
                .dst_binding(compute_binding::TARGET)
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .image_info(&target_storage),
            vk::WriteDescriptorSet::default()
                .dst_set(self.compute_set)
                .dst_binding(compute_binding::SETTINGS)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&settings),
            vk::WriteDescriptorSet::default()
                .dst_set(self.compute_set)
                .dst_binding(compute_binding::SPHERES)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .buffer_info(&spheres),
            vk::WriteDescriptorSet::default()
                .dst_set(self.compute_set)
                .dst_binding(compute_binding::PLANES)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .buffer_info(&planes),
        ];

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }
    }

    pub fn graphics_layout(&self) -> vk::DescriptorSetLayout {
        self.graphics_layout
    }

    pub fn compute_layout(&self) -> vk::DescriptorSetLayout {
        self.compute_layout
    }

    pub fn graphics_set(&self) -> vk::DescriptorSet {
        self.graphics_set
    }

    pub fn compute_set(&self) -> vk::DescriptorSet {
        self.compute_set
    }
}

impl Drop for DescriptorBinder {
    fn drop(&mut self) {
        unsafe {
            // Sets are freed with the pool
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
            for layout in [self.compute_layout, self.graphics_layout] {
                if layout != vk::DescriptorSetLayout::null() {
                    self.ctx.device.destroy_descriptor_set_layout(layout, None);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_set_tests.rs"]
mod tests;
