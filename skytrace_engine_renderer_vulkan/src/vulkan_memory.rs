/// Memory type lookup

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::engine_err;

/// Lowest memory type index allowed by `type_filter` whose property flags
/// contain all of `required`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    required: vk::MemoryPropertyFlags,
) -> Result<u32> {
    let count = (memory_properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);

    memory_properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|(index, memory_type)| {
            type_filter & (1 << index) != 0 && memory_type.property_flags.contains(required)
        })
        .map(|(index, _)| index as u32)
        .ok_or_else(|| {
            engine_err!("skytrace::vulkan::memory", ResourceFailed,
                "Could not find a matching memory type (filter {:#b}, flags {:?})", type_filter, required)
        })
}

#[cfg(test)]
#[path = "vulkan_memory_tests.rs"]
mod tests;
