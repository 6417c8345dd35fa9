//! Unit tests for memory type lookup over synthetic property tables

use crate::vulkan_memory::find_memory_type;
use ash::vk;
use skytrace_engine::skytrace::Error;

fn table(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
    let mut properties = vk::PhysicalDeviceMemoryProperties::default();
    properties.memory_type_count = types.len() as u32;
    for (index, flags) in types.iter().enumerate() {
        properties.memory_types[index] = vk::MemoryType {
            property_flags: *flags,
            heap_index: 0,
        };
    }
    properties
}

fn host() -> vk::MemoryPropertyFlags {
    vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
}

#[test]
fn test_returns_lowest_matching_index() {
    let properties = table(&[
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        host(),
        host() | vk::MemoryPropertyFlags::HOST_CACHED,
    ]);

    assert_eq!(find_memory_type(&properties, 0b111, host()).unwrap(), 1);
    assert_eq!(
        find_memory_type(&properties, 0b111, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(),
        0
    );
}

#[test]
fn test_respects_type_filter() {
    let properties = table(&[host(), host(), host()]);
    assert_eq!(find_memory_type(&properties, 0b100, host()).unwrap(), 2);
}

#[test]
fn test_superset_flags_match() {
    let properties = table(&[vk::MemoryPropertyFlags::DEVICE_LOCAL | host()]);
    assert_eq!(find_memory_type(&properties, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(), 0);
}

#[test]
fn test_no_match_is_resource_failure() {
    let properties = table(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, host()]);

    let missing_flags = find_memory_type(&properties, 0b11, vk::MemoryPropertyFlags::LAZILY_ALLOCATED);
    assert!(matches!(missing_flags, Err(Error::ResourceFailed(_))));

    let filtered_out = find_memory_type(&properties, 0b01, host());
    assert!(matches!(filtered_out, Err(Error::ResourceFailed(_))));
}

#[test]
fn test_types_beyond_count_are_ignored() {
    let mut properties = table(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
    properties.memory_types[1].property_flags = host();

    let result = find_memory_type(&properties, 0b11, host());
    assert!(matches!(result, Err(Error::ResourceFailed(_))));
}
