//! Unit tests for barrier planning

use crate::vulkan_barrier::*;
use crate::vulkan_queue_family::QueueFamilyIndices;
use ash::vk;
use ash::vk::Handle;

const SHARED: QueueFamilyIndices = QueueFamilyIndices { graphics: 0, compute: 0, transfer: 0 };
const SPLIT: QueueFamilyIndices = QueueFamilyIndices { graphics: 0, compute: 1, transfer: 2 };

/// Every barrier recorded in the compute and graphics command buffers
fn recorded(families: &QueueFamilyIndices) -> Vec<BarrierSpec> {
    [
        compute_acquire(families),
        compute_release(families),
        Some(graphics_acquire(families)),
        graphics_release(families),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[test]
fn test_no_ownership_transfer_when_families_match() {
    assert!(recorded(&SHARED).iter().all(|b| !b.is_ownership_transfer()));
    assert_eq!(initial_release(&SHARED), None);
    assert_eq!(compute_acquire(&SHARED), None);
    assert_eq!(compute_release(&SHARED), None);
    assert_eq!(graphics_release(&SHARED), None);
}

#[test]
fn test_ownership_transfers_when_families_differ() {
    let barriers = recorded(&SPLIT);
    assert_eq!(barriers.len(), 4);
    assert!(barriers.iter().all(|b| b.is_ownership_transfer()));
}

#[test]
fn test_same_family_graphics_barrier_orders_compute_writes() {
    let barrier = graphics_acquire(&SHARED);
    assert_eq!(barrier.src_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
    assert_eq!(barrier.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(barrier.src_access, vk::AccessFlags::SHADER_WRITE);
    assert_eq!(barrier.dst_access, vk::AccessFlags::SHADER_READ);
    assert_eq!(barrier.src_family, vk::QUEUE_FAMILY_IGNORED);
    assert_eq!(barrier.dst_family, vk::QUEUE_FAMILY_IGNORED);
}

#[test]
fn test_releases_match_acquires() {
    let compute_acquire = compute_acquire(&SPLIT).unwrap();
    let compute_release = compute_release(&SPLIT).unwrap();
    let graphics_acquire = graphics_acquire(&SPLIT);
    let graphics_release = graphics_release(&SPLIT).unwrap();
    let initial = initial_release(&SPLIT).unwrap();

    for release in [graphics_release, initial] {
        assert_eq!((release.src_family, release.dst_family), (compute_acquire.src_family, compute_acquire.dst_family));
    }
    assert_eq!(
        (compute_release.src_family, compute_release.dst_family),
        (graphics_acquire.src_family, graphics_acquire.dst_family)
    );
    assert_eq!((compute_acquire.src_family, compute_acquire.dst_family), (0, 1));
}

#[test]
fn test_split_stage_masks() {
    let compute_acquire = compute_acquire(&SPLIT).unwrap();
    assert_eq!(compute_acquire.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
    assert_eq!(compute_acquire.dst_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
    assert_eq!(compute_acquire.dst_access, vk::AccessFlags::SHADER_WRITE);

    let compute_release = compute_release(&SPLIT).unwrap();
    assert_eq!(compute_release.src_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
    assert_eq!(compute_release.dst_stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);

    let graphics_acquire = graphics_acquire(&SPLIT);
    assert_eq!(graphics_acquire.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
    assert_eq!(graphics_acquire.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(graphics_acquire.dst_access, vk::AccessFlags::SHADER_READ);

    let graphics_release = graphics_release(&SPLIT).unwrap();
    assert_eq!(graphics_release.src_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(graphics_release.dst_stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
}

#[test]
fn test_image_barrier_keeps_general_layout() {
    let image = vk::Image::from_raw(7);
    let barrier = compute_acquire(&SPLIT).unwrap().image_barrier(image);

    assert_eq!(barrier.old_layout, vk::ImageLayout::GENERAL);
    assert_eq!(barrier.new_layout, vk::ImageLayout::GENERAL);
    assert_eq!(barrier.src_queue_family_index, 0);
    assert_eq!(barrier.dst_queue_family_index, 1);
    assert_eq!(barrier.image, image);
    assert_eq!(barrier.subresource_range.layer_count, 1);
}

#[test]
fn test_releases_flush_only_what_their_queue_wrote() {
    // The fragment shader only samples the target
    assert_eq!(initial_release(&SPLIT).unwrap().src_access, vk::AccessFlags::empty());
    assert_eq!(graphics_release(&SPLIT).unwrap().src_access, vk::AccessFlags::empty());

    assert_eq!(compute_release(&SPLIT).unwrap().src_access, vk::AccessFlags::SHADER_WRITE);
    assert_eq!(upload_release(&SPLIT).unwrap().src_access, vk::AccessFlags::TRANSFER_WRITE);

    for release in [initial_release(&SPLIT), compute_release(&SPLIT), graphics_release(&SPLIT), upload_release(&SPLIT)] {
        assert_eq!(release.unwrap().dst_access, vk::AccessFlags::empty());
    }
}

#[test]
fn test_upload_handoff_only_with_separate_compute_family() {
    assert_eq!(upload_release(&SHARED), None);
    assert_eq!(upload_acquire(&SHARED), None);

    let release = upload_release(&SPLIT).unwrap();
    let acquire = upload_acquire(&SPLIT).unwrap();

    assert_eq!((release.src_family, release.dst_family), (SPLIT.graphics, SPLIT.compute));
    assert_eq!((acquire.src_family, acquire.dst_family), (release.src_family, release.dst_family));

    assert_eq!(release.src_stage, vk::PipelineStageFlags::TRANSFER);
    assert_eq!(release.dst_stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
    assert_eq!(acquire.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
    assert_eq!(acquire.dst_stage, vk::PipelineStageFlags::COMPUTE_SHADER);
    assert_eq!(acquire.dst_access, vk::AccessFlags::SHADER_READ);
}

#[test]
fn test_upload_barriers_cover_buffer_and_cube() {
    let acquire = upload_acquire(&SPLIT).unwrap();

    let buffer = vk::Buffer::from_raw(9);
    let buffer_barrier = acquire.buffer_barrier(buffer);
    assert_eq!(buffer_barrier.buffer, buffer);
    assert_eq!(buffer_barrier.offset, 0);
    assert_eq!(buffer_barrier.size, vk::WHOLE_SIZE);
    assert_eq!(buffer_barrier.src_queue_family_index, 0);
    assert_eq!(buffer_barrier.dst_queue_family_index, 1);
    assert_eq!(buffer_barrier.dst_access_mask, vk::AccessFlags::SHADER_READ);

    let cube = vk::Image::from_raw(11);
    let image_barrier = acquire.image_barrier_in(cube, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, 6);
    assert_eq!(image_barrier.old_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(image_barrier.new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(image_barrier.subresource_range.layer_count, 6);
    assert_eq!(image_barrier.src_queue_family_index, 0);
    assert_eq!(image_barrier.dst_queue_family_index, 1);
}
