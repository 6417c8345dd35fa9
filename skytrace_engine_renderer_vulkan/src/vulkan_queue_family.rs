/// Queue family resolution
///
/// Graphics takes the first family with graphics support. Compute and
/// transfer prefer a dedicated family and otherwise fall back to the last
/// capable family seen.

use ash::vk;

/// Resolved queue family numbers (may alias)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub compute: u32,
    pub transfer: u32,
}

impl QueueFamilyIndices {
    /// Resolve all three families, or None if any of them has no candidate
    pub fn resolve(families: &[vk::QueueFamilyProperties]) -> Option<Self> {
        Some(Self {
            graphics: find_graphics_family(families)?,
            compute: find_compute_family(families)?,
            transfer: find_transfer_family(families)?,
        })
    }

    /// True when graphics and compute work run on different families, which
    /// requires ownership-transfer barriers on the shared target image
    pub fn needs_ownership_transfer(&self) -> bool {
        self.graphics != self.compute
    }

    /// Distinct families, ascending (one device queue is created per entry)
    pub fn unique(&self) -> Vec<u32> {
        let mut families = vec![self.graphics, self.compute, self.transfer];
        families.sort_unstable();
        families.dedup();
        families
    }
}

fn supports(family: &vk::QueueFamilyProperties, flags: vk::QueueFlags) -> bool {
    family.queue_flags.contains(flags)
}

/// First family advertising graphics
pub fn find_graphics_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| supports(family, vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
}

/// Compute-only family if one exists, else the last family with compute
pub fn find_compute_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    let mut fallback = None;

    for (index, family) in families.iter().enumerate() {
        if !supports(family, vk::QueueFlags::COMPUTE) {
            continue;
        }
        if !supports(family, vk::QueueFlags::GRAPHICS) {
            return Some(index as u32);
        }
        fallback = Some(index as u32);
    }

    fallback
}

/// Transfer-only family if one exists, else the last family with transfer
pub fn find_transfer_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    let mut fallback = None;

    for (index, family) in families.iter().enumerate() {
        if !supports(family, vk::QueueFlags::TRANSFER) {
            continue;
        }
        if !supports(family, vk::QueueFlags::GRAPHICS) && !supports(family, vk::QueueFlags::COMPUTE) {
            return Some(index as u32);
        }
        fallback = Some(index as u32);
    }

    fallback
}

#[cfg(test)]
#[path = "vulkan_queue_family_tests.rs"]
mod tests;
