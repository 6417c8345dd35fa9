/// Physical device selection
///
/// Each device is queried once into a `DeviceCandidate`, then scored without
/// touching the driver again. Lower scores win. Devices missing a required
/// extension, a surface format, a present mode or one of the three queue
/// families are rejected outright.

use ash::prelude::VkResult;
use ash::vk;
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::skytrace::config::DeviceExtension;
use skytrace_engine::{engine_debug, engine_err, engine_info, engine_warn};
use std::ffi::CStr;

use crate::vulkan_queue_family::QueueFamilyIndices;

/// Vulkan name of a device extension
pub fn device_extension_name(extension: DeviceExtension) -> &'static CStr {
    match extension {
        DeviceExtension::Swapchain => ash::khr::swapchain::NAME,
    }
}

/// Score band per device type, so that queue layout only ranks devices of
/// the same type
pub fn device_type_penalty(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0x00,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 0x10,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 0x20,
        vk::PhysicalDeviceType::CPU => 0x30,
        _ => 0x40,
    }
}

/// Everything the selector needs to know about one physical device
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub extensions: Vec<String>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
}

impl DeviceCandidate {
    /// Query a physical device against the presentation surface
    ///
    /// Never fails: a query the driver refuses leaves the matching count at
    /// zero, which `score` rejects. Surface support is only asked of devices
    /// that advertise every required extension.
    pub fn query(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        handle: vk::PhysicalDevice,
        required: &[DeviceExtension],
    ) -> Self {
        unsafe {
            let properties = instance.get_physical_device_properties(handle);
            let name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown device".to_string());

            let extensions = match instance.enumerate_device_extension_properties(handle) {
                Ok(properties) => properties
                    .iter()
                    .filter_map(|ext| ext.extension_name_as_c_str().ok())
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .collect(),
                Err(e) => {
                    engine_warn!("skytrace::vulkan::device",
                        "Failed to enumerate extensions of {}: {:?}", name, e);
                    Vec::new()
                }
            };

            let mut candidate = Self {
                handle,
                name,
                device_type: properties.device_type,
                extensions,
                surface_format_count: 0,
                present_mode_count: 0,
                queue_families: instance.get_physical_device_queue_family_properties(handle),
            };

            if candidate.has_extensions(required) {
                candidate.surface_format_count = queried_count(
                    surface_loader.get_physical_device_surface_formats(handle, surface),
                    "surface formats",
                    &candidate.name,
                );
                candidate.present_mode_count = queried_count(
                    surface_loader.get_physical_device_surface_present_modes(handle, surface),
                    "present modes",
                    &candidate.name,
                );
            }

            candidate
        }
    }

    /// Whether every required extension is advertised
    pub fn has_extensions(&self, required: &[DeviceExtension]) -> bool {
        required.iter().all(|ext| {
            let wanted = device_extension_name(*ext).to_string_lossy();
            self.extensions.iter().any(|available| *available == wanted)
        })
    }

    /// Quality score (lower is better), None when the device is unusable
    pub fn score(&self, required: &[DeviceExtension]) -> Option<u32> {
        if !self.has_extensions(required) {
            return None;
        }
        if self.surface_format_count == 0 || self.present_mode_count == 0 {
            return None;
        }

        let families = QueueFamilyIndices::resolve(&self.queue_families)?;

        let mut score = 0;
        if families.graphics != families.compute {
            score += 3;
        }
        if families.graphics != families.transfer {
            score += 1;
        }
        if families.compute != families.transfer {
            score += 1;
        }

        Some(score + device_type_penalty(self.device_type))
    }
}

/// Length of a per-device query result; a failed query counts as nothing
/// supported
pub fn queried_count<T>(result: VkResult<Vec<T>>, what: &str, device: &str) -> usize {
    match result {
        Ok(items) => items.len(),
        Err(e) => {
            engine_warn!("skytrace::vulkan::device", "Failed to query {} of {}: {:?}", what, device, e);
            0
        }
    }
}

/// Device chosen by `select_best`
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    pub candidate: DeviceCandidate,
    pub queue_families: QueueFamilyIndices,
    pub score: u32,
}

/// Pick the lowest-scoring candidate; the first one wins ties
pub fn select_best(
    candidates: Vec<DeviceCandidate>,
    required: &[DeviceExtension],
) -> Result<SelectedDevice> {
    let mut best: Option<(u32, DeviceCandidate)> = None;

    for candidate in candidates {
        match candidate.score(required) {
            Some(score) => {
                engine_debug!("skytrace::vulkan::device", "{} scored {:#x}", candidate.name, score);
                if best.as_ref().map_or(true, |(best_score, _)| score < *best_score) {
                    best = Some((score, candidate));
                }
            }
            None => {
                engine_debug!("skytrace::vulkan::device", "{} rejected", candidate.name);
            }
        }
    }

    let (score, candidate) = best.ok_or_else(|| {
        engine_err!("skytrace::vulkan::device", InitializationFailed,
            "Unable to find a device meeting the requirements")
    })?;

    let queue_families = QueueFamilyIndices::resolve(&candidate.queue_families).ok_or_else(|| {
        Error::InitializationFailed(format!("Queue families of {} vanished", candidate.name))
    })?;

    engine_info!(
        "skytrace::vulkan::device",
        "Selected {} (graphics {}, compute {}, transfer {})",
        candidate.name,
        queue_families.graphics,
        queue_families.compute,
        queue_families.transfer
    );

    Ok(SelectedDevice { candidate, queue_families, score })
}

#[cfg(test)]
#[path = "vulkan_device_selector_tests.rs"]
mod tests;
