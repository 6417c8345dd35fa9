/// GpuContext - shared Vulkan state for every GPU object
///
/// Owns the instance, the presentation surface, the logical device and the
/// per-role queues with their command pools. Every RAII resource in the
/// backend holds an `Arc<GpuContext>`, so the device outlives all of them.
///
/// Teardown runs in reverse acquisition order: command pools, device,
/// then (through `VulkanInstance`) surface, debug messenger and instance.

use ash::vk;
use skytrace_engine::skytrace::{Error, Result};
use skytrace_engine::skytrace::config::{DebugLayer, DeviceExtension, RendererConfig};
use skytrace_engine::{engine_bail, engine_err, engine_info, engine_warn};
use std::ffi::{c_char, CStr, CString};
use std::sync::Arc;

use crate::vulkan_debug::DebugMessenger;
use crate::vulkan_device_selector::{device_extension_name, select_best, DeviceCandidate};
use crate::vulkan_queue_family::QueueFamilyIndices;
use crate::vulkan_window::PresentationWindow;

/// Vulkan name of a debug layer
pub fn debug_layer_name(layer: DebugLayer) -> &'static CStr {
    match layer {
        DebugLayer::Validation => c"VK_LAYER_KHRONOS_validation",
    }
}

/// Whether validation is compiled in and requested
pub fn validation_enabled(config: &RendererConfig) -> bool {
    cfg!(feature = "vulkan-validation") && config.enable_validation
}

/// Queue role used for submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Graphics,
    Compute,
}

/// A device queue together with the command pool allocating for it
#[derive(Debug, Clone, Copy)]
pub struct QueueContext {
    pub family: u32,
    pub queue: vk::Queue,
    pub command_pool: vk::CommandPool,
}

/// Instance-level objects, destroyed after the device
pub struct VulkanInstance {
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    debug_messenger: Option<DebugMessenger>,
    pub instance: ash::Instance,
    _entry: ash::Entry,
}

impl VulkanInstance {
    /// Load Vulkan, create the instance, the messenger and the surface
    pub fn new(window: &dyn PresentationWindow, config: &RendererConfig) -> Result<Self> {
        let entry = unsafe {
            ash::Entry::load().map_err(|e| {
                engine_err!("skytrace::vulkan", InitializationFailed,
                    "Failed to load Vulkan library: {:?}", e)
            })?
        };

        let validation = validation_enabled(config);
        if config.enable_validation && !validation {
            engine_warn!("skytrace::vulkan",
                "Validation requested but the vulkan-validation feature is disabled");
        }

        let layers: &[DebugLayer] = if validation { config.active_layers() } else { &[] };
        check_layers_available(&entry, layers)?;
        let layer_names: Vec<*const c_char> =
            layers.iter().map(|layer| debug_layer_name(*layer).as_ptr()).collect();

        let mut extension_names = window.required_extensions()?;
        if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let app_name = CString::new(config.app_name.as_str()).map_err(|e| {
            engine_err!("skytrace::vulkan", InitializationFailed,
                "Invalid application name: {}", e)
        })?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"Skytrace")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_3);

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan", InitializationFailed,
                    "Failed to create Vulkan instance: {:?}", e)
            })?
        };

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        // From here on, Drop owns the cleanup of whatever was created
        let mut vulkan = Self {
            surface: vk::SurfaceKHR::null(),
            surface_loader,
            debug_messenger: None,
            instance,
            _entry: entry,
        };

        if validation {
            vulkan.debug_messenger = Some(DebugMessenger::new(
                &vulkan._entry,
                &vulkan.instance,
                config.validation_severity,
            )?);
        }

        vulkan.surface = window.create_surface(&vulkan._entry, &vulkan.instance)?;

        Ok(vulkan)
    }

    /// Query every physical device against the surface
    ///
    /// Only the enumeration itself is fatal; a device whose queries fail is
    /// kept with zeroed support and rejected at selection.
    pub fn device_candidates(&self, required: &[DeviceExtension]) -> Result<Vec<DeviceCandidate>> {
        let physical_devices = unsafe {
            self.instance.enumerate_physical_devices().map_err(|e| {
                engine_err!("skytrace::vulkan", InitializationFailed,
                    "Failed to enumerate physical devices: {:?}", e)
            })?
        };

        Ok(physical_devices
            .into_iter()
            .map(|handle| {
                DeviceCandidate::query(&self.instance, &self.surface_loader, self.surface, handle, required)
            })
            .collect())
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if self.surface != vk::SurfaceKHR::null() {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            if let Some(messenger) = self.debug_messenger.as_mut() {
                messenger.destroy();
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn check_layers_available(entry: &ash::Entry, layers: &[DebugLayer]) -> Result<()> {
    if layers.is_empty() {
        return Ok(());
    }

    let available = unsafe {
        entry.enumerate_instance_layer_properties().map_err(|e| {
            engine_err!("skytrace::vulkan", InitializationFailed,
                "Failed to enumerate instance layers: {:?}", e)
        })?
    };

    for layer in layers {
        let wanted = debug_layer_name(*layer);
        let found = available
            .iter()
            .any(|properties| properties.layer_name_as_c_str().map_or(false, |name| name == wanted));
        if !found {
            engine_bail!("skytrace::vulkan", InitializationFailed,
                "Requested layer {} is not available", wanted.to_string_lossy());
        }
    }

    Ok(())
}

/// Shared GPU context
pub struct GpuContext {
    pub device: ash::Device,
    pub physical_device: vk::PhysicalDevice,
    pub device_name: String,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub queue_families: QueueFamilyIndices,
    pub graphics: QueueContext,
    pub compute: QueueContext,
    pub vulkan: VulkanInstance,
}

impl GpuContext {
    /// Bring up Vulkan for a window: instance, surface, device and queues
    pub fn new(window: &dyn PresentationWindow, config: &RendererConfig) -> Result<Arc<Self>> {
        let vulkan = VulkanInstance::new(window, config)?;
        let selected = select_best(
            vulkan.device_candidates(&config.required_extensions)?,
            &config.required_extensions,
        )?;
        let families = selected.queue_families;
        let physical_device = selected.candidate.handle;

        let priorities = [1.0f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
            })
            .collect();

        let extension_names: Vec<*const c_char> = config
            .required_extensions
            .iter()
            .map(|ext| device_extension_name(*ext).as_ptr())
            .collect();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names);

        let (device, memory_properties) = unsafe {
            let device = vulkan
                .instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_err!("skytrace::vulkan", InitializationFailed,
                        "Failed to create logical device: {:?}", e)
                })?;
            let memory_properties = vulkan.instance.get_physical_device_memory_properties(physical_device);
            (device, memory_properties)
        };

        let (graphics_queue, compute_queue) = unsafe {
            (
                device.get_device_queue(families.graphics, 0),
                device.get_device_queue(families.compute, 0),
            )
        };

        let mut ctx = Self {
            device,
            physical_device,
            device_name: selected.candidate.name,
            memory_properties,
            queue_families: families,
            graphics: QueueContext {
                family: families.graphics,
                queue: graphics_queue,
                command_pool: vk::CommandPool::null(),
            },
            compute: QueueContext {
                family: families.compute,
                queue: compute_queue,
                command_pool: vk::CommandPool::null(),
            },
            vulkan,
        };

        ctx.graphics.command_pool = ctx.create_command_pool(families.graphics)?;
        ctx.compute.command_pool = ctx.create_command_pool(families.compute)?;

        engine_info!("skytrace::vulkan", "GPU context ready on {}", ctx.device_name);

        Ok(Arc::new(ctx))
    }

    fn create_command_pool(&self, family: u32) -> Result<vk::CommandPool> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        unsafe {
            self.device.create_command_pool(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan", InitializationFailed,
                    "Failed to create command pool for family {}: {:?}", family, e)
            })
        }
    }

    pub fn queue(&self, role: QueueRole) -> &QueueContext {
        match role {
            QueueRole::Graphics => &self.graphics,
            QueueRole::Compute => &self.compute,
        }
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.vulkan.surface
    }

    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.vulkan.surface_loader
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.vulkan.instance
    }

    /// Record and submit a single-use command buffer, then block until the
    /// queue has executed it
    pub fn one_shot<F>(&self, role: QueueRole, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let queue = *self.queue(role);
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(queue.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = unsafe {
            self.device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    engine_err!("skytrace::vulkan", ResourceFailed,
                        "Failed to allocate one-shot command buffer: {:?}", e)
                })?
                .into_iter()
                .next()
                .ok_or_else(|| Error::ResourceFailed("No one-shot command buffer returned".to_string()))?
        };

        let result = self.submit_one_shot(queue.queue, command_buffer, record);

        unsafe {
            self.device.free_command_buffers(queue.command_pool, &[command_buffer]);
        }

        result
    }

    fn submit_one_shot<F>(&self, queue: vk::Queue, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device.begin_command_buffer(command_buffer, &begin_info).map_err(|e| {
                engine_err!("skytrace::vulkan", ResourceFailed,
                    "Failed to begin one-shot command buffer: {:?}", e)
            })?;

            record(&self.device, command_buffer);

            self.device.end_command_buffer(command_buffer).map_err(|e| {
                engine_err!("skytrace::vulkan", ResourceFailed,
                    "Failed to end one-shot command buffer: {:?}", e)
            })?;

            let fence = self
                .device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| {
                    engine_err!("skytrace::vulkan", ResourceFailed,
                        "Failed to create one-shot fence: {:?}", e)
                })?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let result = self
                .device
                .queue_submit(queue, &[submit_info], fence)
                .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX))
                .map_err(|e| {
                    engine_err!("skytrace::vulkan", ResourceFailed,
                        "One-shot submission failed: {:?}", e)
                });

            self.device.destroy_fence(fence, None);
            result
        }
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle().map_err(|e| {
                engine_err!("skytrace::vulkan", FrameFailed, "Failed to wait for device idle: {:?}", e)
            })
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            for pool in [self.compute.command_pool, self.graphics.command_pool] {
                if pool != vk::CommandPool::null() {
                    self.device.destroy_command_pool(pool, None);
                }
            }

            self.device.destroy_device(None);
        }
        // self.vulkan drops next: surface, messenger, instance
    }
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
