/// Buffer - GPU buffer with its own device memory
///
/// Memory is allocated explicitly per buffer: the memory type is the lowest
/// index matching both the buffer's requirement bits and the requested
/// property flags.

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::{engine_bail, engine_debug, engine_err};
use std::ptr::NonNull;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, QueueRole};
use crate::vulkan_memory::find_memory_type;

/// Vulkan buffer and its backing memory
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    mapped: Option<NonNull<u8>>,
}

// The mapped pointer is only dereferenced through &self / &mut self
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Create a buffer, allocate matching memory and bind it
    pub fn new(
        ctx: Arc<GpuContext>,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
        size: vk::DeviceSize,
    ) -> Result<Self> {
        if size == 0 {
            engine_bail!("skytrace::vulkan::buffer", ResourceFailed, "Cannot create an empty buffer");
        }

        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            ctx.device.create_buffer(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::buffer", ResourceFailed,
                    "Failed to create buffer: {:?}", e)
            })?
        };

        // Owns the buffer from here, so early returns release it
        let mut owned = Self {
            ctx,
            buffer,
            memory: vk::DeviceMemory::null(),
            size,
            mapped: None,
        };

        let requirements = unsafe { owned.ctx.device.get_buffer_memory_requirements(buffer) };
        let memory_type = find_memory_type(&owned.ctx.memory_properties, requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);

        unsafe {
            owned.memory = owned.ctx.device.allocate_memory(&alloc_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::buffer", ResourceFailed,
                    "Failed to allocate buffer memory: {:?}", e)
            })?;

            owned.ctx.device.bind_buffer_memory(buffer, owned.memory, 0).map_err(|e| {
                engine_err!("skytrace::vulkan::buffer", ResourceFailed,
                    "Failed to bind buffer memory: {:?}", e)
            })?;
        }

        Ok(owned)
    }

    /// Host-visible, coherent buffer mapped for its whole lifetime
    pub fn new_mapped(
        ctx: Arc<GpuContext>,
        usage: vk::BufferUsageFlags,
        size: vk::DeviceSize,
    ) -> Result<Self> {
        let mut buffer = Self::new(
            ctx,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            size,
        )?;
        buffer.map_persistent()?;
        Ok(buffer)
    }

    /// Device-local buffer filled through a staging copy
    ///
    /// The staging buffer is released before returning.
    pub fn new_device_local_with_data(
        ctx: Arc<GpuContext>,
        usage: vk::BufferUsageFlags,
        data: &[u8],
    ) -> Result<Self> {
        let size = data.len() as vk::DeviceSize;

        let mut staging = Self::new_mapped(Arc::clone(&ctx), vk::BufferUsageFlags::TRANSFER_SRC, size)?;
        staging.write(0, data)?;

        let destination = Self::new(
            Arc::clone(&ctx),
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            size,
        )?;

        destination.copy_from(&staging)?;

        engine_debug!("skytrace::vulkan::buffer", "Uploaded {} bytes to device-local buffer", size);
        Ok(destination)
    }

    /// Copy the whole of `source` into this buffer and wait for completion
    pub fn copy_from(&self, source: &Buffer) -> Result<()> {
        let region = vk::BufferCopy::default().size(source.size.min(self.size));
        let (src, dst) = (source.buffer, self.buffer);

        self.ctx.one_shot(QueueRole::Graphics, |device, cmd| unsafe {
            device.cmd_copy_buffer(cmd, src, dst, &[region]);
        })
    }

    /// Map the whole buffer until it is dropped
    pub fn map_persistent(&mut self) -> Result<()> {
        if self.mapped.is_some() {
            return Ok(());
        }

        let pointer = unsafe {
            self.ctx
                .device
                .map_memory(self.memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::buffer", ResourceFailed,
                        "Failed to map buffer memory: {:?}", e)
                })?
        };

        self.mapped = NonNull::new(pointer as *mut u8);
        if self.mapped.is_none() {
            engine_bail!("skytrace::vulkan::buffer", ResourceFailed, "Driver returned a null mapping");
        }
        Ok(())
    }

    /// Mapped contents, if the buffer is mapped
    pub fn mapped(&self) -> Option<&[u8]> {
        self.mapped
            .map(|ptr| unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.size as usize) })
    }

    pub fn mapped_mut(&mut self) -> Option<&mut [u8]> {
        self.mapped
            .map(|ptr| unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.size as usize) })
    }

    /// Write bytes into the mapped region at `offset`
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let Some(region) = self.mapped_mut() else {
            engine_bail!("skytrace::vulkan::buffer", ResourceFailed, "Buffer is not host-mapped");
        };

        let end = offset.checked_add(data.len()).filter(|end| *end <= region.len());
        let Some(end) = end else {
            engine_bail!("skytrace::vulkan::buffer", ResourceFailed,
                "Write of {} bytes at {} overflows a {}-byte buffer", data.len(), offset, region.len());
        };

        region[offset..end].copy_from_slice(data);
        Ok(())
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if self.mapped.take().is_some() {
                self.ctx.device.unmap_memory(self.memory);
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
            if self.memory != vk::DeviceMemory::null() {
                self.ctx.device.free_memory(self.memory, None);
            }
        }
    }
}
