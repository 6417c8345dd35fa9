/// ShaderModule - precompiled SPIR-V program loaded by path
///
/// Shader contents are opaque; every program uses the `main` entry point.

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::{engine_debug, engine_err};
use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub const ENTRY_POINT: &CStr = c"main";

/// Decode SPIR-V bytes into aligned words; byte-swapped programs are fixed up
pub fn parse_spirv(bytes: &[u8]) -> Result<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| {
        engine_err!("skytrace::vulkan::shader", InitializationFailed,
            "Invalid SPIR-V program: {}", e)
    })
}

/// Vulkan shader module, destroyed on drop
pub struct ShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    pub fn from_bytes(ctx: Arc<GpuContext>, bytes: &[u8]) -> Result<Self> {
        let code = parse_spirv(bytes)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe {
            ctx.device.create_shader_module(&create_info, None).map_err(|e| {
                engine_err!("skytrace::vulkan::shader", InitializationFailed,
                    "Failed to create shader module: {:?}", e)
            })?
        };

        Ok(Self { ctx, module })
    }

    pub fn load(ctx: Arc<GpuContext>, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            engine_err!("skytrace::vulkan::shader", InitializationFailed,
                "Failed to read shader {}: {}", path.display(), e)
        })?;

        engine_debug!("skytrace::vulkan::shader", "Loaded {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(ctx, &bytes)
    }

    /// Stage description using this module
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skytrace_engine::skytrace::Error;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn test_parse_spirv_words() {
        let words = [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0];
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

        assert_eq!(parse_spirv(&bytes).unwrap(), words.to_vec());
    }

    #[test]
    fn test_parse_spirv_rejects_truncated_input() {
        let bytes = [0x03, 0x02, 0x23, 0x07, 0x00];
        assert!(matches!(parse_spirv(&bytes), Err(Error::InitializationFailed(_))));
    }

    #[test]
    fn test_entry_point_is_main() {
        assert_eq!(ENTRY_POINT.to_str().unwrap(), "main");
    }
}
