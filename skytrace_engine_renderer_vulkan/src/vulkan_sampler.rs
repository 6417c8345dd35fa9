/// Sampler - the single linear sampler shared by the skybox and target bindings

use ash::vk;
use skytrace_engine::skytrace::Result;
use skytrace_engine::engine_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Linear filtering, clamp-to-border with an opaque white border, no anisotropy
pub(crate) fn linear_border_sampler_info() -> vk::SamplerCreateInfo<'static> {
    vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
        .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
        .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
        .mip_lod_bias(0.0)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::NEVER)
        .min_lod(0.0)
        .max_lod(0.0)
        .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
        .unnormalized_coordinates(false)
}

pub struct Sampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
}

impl Sampler {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let sampler = unsafe {
            ctx.device
                .create_sampler(&linear_border_sampler_info(), None)
                .map_err(|e| {
                    engine_err!("skytrace::vulkan::sampler", InitializationFailed,
                        "Failed to create sampler: {:?}", e)
                })?
        };

        Ok(Self { ctx, sampler })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_clamps_to_white_border() {
        let info = linear_border_sampler_info();
        assert_eq!(info.address_mode_u, vk::SamplerAddressMode::CLAMP_TO_BORDER);
        assert_eq!(info.address_mode_v, vk::SamplerAddressMode::CLAMP_TO_BORDER);
        assert_eq!(info.address_mode_w, vk::SamplerAddressMode::CLAMP_TO_BORDER);
        assert_eq!(info.border_color, vk::BorderColor::FLOAT_OPAQUE_WHITE);
        assert_eq!(info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(info.anisotropy_enable, vk::FALSE);
        assert_eq!(info.max_lod, 0.0);
    }
}
