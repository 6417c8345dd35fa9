//! Per-frame settings uniform
//!
//! `Settings` is copied byte for byte into the persistently mapped uniform
//! buffer read by the compute shader. Field order and 16-byte alignment must
//! match the shader block:
//!
//! | offset | field             |
//! |--------|-------------------|
//! | 0      | projection (mat4) |
//! | 64     | transform (mat4)  |
//! | 128    | directional_light |
//! | 144    | angle             |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use crate::error::{Error, Result};

/// Angle accumulation rate used by the reference scene (radians per second)
pub const DEFAULT_ANGLE_RATE: f32 = 0.8;

/// Directional light: unit direction plus intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Direction is normalized on construction
    pub fn new(direction: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            intensity,
        }
    }

    /// Packed as (x, y, z, intensity)
    pub fn packed(&self) -> Vec4 {
        self.direction.extend(self.intensity)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, -2.0, 0.5), 1.0)
    }
}

/// Settings block consumed by the ray tracing shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Settings {
    /// Inverse projection used to build primary rays
    pub projection: Mat4,
    /// Camera world transform
    pub transform: Mat4,
    /// xyz = light direction, w = intensity
    pub directional_light: Vec4,
    /// Time accumulator; the core assigns it no meaning
    pub angle: f32,
    _padding: [f32; 3],
}

impl Settings {
    /// Size of the uniform block in bytes
    pub const SIZE: usize = std::mem::size_of::<Settings>();

    pub fn new(projection: Mat4, transform: Mat4, light: DirectionalLight) -> Self {
        Self {
            projection,
            transform,
            directional_light: light.packed(),
            angle: 0.0,
            _padding: [0.0; 3],
        }
    }

    /// Accumulate `elapsed * rate` into the angle
    pub fn advance(&mut self, elapsed_seconds: f32, rate: f32) {
        self.angle += elapsed_seconds * rate;
    }

    /// Copy this block into a mapped region
    pub fn write_to(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() < Self::SIZE {
            return Err(Error::ResourceFailed(format!(
                "Settings need {} bytes, mapped region has {}",
                Self::SIZE,
                dst.len()
            )));
        }
        dst[..Self::SIZE].copy_from_slice(bytemuck::bytes_of(self));
        Ok(())
    }

    /// Read a block back from a mapped region
    pub fn read_from(src: &[u8]) -> Result<Self> {
        if src.len() < Self::SIZE {
            return Err(Error::ResourceFailed(format!(
                "Settings need {} bytes, mapped region has {}",
                Self::SIZE,
                src.len()
            )));
        }
        Ok(bytemuck::pod_read_unaligned(&src[..Self::SIZE]))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, DirectionalLight::default())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
