//! Scene primitives
//!
//! Spheres and planes use std430 layout: every vec3 that is followed by
//! another vec3 is padded to 16 bytes.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use crate::error::{Error, Result};

/// Sphere as laid out in the sphere storage buffer (48 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
    pub albedo: Vec3,
    _pad0: f32,
    pub specular: Vec3,
    _pad1: f32,
}

impl Sphere {
    pub fn new(position: Vec3, radius: f32, albedo: Vec3, specular: Vec3) -> Self {
        Self {
            position,
            radius,
            albedo,
            _pad0: 0.0,
            specular,
            _pad1: 0.0,
        }
    }
}

/// Infinite plane as laid out in the plane storage buffer (64 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Plane {
    pub position: Vec3,
    _pad0: f32,
    pub normal: Vec3,
    _pad1: f32,
    pub albedo: Vec3,
    _pad2: f32,
    pub specular: Vec3,
    _pad3: f32,
}

impl Plane {
    /// Normal is normalized on construction
    pub fn new(position: Vec3, normal: Vec3, albedo: Vec3, specular: Vec3) -> Self {
        Self {
            position,
            _pad0: 0.0,
            normal: normal.normalize_or_zero(),
            _pad1: 0.0,
            albedo,
            _pad2: 0.0,
            specular,
            _pad3: 0.0,
        }
    }
}

/// Immutable render input uploaded once at startup
#[derive(Debug, Clone)]
pub struct Scene {
    spheres: Vec<Sphere>,
    planes: Vec<Plane>,
}

impl Scene {
    /// Both sequences must be non-empty; zero-sized storage buffers are invalid
    pub fn new(spheres: Vec<Sphere>, planes: Vec<Plane>) -> Result<Self> {
        if spheres.is_empty() {
            return Err(Error::ResourceFailed("Scene has no spheres".to_string()));
        }
        if planes.is_empty() {
            return Err(Error::ResourceFailed("Scene has no planes".to_string()));
        }
        Ok(Self { spheres, planes })
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Sphere array as raw bytes, ready for a staged upload
    pub fn sphere_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spheres)
    }

    /// Plane array as raw bytes, ready for a staged upload
    pub fn plane_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.planes)
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
