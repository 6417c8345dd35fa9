//! Unit tests for settings.rs

use crate::settings::*;
use crate::skytrace::Error;
use glam::{Mat4, Vec3};
use std::mem::{align_of, offset_of, size_of};

#[test]
fn test_layout_matches_shader_block() {
    assert_eq!(size_of::<Settings>(), 160);
    assert_eq!(Settings::SIZE, 160);
    assert_eq!(align_of::<Settings>() % 16, 0);
    assert_eq!(offset_of!(Settings, projection), 0);
    assert_eq!(offset_of!(Settings, transform), 64);
    assert_eq!(offset_of!(Settings, directional_light), 128);
    assert_eq!(offset_of!(Settings, angle), 144);
}

#[test]
fn test_advance_accumulates_exactly() {
    let mut settings = Settings::default();
    settings.advance(0.5, DEFAULT_ANGLE_RATE);
    assert_eq!(settings.angle, 0.4);
}

#[test]
fn test_advance_is_additive() {
    let mut settings = Settings::default();
    settings.angle = 1.0;
    settings.advance(0.5, 2.0);
    assert_eq!(settings.angle, 2.0);
}

#[test]
fn test_light_is_normalized_and_packed() {
    let light = DirectionalLight::new(Vec3::new(0.0, -4.0, 0.0), 0.75);
    let packed = light.packed();
    assert_eq!(packed.x, 0.0);
    assert_eq!(packed.y, -1.0);
    assert_eq!(packed.z, 0.0);
    assert_eq!(packed.w, 0.75);
}

#[test]
fn test_default_light_direction() {
    let light = DirectionalLight::default();
    let expected = Vec3::new(1.0, -2.0, 0.5).normalize();
    assert!((light.direction - expected).length() < 1e-6);
    assert_eq!(light.intensity, 1.0);
}

#[test]
fn test_mapped_round_trip_is_byte_identical() {
    let mut settings = Settings::new(
        Mat4::from_scale(Vec3::splat(2.0)),
        Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        DirectionalLight::default(),
    );
    settings.angle = 3.25;

    let mut mapped = vec![0u8; Settings::SIZE];
    settings.write_to(&mut mapped).unwrap();

    assert_eq!(mapped.as_slice(), bytemuck::bytes_of(&settings));
    let back = Settings::read_from(&mapped).unwrap();
    assert_eq!(bytemuck::bytes_of(&back), bytemuck::bytes_of(&settings));
}

#[test]
fn test_write_rejects_short_region() {
    let mut mapped = vec![0u8; Settings::SIZE - 1];
    let result = Settings::default().write_to(&mut mapped);
    assert!(matches!(result, Err(Error::ResourceFailed(_))));
}

#[test]
fn test_read_rejects_short_region() {
    let result = Settings::read_from(&[0u8; 16]);
    assert!(matches!(result, Err(Error::ResourceFailed(_))));
}
