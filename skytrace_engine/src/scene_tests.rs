//! Unit tests for scene.rs

use crate::scene::*;
use crate::skytrace::Error;
use glam::Vec3;
use std::mem::{offset_of, size_of};

fn sphere() -> Sphere {
    Sphere::new(Vec3::new(7.0, 1.0, 14.0), 2.0, Vec3::splat(0.5), Vec3::ZERO)
}

fn ground() -> Plane {
    Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, Vec3::ONE, Vec3::splat(0.3))
}

#[test]
fn test_sphere_layout() {
    assert_eq!(size_of::<Sphere>(), 48);
    assert_eq!(offset_of!(Sphere, position), 0);
    assert_eq!(offset_of!(Sphere, radius), 12);
    assert_eq!(offset_of!(Sphere, albedo), 16);
    assert_eq!(offset_of!(Sphere, specular), 32);
}

#[test]
fn test_plane_layout() {
    assert_eq!(size_of::<Plane>(), 64);
    assert_eq!(offset_of!(Plane, position), 0);
    assert_eq!(offset_of!(Plane, normal), 16);
    assert_eq!(offset_of!(Plane, albedo), 32);
    assert_eq!(offset_of!(Plane, specular), 48);
}

#[test]
fn test_plane_normal_is_normalized() {
    let plane = Plane::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), Vec3::ONE, Vec3::ZERO);
    assert_eq!(plane.normal, Vec3::Y);
}

#[test]
fn test_scene_byte_views() {
    let scene = Scene::new(vec![sphere(), sphere(), sphere()], vec![ground()]).unwrap();
    assert_eq!(scene.sphere_bytes().len(), 3 * 48);
    assert_eq!(scene.plane_bytes().len(), 64);

    let radius = f32::from_ne_bytes(scene.sphere_bytes()[12..16].try_into().unwrap());
    assert_eq!(radius, 2.0);
}

#[test]
fn test_scene_keeps_order() {
    let far = Sphere::new(Vec3::splat(100.0), 1.0, Vec3::ONE, Vec3::ONE);
    let scene = Scene::new(vec![sphere(), far], vec![ground()]).unwrap();
    assert_eq!(scene.spheres()[1], far);
    assert_eq!(scene.planes()[0], ground());
}

#[test]
fn test_empty_spheres_rejected() {
    let result = Scene::new(Vec::new(), vec![ground()]);
    assert!(matches!(result, Err(Error::ResourceFailed(_))));
}

#[test]
fn test_empty_planes_rejected() {
    let result = Scene::new(vec![sphere()], Vec::new());
    assert!(matches!(result, Err(Error::ResourceFailed(_))));
}
