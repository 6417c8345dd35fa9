//! Unit tests for camera.rs

use crate::camera::*;
use skytrace_engine::glam::{Mat4, Vec3, Vec4};
use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_2, PI};
use winit::keyboard::KeyCode;

const EPS: f32 = 1e-5;

fn keys(held: &[KeyCode]) -> HashSet<KeyCode> {
    held.iter().copied().collect()
}

#[test]
fn test_projection_is_inverted_perspective() {
    let camera = Camera::new(40.0, 4.0 / 3.0);
    let projection = camera.projection().inverse();
    let tan_half_fov = (20.0f32).to_radians().tan();

    assert!((projection.x_axis.x - 1.0 / (4.0 / 3.0 * tan_half_fov)).abs() < EPS);
    assert!((projection.y_axis.y - 1.0 / tan_half_fov).abs() < EPS);
    assert!((projection.z_axis.z - 10.0 / 9.9).abs() < EPS);
    assert!((projection.z_axis.w - 1.0).abs() < EPS);
    assert!((projection.w_axis.z + 1.0 / 9.9).abs() < EPS);
}

#[test]
fn test_near_plane_maps_to_depth_zero() {
    let camera = Camera::new(40.0, 1.0);
    let clip = camera.projection().inverse() * Vec4::new(0.0, 0.0, 0.1, 1.0);
    assert!((clip.z / clip.w).abs() < EPS);
}

#[test]
fn test_initial_transform_is_identity() {
    let camera = Camera::new(40.0, 1.0);
    assert!(camera.world_transform().abs_diff_eq(Mat4::IDENTITY, EPS));
}

#[test]
fn test_forward_key_moves_along_z() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.update(&keys(&[KeyCode::KeyW]), 0.5);

    assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), EPS));
    assert!(camera.world_transform().w_axis.abs_diff_eq(Vec4::new(0.0, 0.0, 5.0, 1.0), EPS));
}

#[test]
fn test_diagonal_movement_is_normalized() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.update(&keys(&[KeyCode::KeyW, KeyCode::KeyD, KeyCode::Space]), 1.0);

    assert!((camera.position().length() - 10.0).abs() < 1e-4);
}

#[test]
fn test_opposite_keys_cancel() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.update(&keys(&[KeyCode::KeyW, KeyCode::KeyS, KeyCode::ArrowLeft, KeyCode::ArrowRight]), 1.0);

    assert_eq!(camera.position(), Vec3::ZERO);
    assert_eq!(camera.rotation(), Vec3::ZERO);
}

#[test]
fn test_yaw_turns_forward_direction() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.rotate(Vec3::Y, FRAC_PI_2 / 1.5);

    assert!(camera.forward().abs_diff_eq(Vec3::X, EPS));
    assert!(camera.world_transform().z_axis.truncate().abs_diff_eq(Vec3::X, EPS));
}

#[test]
fn test_pitch_is_clamped() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.update(&keys(&[KeyCode::ArrowDown]), 10.0);
    assert!((camera.rotation().x - FRAC_PI_2).abs() < EPS);

    camera.update(&keys(&[KeyCode::ArrowUp]), 20.0);
    assert!((camera.rotation().x + FRAC_PI_2).abs() < EPS);
}

#[test]
fn test_yaw_wraps() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.rotate(-Vec3::Y, PI / 1.5);

    assert!((camera.rotation().y - PI).abs() < 1e-4);
}

#[test]
fn test_strafe_right_follows_yaw() {
    let mut camera = Camera::new(40.0, 1.0);
    camera.update(&keys(&[KeyCode::KeyD]), 0.1);

    assert!(camera.position().abs_diff_eq(Vec3::X, EPS));
}
