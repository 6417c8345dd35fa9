//! Keyboard-driven fly camera
//!
//! Arrow keys turn, WASD moves on the horizontal plane, Space and Left Shift
//! move up and down. The ray tracer consumes the inverse projection and the
//! camera-to-world transform.

use skytrace_engine::glam::{Mat4, Vec3, Vec4};
use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_2, TAU};
use winit::keyboard::KeyCode;

const MOVE_SPEED: f32 = 10.0;
const LOOK_SPEED: f32 = 1.5;
const NEAR: f32 = 0.1;
const FAR: f32 = 10.0;

pub struct Camera {
    projection: Mat4,
    position: Vec3,
    /// Pitch (x), yaw (y), roll (z) in radians
    rotation: Vec3,
}

impl Camera {
    /// Camera at the origin looking down +z
    ///
    /// # Arguments
    ///
    /// * `fov_degrees` - Vertical field of view
    /// * `aspect` - Width over height
    pub fn new(fov_degrees: f32, aspect: f32) -> Self {
        Self {
            projection: inverse_projection(fov_degrees, aspect),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }

    /// Apply the currently held keys for `dt` seconds
    pub fn update(&mut self, keys: &HashSet<KeyCode>, dt: f32) {
        let held = |key| if keys.contains(&key) { 1.0 } else { 0.0 };

        self.rotate(
            Vec3::new(
                held(KeyCode::ArrowDown) - held(KeyCode::ArrowUp),
                held(KeyCode::ArrowRight) - held(KeyCode::ArrowLeft),
                0.0,
            ),
            dt,
        );

        let forward = self.forward();
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        let direction = forward * (held(KeyCode::KeyW) - held(KeyCode::KeyS))
            + right * (held(KeyCode::KeyD) - held(KeyCode::KeyA))
            + Vec3::Y * (held(KeyCode::Space) - held(KeyCode::ShiftLeft));
        self.translate(direction, dt);
    }

    /// Turn along `direction` at the look speed; pitch stays within ±π/2
    pub fn rotate(&mut self, direction: Vec3, dt: f32) {
        if direction.length_squared() > f32::EPSILON {
            self.rotation += LOOK_SPEED * direction.normalize() * dt;
        }
        self.rotation.x = self.rotation.x.clamp(-FRAC_PI_2, FRAC_PI_2);
        self.rotation.y = self.rotation.y.rem_euclid(TAU);
    }

    /// Move along `direction` at the move speed
    pub fn translate(&mut self, direction: Vec3, dt: f32) {
        if direction.length_squared() > f32::EPSILON {
            self.position += MOVE_SPEED * direction.normalize() * dt;
        }
    }

    /// Horizontal forward direction for the current yaw
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.rotation.y.sin(), 0.0, self.rotation.y.cos())
    }

    /// Camera-to-world transform (yaw, then pitch, then roll)
    pub fn world_transform(&self) -> Mat4 {
        let (s1, c1) = self.rotation.y.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s3, c3) = self.rotation.z.sin_cos();

        Mat4::from_cols(
            Vec4::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1, 0.0),
            Vec4::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3, 0.0),
            Vec4::new(c2 * s1, -s2, c1 * c2, 0.0),
            self.position.extend(1.0),
        )
    }

    /// Inverse projection used to build primary rays
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }
}

/// Left-handed, depth 0..1 perspective, inverted
fn inverse_projection(fov_degrees: f32, aspect: f32) -> Mat4 {
    let tan_half_fov = (fov_degrees.to_radians() / 2.0).tan();

    let projection = Mat4::from_cols(
        Vec4::new(1.0 / (aspect * tan_half_fov), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0 / tan_half_fov, 0.0, 0.0),
        Vec4::new(0.0, 0.0, FAR / (FAR - NEAR), 1.0),
        Vec4::new(0.0, 0.0, -(FAR * NEAR) / (FAR - NEAR), 0.0),
    );
    projection.inverse()
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
