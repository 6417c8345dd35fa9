//! Procedural demo scene: a grid of spheres over a ground plane

use rand::Rng;
use skytrace_engine::glam::Vec3;
use skytrace_engine::skytrace::Result;
use skytrace_engine::skytrace::render::{Plane, Scene, Sphere};

pub const GRID_SIZE: usize = 5;
pub const SPHERE_SPACING: f32 = 7.0;
pub const SPHERE_RADIUS: f32 = 2.0;

/// Half the spheres are diffuse with a random albedo, the rest are mirrors
/// tinted with a random specular color
pub fn build_scene<R: Rng>(rng: &mut R) -> Result<Scene> {
    let mut spheres = Vec::with_capacity(GRID_SIZE * GRID_SIZE);

    for i in 0..GRID_SIZE {
        for j in 0..GRID_SIZE {
            let position = Vec3::new(i as f32 * SPHERE_SPACING, 1.0, j as f32 * SPHERE_SPACING);
            let color = Vec3::new(rng.gen(), rng.gen(), rng.gen());

            let sphere = if rng.gen_bool(0.5) {
                Sphere::new(position, SPHERE_RADIUS, color, Vec3::splat(0.1))
            } else {
                Sphere::new(position, SPHERE_RADIUS, Vec3::ZERO, color)
            };
            spheres.push(sphere);
        }
    }

    let ground = Plane::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, Vec3::ONE, Vec3::splat(0.3));

    Scene::new(spheres, vec![ground])
}
