//! Single-bounce CPU rendering of the scene, for headless snapshots.

use glam::{UVec2, Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use crate::material::MaterialKind;
use crate::picking::{closest_hit, Ray};
use crate::scene::SceneStore;
use crate::viewport::Projection;

const SELECTION_TINT: Vec3 = Vec3::new(1.0, 0.85, 0.3);

/// Shade every pixel of `projection`'s grid. Row 0 of the image is the top.
pub fn render(projection: &Projection, scene: &SceneStore, sky: bool) -> RgbaImage {
    let UVec2 {
        x: width,
        y: height,
    } = projection.resolution;
    let light_direction = Vec3::new(-1.0, -1.0, -1.0).normalize();
    let selected = scene.selected_index();

    RgbaImage::from_fn(width, height, |x, y| {
        // image rows run top-down, pixel grid rows bottom-up
        let pixel = Vec2::new(x as f32, (height - 1 - y) as f32);
        let ray = Ray::through_pixel(projection, pixel);
        let colour = match closest_hit(&ray, scene.spheres()) {
            Some(hit) => {
                let sphere = &scene.spheres()[hit.index];
                let normal = (ray.at(hit.t) - sphere.position) / sphere.radius;
                let material = &sphere.material;
                let intensity = normal.dot(-light_direction).max(0.0); // == cos(angle)

                let mut colour = match material.kind() {
                    MaterialKind::Light => {
                        material.emission_colour * material.emission_strength.min(1.0)
                    }
                    MaterialKind::Diffuse | MaterialKind::Mirror => {
                        material.albedo * (0.1 + 0.9 * intensity)
                            + material.emission_colour * material.emission_strength
                    }
                };
                if selected == Some(hit.index) {
                    colour = colour.lerp(SELECTION_TINT, 0.35);
                }
                colour
            }
            None => background(ray.direction, sky),
        };
        Rgba(convert_rgba(colour.extend(1.0)))
    })
}

fn background(direction: Vec3, sky: bool) -> Vec3 {
    if !sky {
        return Vec3::ZERO;
    }
    let a = 0.5 * (direction.normalize().y + 1.0);
    Vec3::ONE.lerp(Vec3::new(0.5, 0.7, 1.0), a)
}

fn convert_rgba(color: Vec4) -> [u8; 4] {
    let color = color.clamp(Vec4::ZERO, Vec4::ONE);
    let r = (color.x.sqrt() * 255.0) as u8;
    let g = (color.y.sqrt() * 255.0) as u8;
    let b = (color.z.sqrt() * 255.0) as u8;
    let a = (color.w * 255.0) as u8;
    [r, g, b, a]
}
