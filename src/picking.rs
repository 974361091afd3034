//! Screen-space object picking by casting primary rays at the spheres.

use glam::{Vec2, Vec3};

use crate::{
    accumulation::AccumulationController,
    camera::{Camera, CameraMode},
    scene::{SceneStore, Sphere},
    viewport::Projection,
};

/// Hits closer than this are treated as self-intersection.
pub const T_MIN: f32 = 0.001;
pub const T_MAX: f32 = f32::MAX;

/// Ray `origin + t * direction`. The direction is not normalised.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Primary ray through a pixel of the renderer's grid.
    pub fn through_pixel(projection: &Projection, pixel: Vec2) -> Self {
        Self::new(projection.eye, projection.ray_direction(pixel))
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub t: f32,
}

/// Nearest ray parameter in `(T_MIN, T_MAX)` where the ray meets the sphere.
pub fn hit_sphere(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    // half-b form of |O + tD - C|^2 = r^2
    let oc = sphere.position - ray.origin;
    let a = ray.direction.length_squared();
    let h = ray.direction.dot(oc);
    let c = oc.length_squared() - sphere.radius * sphere.radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    let accept = |t: f32| T_MIN < t && t < T_MAX;
    let near = (h - sqrtd) / a;
    if accept(near) {
        return Some(near);
    }
    let far = (h + sqrtd) / a;
    accept(far).then_some(far)
}

/// First sphere along the ray. Exact ties go to the earlier sphere.
pub fn closest_hit(ray: &Ray, spheres: &[Sphere]) -> Option<Hit> {
    spheres
        .iter()
        .enumerate()
        .filter_map(|(index, sphere)| hit_sphere(ray, sphere).map(|t| Hit { index, t }))
        .fold(None, |best: Option<Hit>, hit| match best {
            Some(best) if best.t <= hit.t => Some(best),
            _ => Some(hit),
        })
}

/// Which sphere, if any, is visible at `pixel` under `projection`.
pub fn pick(projection: &Projection, pixel: Vec2, scene: &SceneStore) -> Option<usize> {
    let ray = Ray::through_pixel(projection, pixel);
    closest_hit(&ray, scene.spheres()).map(|hit| hit.index)
}

/// Pick and apply the selection: a changed selection invalidates the
/// accumulation, and in orbital mode the camera re-centres on the new sphere.
pub fn select(
    projection: &Projection,
    pixel: Vec2,
    scene: &mut SceneStore,
    camera: &mut Camera,
    accumulation: &mut AccumulationController,
) -> Option<usize> {
    let previous = scene.selected_index();
    let picked = pick(projection, pixel, scene);

    // picked is always a valid index into the store
    let _ = scene.set_selected(picked);

    if picked != previous {
        tracing::info!(?picked, ?previous, "selection changed");
        if let Some(sphere) = picked.and_then(|index| scene.get(index).ok()) {
            if camera.mode() == CameraMode::Orbital {
                camera.focus(sphere.position, sphere.radius);
            }
        }
        accumulation.invalidate();
    }
    picked
}
