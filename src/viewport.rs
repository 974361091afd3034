//! Projection plane geometry derived from the camera frame.

use glam::{UVec2, Vec2, Vec3};

/// World-space height of the projection plane.
pub const VIEWPORT_HEIGHT: f32 = 2.0;

/// Orthonormal camera frame. `w` points away from the view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// One pixel step along the rows
    pub pixel_dh: Vec3,
    /// One pixel step along the columns
    pub pixel_dv: Vec3,
    /// Sample centre of pixel (0, 0)
    pub pixel_origin: Vec3,
}

impl Viewport {
    /// Lay the projection plane `focal_length` in front of `eye`, one sample
    /// per output pixel.
    pub fn compute(eye: Vec3, basis: &Basis, focal_length: f32, resolution: UVec2) -> Self {
        let resolution = resolution.max(UVec2::ONE).as_vec2();
        let height = VIEWPORT_HEIGHT;
        let width = height * resolution.x / resolution.y;

        let horizontal = width * basis.u;
        let vertical = height * basis.v;

        let pixel_dh = horizontal / resolution.x;
        let pixel_dv = vertical / resolution.y;

        let top_left = eye - focal_length * basis.w - horizontal / 2.0 - vertical / 2.0;
        let pixel_origin = top_left + 0.5 * (pixel_dh + pixel_dv);

        Self {
            width,
            height,
            pixel_dh,
            pixel_dv,
            pixel_origin,
        }
    }

    /// World-space sample point of pixel `(x, y)`.
    pub fn sample_point(&self, pixel: Vec2) -> Vec3 {
        self.pixel_origin + pixel.x * self.pixel_dh + pixel.y * self.pixel_dv
    }
}

/// Everything the shading stage and picking need from one resolved camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub eye: Vec3,
    pub basis: Basis,
    pub viewport: Viewport,
    pub resolution: UVec2,
}

impl Projection {
    /// Unnormalised primary ray direction through pixel `(x, y)`.
    pub fn ray_direction(&self, pixel: Vec2) -> Vec3 {
        self.viewport.sample_point(pixel) - self.eye
    }
}
