use std::f32::consts::{FRAC_PI_2, PI};

use glam::{UVec2, Vec3};

use crate::util::math::{spherical_to_cartesian, wrap_angle};
use crate::viewport::{Basis, Projection, Viewport};

/// Polar angle bounds. Keeps `w` away from the world up axis.
pub const PHI_MIN: f32 = 0.1;
pub const PHI_MAX: f32 = PI - 0.1;

pub const MIN_DISTANCE: f32 = 0.1;
/// Zoom step when there is no selected sphere to scale by.
pub const DEFAULT_ZOOM_STEP: f32 = 0.1;
/// Orbit radius per unit of target radius when framing an object.
pub const FOCUS_DISTANCE_FACTOR: f32 = 10.0;

pub const MIN_FOCAL_LENGTH: f32 = 0.1;
pub const MAX_FOCAL_LENGTH: f32 = 10.0;

const WORLD_UP: Vec3 = Vec3::Y;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Spherical angles around `look_at`; the eye is derived
    Orbital,
    /// The eye is authoritative; the angles only steer the view direction
    FreeFly,
}

/// Free-fly translation axes, relative to the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyAxis {
    /// Along the view direction (`-w`)
    Forward,
    /// Along `u`
    Right,
    /// Along `v`
    Up,
}

/// Camera with lazily recomputed basis and viewport.
///
/// Every mutator marks the camera dirty. [`Camera::resolve`] is the only
/// place the cached frame and viewport are rebuilt.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    look_at: Vec3,
    theta: f32,
    phi: f32,
    distance: f32,
    focal_length: f32,
    mode: CameraMode,
    resolution: UVec2,

    basis: Basis,
    viewport: Viewport,
    dirty: bool,
}

impl Camera {
    pub fn new(resolution: UVec2) -> Self {
        let basis = Basis {
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        };
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
            theta: 0.0,
            phi: FRAC_PI_2,
            distance: 5.0,
            focal_length: 3.0,
            mode: CameraMode::Orbital,
            resolution: resolution.max(UVec2::ONE),
            viewport: Viewport::compute(Vec3::ZERO, &basis, 3.0, resolution),
            basis,
            dirty: true,
        }
    }

    pub fn set_orbital(&mut self, theta: f32, phi: f32, distance: f32, look_at: Vec3) {
        self.mode = CameraMode::Orbital;
        self.theta = wrap_angle(theta);
        self.phi = clamp_phi(phi);
        self.distance = distance.max(MIN_DISTANCE);
        self.look_at = look_at;
        self.dirty = true;
    }

    pub fn set_free_fly(&mut self, position: Vec3, theta: f32, phi: f32) {
        self.mode = CameraMode::FreeFly;
        self.position = position;
        self.theta = wrap_angle(theta);
        self.phi = clamp_phi(phi);
        self.dirty = true;
    }

    /// Rotate the view. Theta wraps around, phi stops short of the poles.
    pub fn pan(&mut self, d_theta: f32, d_phi: f32) {
        self.theta = wrap_angle(self.theta + d_theta);
        self.phi = clamp_phi(self.phi + d_phi);
        self.dirty = true;
    }

    /// Move along the orbit radius, scaled by the size of the object being
    /// inspected. Returns `false` (and does nothing) in free-fly mode.
    pub fn zoom(&mut self, delta: f32, reference_radius: f32) -> bool {
        if self.mode != CameraMode::Orbital {
            return false;
        }
        let step = if reference_radius > 0.0 {
            reference_radius / 5.0
        } else {
            DEFAULT_ZOOM_STEP
        };
        self.distance = (self.distance + delta * step).max(MIN_DISTANCE);
        self.dirty = true;
        true
    }

    /// Translate the eye along the current view frame. Returns `false` (and
    /// does nothing) in orbital mode.
    pub fn move_free_fly(&mut self, axis: FlyAxis, amount: f32) -> bool {
        if self.mode != CameraMode::FreeFly {
            return false;
        }
        let basis = frame(spherical_to_cartesian(self.theta, self.phi));
        let direction = match axis {
            FlyAxis::Forward => -basis.w,
            FlyAxis::Right => basis.u,
            FlyAxis::Up => basis.v,
        };
        self.position += direction * amount;
        self.dirty = true;
        true
    }

    /// Frame an object: look at its centre from a distance proportional to its radius.
    pub fn focus(&mut self, target: Vec3, target_radius: f32) {
        self.look_at = target;
        self.distance = (target_radius * FOCUS_DISTANCE_FACTOR).max(MIN_DISTANCE);
        self.dirty = true;
    }

    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.focal_length = focal_length.clamp(MIN_FOCAL_LENGTH, MAX_FOCAL_LENGTH);
        self.dirty = true;
    }

    /// Output resolution changed. No-op when the size is unchanged.
    pub fn resize(&mut self, resolution: UVec2) {
        let resolution = resolution.max(UVec2::ONE);
        if resolution != self.resolution {
            self.resolution = resolution;
            self.dirty = true;
        }
    }

    /// Switch mode without moving the view.
    pub fn set_mode(&mut self, mode: CameraMode) {
        if mode == self.mode {
            return;
        }
        match mode {
            CameraMode::FreeFly => {
                self.position = self.eye();
            }
            CameraMode::Orbital => {
                let w = spherical_to_cartesian(self.theta, self.phi);
                self.distance = self.look_at.distance(self.position).max(MIN_DISTANCE);
                self.look_at = self.position - w * self.distance;
            }
        }
        self.mode = mode;
        self.dirty = true;
        tracing::info!(?mode, "camera mode changed");
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(match self.mode {
            CameraMode::Orbital => CameraMode::FreeFly,
            CameraMode::FreeFly => CameraMode::Orbital,
        });
    }

    /// Rebuild the basis and viewport if anything changed since the last call.
    pub fn resolve(&mut self) -> Projection {
        if self.dirty {
            let w = match self.mode {
                CameraMode::Orbital => {
                    self.position =
                        self.look_at + self.distance * spherical_to_cartesian(self.theta, self.phi);
                    (self.position - self.look_at).normalize()
                }
                CameraMode::FreeFly => {
                    self.distance = self.look_at.distance(self.position).max(MIN_DISTANCE);
                    spherical_to_cartesian(self.theta, self.phi)
                }
            };
            self.basis = frame(w);
            debug_assert!(
                self.basis.u.is_finite() && self.basis.u.length_squared() > 0.5,
                "degenerate camera basis at phi = {}",
                self.phi
            );
            self.viewport =
                Viewport::compute(self.position, &self.basis, self.focal_length, self.resolution);
            self.dirty = false;

            tracing::debug!(
                mode = ?self.mode,
                theta = self.theta,
                phi = self.phi,
                eye = ?self.position,
                viewport = ?(self.viewport.width, self.viewport.height),
                pixel_dh = ?self.viewport.pixel_dh,
                pixel_dv = ?self.viewport.pixel_dv,
                pixel_origin = ?self.viewport.pixel_origin,
                "camera resolved"
            );
        }
        self.projection_unchecked()
    }

    /// Cached projection, or `None` while a mutation is pending.
    pub fn projection(&self) -> Option<Projection> {
        (!self.dirty).then(|| self.projection_unchecked())
    }

    fn projection_unchecked(&self) -> Projection {
        Projection {
            eye: self.position,
            basis: self.basis,
            viewport: self.viewport,
            resolution: self.resolution,
        }
    }

    /// Current eye point, including mutations not yet resolved.
    pub fn eye(&self) -> Vec3 {
        match self.mode {
            CameraMode::Orbital => {
                self.look_at + self.distance * spherical_to_cartesian(self.theta, self.phi)
            }
            CameraMode::FreeFly => self.position,
        }
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn up(&self) -> Vec3 {
        WORLD_UP
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(UVec2::new(800, 600))
    }
}

fn clamp_phi(phi: f32) -> f32 {
    if phi.is_nan() {
        return FRAC_PI_2;
    }
    phi.clamp(PHI_MIN, PHI_MAX)
}

fn frame(w: Vec3) -> Basis {
    let u = WORLD_UP.cross(w).normalize();
    let v = w.cross(u);
    Basis { u, v, w }
}
