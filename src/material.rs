//! Surface material record shared with the shading stage.

use glam::Vec3;

/// Largest emission strength the editing surface exposes.
pub const MAX_EMISSION_STRENGTH: f32 = 100.0;

/// Material family, stored in [`Material::kind`] as a `u32` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MaterialKind {
    Diffuse = 0,
    Mirror = 1,
    Light = 2,
}

impl MaterialKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Diffuse),
            1 => Some(Self::Mirror),
            2 => Some(Self::Light),
            _ => None,
        }
    }
}

/// Flat, tagged material. 48 bytes, laid out as three 16-byte rows for the
/// shader's uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Material {
    pub albedo: Vec3,
    /// 0 is a perfect reflection, 1 fully diffuse scattering
    pub roughness: f32,

    pub emission_colour: Vec3,
    pub emission_strength: f32,

    pub reflectivity: f32,
    kind: u32,
    _pad: [u32; 2],
}

impl Material {
    fn new(
        kind: MaterialKind,
        albedo: Vec3,
        roughness: f32,
        emission_colour: Vec3,
        emission_strength: f32,
        reflectivity: f32,
    ) -> Self {
        let mut material = Self {
            albedo,
            roughness,
            emission_colour,
            emission_strength,
            reflectivity,
            kind: kind as u32,
            _pad: [0; 2],
        };
        material.sanitize();
        material
    }

    /// Non-emissive surface mixing diffuse and specular scattering.
    pub fn diffuse(albedo: Vec3, roughness: f32, reflectivity: f32) -> Self {
        Self::new(
            MaterialKind::Diffuse,
            albedo,
            roughness,
            Vec3::ZERO,
            0.0,
            reflectivity,
        )
    }

    /// White reflector; `smoothness` 1 is a perfect mirror.
    pub fn mirror(smoothness: f32) -> Self {
        Self::new(
            MaterialKind::Mirror,
            Vec3::ONE,
            1.0 - smoothness,
            Vec3::ZERO,
            0.0,
            smoothness,
        )
    }

    pub fn light(colour: Vec3, strength: f32) -> Self {
        Self::new(MaterialKind::Light, Vec3::ZERO, 0.0, colour, strength, 0.0)
    }

    pub fn kind(&self) -> MaterialKind {
        MaterialKind::from_tag(self.kind).unwrap_or(MaterialKind::Diffuse)
    }

    pub fn is_emissive(&self) -> bool {
        self.emission_strength > 0.0
    }

    /// Clamp every field into its editable range.
    pub fn sanitize(&mut self) {
        self.albedo = clamp_channels(self.albedo);
        self.emission_colour = clamp_channels(self.emission_colour);
        self.roughness = clamp_or_min(self.roughness, 0.0, 1.0);
        self.reflectivity = clamp_or_min(self.reflectivity, 0.0, 1.0);
        self.emission_strength = clamp_or_min(self.emission_strength, 0.0, MAX_EMISSION_STRENGTH);
        if MaterialKind::from_tag(self.kind).is_none() {
            self.kind = MaterialKind::Diffuse as u32;
        }
    }
}

/// Like `f32::clamp`, but NaN becomes `min`.
fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if !(value >= min) {
        return min;
    }
    value.min(max)
}

fn clamp_channels(colour: Vec3) -> Vec3 {
    Vec3::from_array(colour.to_array().map(|c| clamp_or_min(c, 0.0, 1.0)))
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::splat(0.5), 0.5, 0.5)
    }
}
