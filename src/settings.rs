//! Tunables and persistent settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::{MAX_FOCAL_LENGTH, MIN_DISTANCE, MIN_FOCAL_LENGTH, PHI_MAX, PHI_MIN};
use crate::error::SettingsError;

pub const MAX_BOUNCE_DEPTH: u32 = 100;
pub const MAX_SAMPLES_PER_PIXEL: u32 = 20;

/// Shading options sent to the renderer every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub max_bounce_depth: u32,
    pub samples_per_pixel: u32,
    pub temporal_aa: bool,
    pub gamma_correction: bool,
    pub sky: bool,
    /// Jitter primary rays inside the pixel
    pub pixel_sampling: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_bounce_depth: 5,
            samples_per_pixel: 1,
            temporal_aa: true,
            gamma_correction: true,
            sky: false,
            pixel_sampling: true,
        }
    }
}

impl RenderSettings {
    pub fn clamp(&mut self) {
        self.max_bounce_depth = self.max_bounce_depth.clamp(1, MAX_BOUNCE_DEPTH);
        self.samples_per_pixel = self.samples_per_pixel.clamp(1, MAX_SAMPLES_PER_PIXEL);
    }
}

/// Application settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderSettings,

    // Window
    pub window_width: u32,
    pub window_height: u32,

    // Camera
    pub camera_distance: f32,
    pub camera_theta: f32,
    pub camera_phi: f32,
    pub focal_length: f32,

    // Controls
    /// World units per second in free-fly mode
    pub fly_speed: f32,
    /// Scales the drag-to-angle mapping
    pub drag_sensitivity: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            window_width: 1280,
            window_height: 720,
            camera_distance: 5.0,
            camera_theta: 0.0,
            camera_phi: std::f32::consts::FRAC_PI_2,
            focal_length: 3.0,
            fly_speed: 2.0,
            drag_sensitivity: 1.0,
        }
    }
}

impl Settings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("sphere-tracer");
            p.push("settings.json");
            p
        })
    }

    /// Load from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|err| {
                tracing::warn!("ignoring settings at {}: {err}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&json)?;
        settings.validate();
        Ok(settings)
    }

    /// Save to the user config directory. Failures are logged, not returned.
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(err) = self.save_to(&path) {
                tracing::warn!("could not save settings to {}: {err}", path.display());
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp every value into the range the viewer accepts.
    pub fn validate(&mut self) {
        self.render.clamp();
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
        self.camera_distance = self.camera_distance.max(MIN_DISTANCE);
        self.camera_phi = self.camera_phi.clamp(PHI_MIN, PHI_MAX);
        self.focal_length = self.focal_length.clamp(MIN_FOCAL_LENGTH, MAX_FOCAL_LENGTH);
        self.fly_speed = self.fly_speed.max(0.0);
        self.drag_sensitivity = self.drag_sensitivity.max(0.0);
    }
}
