//! Error types for the tracer.

use thiserror::Error;

/// Rejected scene store operations. The store is left unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// Adding a sphere beyond the fixed capacity
    #[error("Scene is full (capacity: {capacity})")]
    CapacityExceeded { capacity: usize },

    /// Sphere index does not refer to a stored sphere
    #[error("Sphere index {index} out of range (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Settings persistence failures.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings file
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while bringing up the window surface and GPU device.
#[derive(Error, Debug)]
pub enum SurfaceInitError {
    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("No compatible GPU adapter found")]
    NoAdapter,

    #[error("Device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Surface is not supported by the adapter")]
    UnsupportedSurface,
}
