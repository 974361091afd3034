//! Per-frame orchestration of camera, scene and accumulation.

use glam::{UVec2, Vec2, Vec3};

use crate::{
    accumulation::AccumulationController,
    camera::Camera,
    error::SceneError,
    picking,
    renderer::{FrameUniforms, RenderSurface},
    scene::{SceneStore, Sphere},
    settings::{RenderSettings, Settings},
    viewport::Projection,
};

/// Owns the interactive state and drives a [`RenderSurface`].
#[derive(Debug)]
pub struct Viewer {
    camera: Camera,
    scene: SceneStore,
    accumulation: AccumulationController,
    render_settings: RenderSettings,
    /// Projection of the last drawn frame; clicks are resolved against it
    last_projection: Option<Projection>,
}

impl Viewer {
    pub fn new(camera: Camera, scene: SceneStore, render_settings: RenderSettings) -> Self {
        let mut render_settings = render_settings;
        render_settings.clamp();
        Self {
            accumulation: AccumulationController::new(render_settings.temporal_aa),
            camera,
            scene,
            render_settings,
            last_projection: None,
        }
    }

    /// Viewer over the demo world configured from persisted settings.
    pub fn from_settings(settings: &Settings, resolution: UVec2) -> Self {
        let mut camera = Camera::new(resolution);
        camera.set_orbital(
            settings.camera_theta,
            settings.camera_phi,
            settings.camera_distance,
            Vec3::ZERO,
        );
        camera.set_focal_length(settings.focal_length);
        Self::new(camera, SceneStore::demo_world(), settings.render)
    }

    /// Resolve the camera, decide blending and hand the frame to `surface`.
    pub fn render_frame<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        elapsed_time: f32,
    ) -> Result<(), S::Error> {
        if self.camera.is_dirty() {
            self.accumulation.invalidate();
        }
        let projection = self.camera.resolve();

        let frame_count = self.accumulation.rendered_frame_count();
        let history_samples = self.accumulation.history_samples();
        let blend_enabled = self.accumulation.tick();
        let uniforms = FrameUniforms::new(
            &projection,
            &self.render_settings,
            elapsed_time,
            frame_count,
            history_samples,
            blend_enabled,
            self.scene.len(),
            self.scene.selected_tag(),
        );
        self.last_projection = Some(projection);

        surface.draw(&uniforms, self.scene.as_bytes())
    }

    /// Select whatever is under `pixel` in the last drawn frame.
    pub fn pick_at(&mut self, pixel: Vec2) -> Option<usize> {
        let projection = match self.last_projection {
            Some(projection) => projection,
            None => self.camera.resolve(),
        };
        picking::select(
            &projection,
            pixel,
            &mut self.scene,
            &mut self.camera,
            &mut self.accumulation,
        )
    }

    /// Output size changed; takes effect on the next frame.
    pub fn resize(&mut self, resolution: UVec2) {
        self.camera.resize(resolution);
    }

    /// Add a sphere, invalidating the accumulation on success.
    pub fn add_sphere(&mut self, sphere: Sphere) -> Result<usize, SceneError> {
        let mut sphere = sphere;
        sphere.sanitize();
        let index = self.scene.add(sphere)?;
        self.accumulation.invalidate();
        Ok(index)
    }

    /// Edit a sphere in place. Values are clamped into their editable ranges
    /// and the accumulation restarts if anything changed.
    pub fn edit_sphere<F>(&mut self, index: usize, edit: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut Sphere),
    {
        let sphere = self.scene.get_mut(index)?;
        let before = *sphere;
        edit(sphere);
        sphere.sanitize();
        if *sphere != before {
            self.accumulation.invalidate();
        }
        Ok(())
    }

    /// Change the render tunables, clamped. Invalidates on any change.
    pub fn update_settings<F>(&mut self, update: F)
    where
        F: FnOnce(&mut RenderSettings),
    {
        let before = self.render_settings;
        update(&mut self.render_settings);
        self.render_settings.clamp();
        if self.render_settings != before {
            self.accumulation
                .set_temporal_aa(self.render_settings.temporal_aa);
            self.accumulation.invalidate();
        }
    }

    /// Explicit user request to restart accumulation.
    pub fn reset_accumulation(&mut self) {
        self.accumulation.invalidate();
    }

    /// Radius zoom steps are scaled by, zero without a selection.
    pub fn zoom_reference_radius(&self) -> f32 {
        self.scene.selected().map_or(0.0, |sphere| sphere.radius)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Camera mutations are noticed on the next frame through its dirty flag.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub fn accumulation(&self) -> &AccumulationController {
        &self.accumulation
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    pub fn last_projection(&self) -> Option<&Projection> {
        self.last_projection.as_ref()
    }
}
