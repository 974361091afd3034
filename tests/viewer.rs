use std::convert::Infallible;
use std::f32::consts::FRAC_PI_2;

use glam::{UVec2, Vec2, Vec3};
use sphere_tracer::{
    camera::{Camera, CameraMode, FlyAxis, MIN_DISTANCE},
    input::{InputSnapshot, InputTranslator},
    material::Material,
    picking,
    renderer::{FrameUniforms, RenderSurface},
    scene::{SceneStore, Sphere},
    settings::RenderSettings,
    viewer::Viewer,
};

#[derive(Default)]
struct Recorder {
    frames: Vec<FrameUniforms>,
}

impl Recorder {
    fn drain(&mut self) -> Vec<(u32, bool)> {
        self.frames
            .drain(..)
            .map(|frame| (frame.frame_count, frame.blend_enabled()))
            .collect()
    }
}

impl RenderSurface for Recorder {
    type Error = Infallible;

    fn draw(&mut self, uniforms: &FrameUniforms, _spheres: &[u8]) -> Result<(), Infallible> {
        self.frames.push(*uniforms);
        Ok(())
    }
}

const RESOLUTION: UVec2 = UVec2::new(101, 101);
const CENTRE: Vec2 = Vec2::new(50.0, 50.0);

fn viewer_with(spheres: &[Sphere], distance: f32) -> Viewer {
    let mut camera = Camera::new(RESOLUTION);
    camera.set_orbital(0.0, FRAC_PI_2, distance, Vec3::ZERO);
    let mut scene = SceneStore::default();
    for sphere in spheres {
        scene.add(*sphere).unwrap();
    }
    Viewer::new(camera, scene, RenderSettings::default())
}

fn sphere(position: Vec3, radius: f32) -> Sphere {
    Sphere::new(Material::default(), position, radius)
}

fn render(viewer: &mut Viewer, surface: &mut Recorder, frames: usize) {
    for _ in 0..frames {
        viewer.render_frame(surface, 0.0).unwrap();
    }
}

#[test]
fn still_camera_keeps_accumulating() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 5);
    assert_eq!(
        surface.drain(),
        vec![(0, false), (1, false), (2, true), (3, true), (4, true)]
    );
}

#[test]
fn every_view_change_restarts_accumulation() {
    let mutations: [(&str, fn(&mut Viewer)); 7] = [
        ("pan", |viewer| viewer.camera_mut().pan(0.1, 0.05)),
        ("zoom", |viewer| {
            viewer.camera_mut().zoom(1.0, 0.0);
        }),
        ("focus", |viewer| viewer.camera_mut().focus(Vec3::ONE, 1.0)),
        ("focal length", |viewer| {
            viewer.camera_mut().set_focal_length(4.0)
        }),
        ("resize", |viewer| viewer.resize(UVec2::new(64, 48))),
        ("add sphere", |viewer| {
            viewer.add_sphere(sphere(Vec3::X * 3.0, 0.5)).unwrap();
        }),
        ("edit sphere", |viewer| {
            viewer.edit_sphere(0, |sphere| sphere.radius = 2.0).unwrap()
        }),
    ];

    for (name, mutate) in mutations {
        let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
        let mut surface = Recorder::default();
        render(&mut viewer, &mut surface, 4);
        surface.drain();

        mutate(&mut viewer);
        render(&mut viewer, &mut surface, 3);
        assert_eq!(
            surface.drain(),
            vec![(0, false), (1, false), (2, true)],
            "after {name}"
        );
    }
}

#[test]
fn free_fly_movement_restarts_accumulation() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    viewer.camera_mut().toggle_mode();
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 4);
    surface.drain();

    assert!(viewer.camera_mut().move_free_fly(FlyAxis::Forward, 0.5));
    render(&mut viewer, &mut surface, 3);
    assert_eq!(surface.drain(), vec![(0, false), (1, false), (2, true)]);
    assert!((viewer.camera().eye() - Vec3::new(4.5, 0.0, 0.0)).length() < 1e-4);
}

#[test]
fn no_op_resize_keeps_accumulating() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 3);
    surface.drain();

    viewer.resize(RESOLUTION);
    render(&mut viewer, &mut surface, 1);
    assert_eq!(surface.drain(), vec![(3, true)]);
}

#[test]
fn centre_pixel_picks_sphere_and_focuses_it() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 3);
    surface.drain();

    assert_eq!(viewer.pick_at(CENTRE), Some(0));
    assert_eq!(viewer.scene().selected_index(), Some(0));
    assert_eq!(viewer.camera().distance(), 10.0);

    render(&mut viewer, &mut surface, 1);
    let frame = surface.frames.pop().unwrap();
    assert_eq!(frame.selected_index, 0);
    assert_eq!(frame.frame_count, 0);
    assert!(!frame.blend_enabled());
}

#[test]
fn pick_uses_the_projection_that_was_drawn() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 1);

    // camera moves after the frame, before the click is handled
    viewer
        .camera_mut()
        .focus(Vec3::new(0.0, 50.0, 0.0), 1.0);
    let moved = viewer.camera_mut().resolve();
    assert_eq!(picking::pick(&moved, CENTRE, viewer.scene()), None);

    assert_eq!(viewer.pick_at(CENTRE), Some(0));
    assert_eq!(viewer.scene().selected_index(), Some(0));
}

#[test]
fn blending_weights_count_only_history_samples() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 4);
    let history: Vec<(bool, u32)> = surface
        .frames
        .iter()
        .map(|frame| (frame.blend_enabled(), frame.history_samples))
        .collect();
    assert_eq!(history, vec![(false, 0), (false, 1), (true, 1), (true, 2)]);
}

#[test]
fn repeated_pick_of_same_sphere_keeps_accumulating() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    viewer.pick_at(CENTRE);
    render(&mut viewer, &mut surface, 3);
    surface.drain();

    assert_eq!(viewer.pick_at(CENTRE), Some(0));
    render(&mut viewer, &mut surface, 1);
    assert_eq!(surface.drain(), vec![(3, true)]);
}

#[test]
fn corner_pixel_misses_and_clears_selection() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 0.5)], 5.0);
    viewer.pick_at(CENTRE);
    assert_eq!(viewer.scene().selected_index(), Some(0));

    assert_eq!(viewer.pick_at(Vec2::ZERO), None);
    assert_eq!(viewer.scene().selected_index(), None);
    assert_eq!(viewer.scene().selected_tag(), -1);
}

#[test]
fn coincident_spheres_pick_the_first() {
    let mut viewer = viewer_with(
        &[sphere(Vec3::ZERO, 1.0), sphere(Vec3::ZERO, 1.0)],
        5.0,
    );
    assert_eq!(viewer.pick_at(CENTRE), Some(0));
}

#[test]
fn nearer_sphere_wins_regardless_of_order() {
    let mut viewer = viewer_with(
        &[sphere(Vec3::ZERO, 1.0), sphere(Vec3::new(2.5, 0.0, 0.0), 0.5)],
        5.0,
    );
    assert_eq!(viewer.pick_at(CENTRE), Some(1));
}

#[test]
fn zoom_steps_scale_with_selected_radius() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 10.0)], 50.0);
    assert_eq!(viewer.pick_at(CENTRE), Some(0));
    assert_eq!(viewer.camera().distance(), 100.0);
    assert_eq!(viewer.zoom_reference_radius(), 10.0);

    let radius = viewer.zoom_reference_radius();
    assert!(viewer.camera_mut().zoom(1.0, radius));
    assert!((viewer.camera().distance() - 102.0).abs() < 1e-4);

    viewer.camera_mut().zoom(-1000.0, radius);
    assert_eq!(viewer.camera().distance(), MIN_DISTANCE);
}

#[test]
fn zoom_is_ignored_in_free_fly() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    viewer.camera_mut().toggle_mode();
    assert_eq!(viewer.camera().mode(), CameraMode::FreeFly);
    let eye = viewer.camera().eye();
    assert!(!viewer.camera_mut().zoom(3.0, 1.0));
    assert_eq!(viewer.camera().eye(), eye);
}

#[test]
fn free_fly_pick_does_not_move_camera() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    viewer.camera_mut().toggle_mode();
    let eye = viewer.camera().eye();
    assert_eq!(viewer.pick_at(CENTRE), Some(0));
    assert_eq!(viewer.camera().eye(), eye);
}

#[test]
fn click_in_window_coordinates_picks_sphere() {
    let mut viewer = viewer_with(&[sphere(Vec3::ZERO, 1.0)], 5.0);
    let mut surface = Recorder::default();
    render(&mut viewer, &mut surface, 1);

    let mut translator = InputTranslator::default();
    let click = InputSnapshot {
        cursor: Some(Vec2::new(50.5, 50.5)),
        clicked: true,
        viewport_size: RESOLUTION,
        ..Default::default()
    };
    assert_eq!(translator.apply(&click, &mut viewer, 0.016), Some(Some(0)));

    let idle = InputSnapshot {
        cursor: Some(Vec2::new(50.5, 50.5)),
        viewport_size: RESOLUTION,
        ..Default::default()
    };
    assert_eq!(translator.apply(&idle, &mut viewer, 0.016), None);
}
