//! Pointer and keyboard input, turned into camera motion and picks.

use std::collections::HashSet;
use std::f32::consts::TAU;

use glam::{UVec2, Vec2};
use winit::event::{
    ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent,
};

use crate::camera::FlyAxis;
use crate::viewer::Viewer;

/// Share of a full turn per viewport width of horizontal drag.
const DRAG_THETA_SCALE: f32 = 0.8;
/// Share of a full turn per viewport height of vertical drag.
const DRAG_PHI_SCALE: f32 = 0.2;
/// Pixel-precise scroll deltas per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    ToggleMode,
    ResetAccumulation,
}

impl Key {
    fn from_virtual(code: VirtualKeyCode) -> Option<Self> {
        match code {
            VirtualKeyCode::W => Some(Self::Forward),
            VirtualKeyCode::S => Some(Self::Back),
            VirtualKeyCode::A => Some(Self::Left),
            VirtualKeyCode::D => Some(Self::Right),
            VirtualKeyCode::E => Some(Self::Up),
            VirtualKeyCode::Q => Some(Self::Down),
            VirtualKeyCode::Tab => Some(Self::ToggleMode),
            VirtualKeyCode::R => Some(Self::ResetAccumulation),
            _ => None,
        }
    }
}

/// Input state for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    /// Cursor in viewport pixels, origin top-left. `None` outside the viewport.
    pub cursor: Option<Vec2>,
    pub primary_down: bool,
    /// Where the primary button went down, while it is held
    pub press_position: Option<Vec2>,
    /// Primary button released where it was pressed
    pub clicked: bool,
    pub scroll_delta_y: f32,
    pub pressed_keys: HashSet<Key>,
    pub just_pressed: HashSet<Key>,
    pub viewport_size: UVec2,
}

/// Accumulates winit window events into [`InputSnapshot`]s.
#[derive(Debug, Default)]
pub struct InputCollector {
    cursor: Option<Vec2>,
    primary_down: bool,
    press_position: Option<Vec2>,
    clicked: bool,
    scroll_delta_y: f32,
    pressed_keys: HashSet<Key>,
    just_pressed: HashSet<Key>,
    viewport_size: UVec2,
}

impl InputCollector {
    pub fn new(viewport_size: UVec2) -> Self {
        Self {
            viewport_size,
            ..Default::default()
        }
    }

    /// Returns `true` if the event was consumed.
    pub fn process_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) => {
                self.viewport_size = UVec2::new(size.width, size.height);
                false
            }
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                self.viewport_size = UVec2::new(new_inner_size.width, new_inner_size.height);
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        self.primary_down = true;
                        self.press_position = self.cursor;
                    }
                    ElementState::Released => {
                        self.clicked = self.primary_down
                            && self.cursor.is_some()
                            && self.cursor == self.press_position;
                        self.primary_down = false;
                        self.press_position = None;
                    }
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta_y += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                true
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => match Key::from_virtual(*keycode) {
                Some(key) => {
                    match state {
                        ElementState::Pressed => {
                            if self.pressed_keys.insert(key) {
                                self.just_pressed.insert(key);
                            }
                        }
                        ElementState::Released => {
                            self.pressed_keys.remove(&key);
                        }
                    }
                    true
                }
                None => false,
            },
            WindowEvent::Focused(false) => {
                self.pressed_keys.clear();
                self.primary_down = false;
                self.press_position = None;
                false
            }
            _ => false,
        }
    }

    /// Snapshot of the current state. Edge-triggered fields are consumed.
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            cursor: self.cursor,
            primary_down: self.primary_down,
            press_position: self.press_position,
            clicked: std::mem::take(&mut self.clicked),
            scroll_delta_y: std::mem::take(&mut self.scroll_delta_y),
            pressed_keys: self.pressed_keys.clone(),
            just_pressed: std::mem::take(&mut self.just_pressed),
            viewport_size: self.viewport_size,
        }
    }
}

/// Turns input snapshots into orbit, zoom, free-fly motion and picks.
#[derive(Debug)]
pub struct InputTranslator {
    pub fly_speed: f32,
    pub drag_sensitivity: f32,
    last_cursor: Option<Vec2>,
}

impl InputTranslator {
    pub fn new(fly_speed: f32, drag_sensitivity: f32) -> Self {
        Self {
            fly_speed,
            drag_sensitivity,
            last_cursor: None,
        }
    }

    /// Apply one frame of input. Returns the picked sphere when a click landed
    /// this frame.
    pub fn apply(
        &mut self,
        input: &InputSnapshot,
        viewer: &mut Viewer,
        dt: f32,
    ) -> Option<Option<usize>> {
        let size = input.viewport_size.max(UVec2::ONE);
        viewer.resize(size);

        self.apply_keys(input, viewer, dt);

        let Some(cursor) = input.cursor else {
            self.last_cursor = None;
            return None;
        };

        let dragging = input.primary_down && input.press_position != Some(cursor);
        if dragging {
            if let Some(last) = self.last_cursor {
                let delta = cursor - last;
                if delta != Vec2::ZERO {
                    let size = size.as_vec2();
                    let d_theta = delta.x / size.x * TAU * DRAG_THETA_SCALE * self.drag_sensitivity;
                    let d_phi = -delta.y / size.y * TAU * DRAG_PHI_SCALE * self.drag_sensitivity;
                    viewer.camera_mut().pan(d_theta, d_phi);
                }
            }
        }
        self.last_cursor = input.primary_down.then_some(cursor);

        if input.scroll_delta_y != 0.0 {
            let radius = viewer.zoom_reference_radius();
            viewer.camera_mut().zoom(-input.scroll_delta_y, radius);
        }

        input
            .clicked
            .then(|| viewer.pick_at(window_to_pixel(cursor, size)))
    }

    fn apply_keys(&self, input: &InputSnapshot, viewer: &mut Viewer, dt: f32) {
        if input.just_pressed.contains(&Key::ToggleMode) {
            viewer.camera_mut().toggle_mode();
        }
        if input.just_pressed.contains(&Key::ResetAccumulation) {
            viewer.reset_accumulation();
        }

        let step = self.fly_speed * dt;
        if step == 0.0 {
            return;
        }
        let moves = [
            (Key::Forward, FlyAxis::Forward, step),
            (Key::Back, FlyAxis::Forward, -step),
            (Key::Right, FlyAxis::Right, step),
            (Key::Left, FlyAxis::Right, -step),
            (Key::Up, FlyAxis::Up, step),
            (Key::Down, FlyAxis::Up, -step),
        ];
        for (key, axis, amount) in moves {
            if input.pressed_keys.contains(&key) {
                viewer.camera_mut().move_free_fly(axis, amount);
            }
        }
    }
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self::new(2.0, 1.0)
    }
}

/// Window pixel (origin top-left, y down) to the renderer's pixel grid,
/// whose rows run from the bottom edge up.
pub fn window_to_pixel(cursor: Vec2, viewport_size: UVec2) -> Vec2 {
    let height = viewport_size.y.max(1) as f32;
    let x = cursor.x.floor().max(0.0);
    let y = (height - 1.0 - cursor.y.floor()).max(0.0);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::camera::{Camera, CameraMode};
    use crate::material::Material;
    use crate::scene::{SceneStore, Sphere};
    use crate::settings::RenderSettings;

    fn viewer_with_sphere(radius: f32) -> Viewer {
        let mut camera = Camera::new(UVec2::new(100, 100));
        camera.set_orbital(0.0, std::f32::consts::FRAC_PI_2, 5.0, Vec3::ZERO);
        let mut scene = SceneStore::default();
        scene
            .add(Sphere::new(Material::default(), Vec3::ZERO, radius))
            .unwrap();
        Viewer::new(camera, scene, RenderSettings::default())
    }

    fn snapshot() -> InputSnapshot {
        InputSnapshot {
            viewport_size: UVec2::new(100, 100),
            ..Default::default()
        }
    }

    #[test]
    fn window_rows_are_flipped() {
        let size = UVec2::new(100, 50);
        assert_eq!(window_to_pixel(Vec2::new(0.0, 0.0), size), Vec2::new(0.0, 49.0));
        assert_eq!(window_to_pixel(Vec2::new(10.7, 49.2), size), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn drag_orbits_camera() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut translator = InputTranslator::default();
        let press = Vec2::new(50.0, 50.0);

        let mut input = snapshot();
        input.cursor = Some(press);
        input.primary_down = true;
        input.press_position = Some(press);
        translator.apply(&input, &mut viewer, 0.0);
        assert_eq!(viewer.camera().theta(), 0.0);

        input.cursor = Some(Vec2::new(75.0, 50.0));
        translator.apply(&input, &mut viewer, 0.0);
        let expected = 0.25 * TAU * DRAG_THETA_SCALE;
        assert!((viewer.camera().theta() - expected).abs() < 1e-5);
        assert!(viewer.camera().is_dirty());
    }

    #[test]
    fn cursor_leaving_cancels_drag() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut translator = InputTranslator::default();

        let mut input = snapshot();
        input.cursor = Some(Vec2::new(10.0, 10.0));
        input.primary_down = true;
        input.press_position = Some(Vec2::new(0.0, 0.0));
        translator.apply(&input, &mut viewer, 0.0);

        input.cursor = None;
        translator.apply(&input, &mut viewer, 0.0);

        input.cursor = Some(Vec2::new(60.0, 10.0));
        translator.apply(&input, &mut viewer, 0.0);
        assert_eq!(viewer.camera().theta(), 0.0);
    }

    #[test]
    fn click_picks_through_flipped_rows() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut translator = InputTranslator::default();

        let mut input = snapshot();
        input.cursor = Some(Vec2::new(50.0, 49.0));
        input.clicked = true;
        assert_eq!(translator.apply(&input, &mut viewer, 0.0), Some(Some(0)));
        assert_eq!(viewer.scene().selected_index(), Some(0));

        input.cursor = Some(Vec2::new(1.0, 1.0));
        assert_eq!(translator.apply(&input, &mut viewer, 0.0), Some(None));
        assert_eq!(viewer.scene().selected_index(), None);
    }

    #[test]
    fn scroll_zoom_uses_selected_radius() {
        let mut viewer = viewer_with_sphere(10.0);
        viewer.camera_mut().set_orbital(0.0, 1.0, 50.0, Vec3::ZERO);
        let mut translator = InputTranslator::default();

        let mut input = snapshot();
        input.cursor = Some(Vec2::new(50.0, 50.0));
        input.scroll_delta_y = -1.0;
        translator.apply(&input, &mut viewer, 0.0);
        assert!((viewer.camera().distance() - 50.1).abs() < 1e-4);

        viewer.camera_mut().set_orbital(0.0, 1.0, 50.0, Vec3::ZERO);
        viewer.render_frame(&mut NullSurface, 0.0).unwrap();
        input.clicked = true;
        input.scroll_delta_y = 0.0;
        assert_eq!(translator.apply(&input, &mut viewer, 0.0), Some(Some(0)));
        let framed = viewer.camera().distance();

        input.clicked = false;
        input.scroll_delta_y = -1.0;
        translator.apply(&input, &mut viewer, 0.0);
        assert_eq!(viewer.camera().distance(), framed + 2.0);
    }

    #[test]
    fn tab_toggles_and_keys_fly() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut translator = InputTranslator::new(1.0, 1.0);

        let mut input = snapshot();
        input.just_pressed.insert(Key::ToggleMode);
        translator.apply(&input, &mut viewer, 0.0);
        assert_eq!(viewer.camera().mode(), CameraMode::FreeFly);

        let start = viewer.camera().eye();
        let mut input = snapshot();
        input.pressed_keys.insert(Key::Forward);
        translator.apply(&input, &mut viewer, 0.5);
        let moved = viewer.camera().eye();
        assert!((start.distance(moved) - 0.5).abs() < 1e-5);
        assert!(moved.x < start.x);
    }

    #[test]
    fn viewport_size_resizes_camera() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut translator = InputTranslator::default();
        let mut input = snapshot();
        input.viewport_size = UVec2::new(320, 240);
        translator.apply(&input, &mut viewer, 0.0);
        assert_eq!(viewer.camera().resolution(), UVec2::new(320, 240));
    }

    #[test]
    fn scale_factor_change_resizes_camera() {
        let mut viewer = viewer_with_sphere(1.0);
        let mut collector = InputCollector::new(UVec2::new(800, 600));
        let mut translator = InputTranslator::default();

        let mut new_size = PhysicalSize::new(1600, 1200);
        collector.process_event(&WindowEvent::ScaleFactorChanged {
            scale_factor: 2.0,
            new_inner_size: &mut new_size,
        });
        viewer.resize(UVec2::new(1600, 1200));
        translator.apply(&collector.snapshot(), &mut viewer, 0.0);
        assert_eq!(viewer.camera().resolution(), UVec2::new(1600, 1200));
    }

    struct NullSurface;

    impl crate::renderer::RenderSurface for NullSurface {
        type Error = ();

        fn draw(&mut self, _: &crate::renderer::FrameUniforms, _: &[u8]) -> Result<(), ()> {
            Ok(())
        }
    }
}
