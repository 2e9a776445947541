use super::CameraState;
use nalgebra_glm as glm;

/// Handles camera input and transformations
pub struct CameraController {
    state: CameraState,
    left_mouse_pressed: bool,
    middle_mouse_pressed: bool,
    right_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl CameraController {
    /// The starting distance is clamped right away.
    pub fn new(mut state: CameraState) -> Self {
        state.clamp_distance();
        Self {
            state,
            left_mouse_pressed: false,
            middle_mouse_pressed: false,
            right_mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.left_mouse_pressed || self.middle_mouse_pressed || self.right_mouse_pressed
    }

    /// Handle mouse button press/release
    pub fn on_mouse_button(&mut self, button: winit::event::MouseButton, pressed: bool) {
        match button {
            winit::event::MouseButton::Left => self.left_mouse_pressed = pressed,
            winit::event::MouseButton::Middle => self.middle_mouse_pressed = pressed,
            winit::event::MouseButton::Right => self.right_mouse_pressed = pressed,
            _ => return,
        }
        if !pressed {
            self.last_mouse_pos = None;
        }
    }

    /// Left drag orbits, right or middle drag pans. Returns true if the view changed.
    pub fn on_mouse_move(&mut self, position: (f64, f64)) -> bool {
        if !self.is_dragging() {
            self.last_mouse_pos = None;
            return false;
        }

        let Some(last_pos) = self.last_mouse_pos.replace(position) else {
            return false;
        };
        let delta_x = (position.0 - last_pos.0) as f32;
        let delta_y = (position.1 - last_pos.1) as f32;

        if self.left_mouse_pressed {
            self.rotate(delta_x, delta_y);
        } else {
            self.pan(delta_x, delta_y);
        }
        true
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.state.set_viewport(width, height);
    }

    fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.state.yaw -= delta_x * 0.01;
        self.state.pitch = (self.state.pitch + delta_y * 0.01).clamp(-1.5, 1.5);
    }

    fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let target = glm::Vec3::from(self.state.target);
        let forward = glm::normalize(&(target - self.state.eye()));
        let right = glm::normalize(&glm::cross(&forward, &glm::vec3(0.0, 1.0, 0.0)));
        let up = glm::cross(&right, &forward);

        let pan_speed = self.state.distance * 0.002;
        let moved = target - right * delta_x * pan_speed + up * delta_y * pan_speed;
        self.state.target = [moved.x, moved.y, moved.z];
    }

    /// Wheel zoom, clamped to the configured distance range
    pub fn zoom(&mut self, delta: f32) {
        self.state.distance *= 1.0 - delta * 0.1;
        self.state.clamp_distance();
    }

    /// Reset camera to defaults
    pub fn reset(&mut self) {
        self.state.reset();
        self.last_mouse_pos = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::MouseButton;

    fn controller() -> CameraController {
        CameraController::new(CameraState::default())
    }

    #[test]
    fn initial_distance_is_clamped() {
        let controller = controller();
        assert_eq!(controller.state().distance, 20.0);
        // Direction toward (9, 15, 15) is kept
        let eye = controller.state().eye();
        let expected = glm::normalize(&glm::vec3(9.0, 15.0, 15.0)) * 20.0;
        assert!((eye - expected).norm() < 1e-3);
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut controller = controller();
        for _ in 0..50 {
            controller.zoom(1.0);
        }
        assert_eq!(controller.state().distance, 10.0);
        for _ in 0..50 {
            controller.zoom(-1.0);
        }
        assert_eq!(controller.state().distance, 20.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut controller = controller();
        controller.on_resize(1600, 800);
        assert_eq!(controller.state().aspect, 2.0);
        controller.on_resize(0, 800);
        assert_eq!(controller.state().aspect, 2.0);
    }

    #[test]
    fn left_drag_orbits_and_reset_restores() {
        let mut controller = controller();
        let yaw = controller.state().yaw;

        controller.on_mouse_button(MouseButton::Left, true);
        assert!(!controller.on_mouse_move((100.0, 100.0)));
        assert!(controller.on_mouse_move((150.0, 100.0)));
        assert!((controller.state().yaw - (yaw - 0.5)).abs() < 1e-6);
        controller.on_mouse_button(MouseButton::Left, false);

        controller.zoom(2.0);
        controller.reset();
        assert_eq!(controller.state().yaw, yaw);
        assert_eq!(controller.state().distance, 20.0);
    }

    #[test]
    fn right_drag_pans_target() {
        let mut controller = controller();
        controller.on_mouse_button(MouseButton::Right, true);
        controller.on_mouse_move((0.0, 0.0));
        controller.on_mouse_move((10.0, 0.0));
        assert_ne!(controller.state().target, [0.0, 0.0, 0.0]);
        assert_eq!(controller.state().distance, 20.0);
    }

    #[test]
    fn moving_without_buttons_does_nothing() {
        let mut controller = controller();
        assert!(!controller.on_mouse_move((10.0, 10.0)));
        assert_eq!(controller.state().target, [0.0, 0.0, 0.0]);
    }
}
