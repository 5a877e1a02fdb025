//! Input system for handling keyboard and mouse input
//!
//! Collects winit events between frames and hands them to the demos as
//! mouse drags (orbit/zoom) and key-press edges (mode toggles).

use std::collections::HashSet;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;
use tracing::trace;
use crate::component::OrbitCamera;

/// Accumulated cursor motion while a mouse button is held
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseDrag {
    pub button: MouseButton,
    pub dx: f32,
    pub dy: f32,
}

/// InputSystem manages keyboard and mouse input state
pub struct InputSystem {
    // Keyboard state
    pressed_keys: HashSet<KeyCode>,
    key_presses: Vec<KeyCode>,

    // Mouse state
    last_mouse_pos: Option<(f64, f64)>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_delta: (f32, f32),
}

impl InputSystem {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            key_presses: Vec::new(),
            last_mouse_pos: None,
            mouse_buttons: HashSet::new(),
            mouse_delta: (0.0, 0.0),
        }
    }

    /// Process keyboard input event
    ///
    /// Auto-repeat presses update the held state but do not queue another edge,
    /// so holding '1' toggles once.
    pub fn on_keyboard_input(&mut self, keycode: KeyCode, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                self.pressed_keys.insert(keycode);
                if !repeat {
                    self.key_presses.push(keycode);
                }
            }
            ElementState::Released => {
                self.pressed_keys.remove(&keycode);
            }
        }
    }

    /// Process mouse button event
    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
            }
        }
    }

    /// Process mouse movement event
    pub fn on_mouse_move(&mut self, position: (f64, f64)) {
        if let Some(last) = self.last_mouse_pos {
            if !self.mouse_buttons.is_empty() {
                self.mouse_delta.0 += (position.0 - last.0) as f32;
                self.mouse_delta.1 += (position.1 - last.1) as f32;
            }
        }
        self.last_mouse_pos = Some(position);
    }

    /// Drain the drag accumulated since the last call
    ///
    /// Left takes priority over right when both are held.
    pub fn take_mouse_drag(&mut self) -> Option<MouseDrag> {
        let (dx, dy) = std::mem::replace(&mut self.mouse_delta, (0.0, 0.0));
        if dx == 0.0 && dy == 0.0 {
            return None;
        }

        let button = if self.mouse_buttons.contains(&MouseButton::Left) {
            MouseButton::Left
        } else if self.mouse_buttons.contains(&MouseButton::Right) {
            MouseButton::Right
        } else {
            return None;
        };

        Some(MouseDrag { button, dx, dy })
    }

    /// Drain the key-press edges recorded since the last call, in arrival order
    pub fn take_pressed_keys(&mut self) -> Vec<KeyCode> {
        std::mem::take(&mut self.key_presses)
    }

    /// Apply the pending drag to an orbit camera
    ///
    /// Left button orbits, right button zooms.
    pub fn update_camera(&mut self, camera: &mut OrbitCamera) {
        if let Some(drag) = self.take_mouse_drag() {
            trace!(?drag.button, drag.dx, drag.dy, "Camera drag");
            match drag.button {
                MouseButton::Left => camera.rotate(drag.dx, drag.dy),
                MouseButton::Right => camera.zoom(drag.dx, drag.dy),
                _ => {}
            }
        }
    }

    /// Reset mouse state (useful when window loses focus)
    pub fn reset_mouse(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.mouse_buttons.clear();
        self.last_mouse_pos = None;
    }

    /// Check if a specific key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a specific mouse button is currently pressed
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_edges_ignore_repeat() {
        let mut input = InputSystem::new();
        input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed, false);
        input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed, true);
        input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed, true);
        assert!(input.is_key_pressed(KeyCode::Digit1));

        assert_eq!(input.take_pressed_keys(), vec![KeyCode::Digit1]);
        assert!(input.take_pressed_keys().is_empty());

        input.on_keyboard_input(KeyCode::Digit1, ElementState::Released, false);
        assert!(!input.is_key_pressed(KeyCode::Digit1));
    }

    #[test]
    fn test_drag_only_while_button_held() {
        let mut input = InputSystem::new();
        input.on_mouse_move((10.0, 10.0));
        input.on_mouse_move((20.0, 15.0));
        assert!(input.take_mouse_drag().is_none());

        input.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.on_mouse_move((25.0, 12.0));
        input.on_mouse_move((30.0, 10.0));

        let drag = input.take_mouse_drag().unwrap();
        assert_eq!(drag.button, MouseButton::Left);
        assert_eq!(drag.dx, 10.0);
        assert_eq!(drag.dy, -5.0);
        assert!(input.take_mouse_drag().is_none());
    }

    #[test]
    fn test_update_camera_right_drag_zooms() {
        let mut input = InputSystem::new();
        let mut camera = OrbitCamera::new(1.5 * std::f32::consts::PI, 0.25 * std::f32::consts::PI, 5.0)
            .with_zoom(0.005, 3.0, 15.0);

        input.on_mouse_move((0.0, 0.0));
        input.on_mouse_button(MouseButton::Right, ElementState::Pressed);
        input.on_mouse_move((100.0, 0.0));
        input.update_camera(&mut camera);

        assert!((camera.radius() - 5.5).abs() < 1e-5);
    }

    #[test]
    fn test_reset_mouse_drops_pending_drag() {
        let mut input = InputSystem::new();
        input.on_mouse_move((0.0, 0.0));
        input.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.on_mouse_move((5.0, 5.0));
        input.reset_mouse();
        assert!(input.take_mouse_drag().is_none());
        assert!(!input.is_mouse_button_pressed(MouseButton::Left));
    }
}
