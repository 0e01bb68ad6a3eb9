//! Keyboard and pointer state for one window.
//!
//! Window and device events are folded into an [`InputState`]: which movement
//! keys are held, whether the look button is down, accumulated pointer and
//! scroll deltas, and requests (quit, add an item) that the render loop
//! consumes once per frame.

use serde::Deserialize;
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::data_structures::scene::Primitive;

/// Pixel-precise scroll deltas (touchpads) are converted to lines at this rate.
pub const PIXELS_PER_LINE: f32 = 20.0;

/// Mouse button that enables looking around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookButton {
    Left,
    #[default]
    Right,
    Middle,
}

impl From<LookButton> for MouseButton {
    fn from(button: LookButton) -> Self {
        match button {
            LookButton::Left => MouseButton::Left,
            LookButton::Right => MouseButton::Right,
            LookButton::Middle => MouseButton::Middle,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,

    pub look_button: LookButton,
    /// The look button is held.
    pub look_held: bool,
    /// Shift is held: pointer motion pans instead of rotating.
    pub pan_modifier: bool,

    /// Pointer motion (device units) accumulated while the look button was held.
    pub pointer_delta: (f32, f32),
    /// Scroll in lines since the last frame, positive away from the user.
    pub scroll: f32,

    pub quit_requested: bool,
    pending_items: Vec<Primitive>,
}

impl InputState {
    pub fn new(look_button: LookButton) -> Self {
        Self {
            look_button,
            ..Default::default()
        }
    }

    /// Updates held keys and records one-shot requests. Returns `true` if the
    /// key is bound.
    pub fn handle_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) -> bool {
        let pressed = state.is_pressed();
        match code {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ControlLeft => self.down = pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.pan_modifier = pressed,
            KeyCode::Escape => {
                if pressed {
                    self.quit_requested = true;
                }
            }
            KeyCode::KeyN | KeyCode::KeyT | KeyCode::KeyQ => {
                if pressed && !repeat {
                    let primitive = match code {
                        KeyCode::KeyN => Primitive::Cube,
                        KeyCode::KeyT => Primitive::Triangle,
                        _ => Primitive::Quad,
                    };
                    self.pending_items.push(primitive);
                }
            }
            _ => return false,
        }
        true
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::from(self.look_button) {
            self.look_held = state.is_pressed();
        }
    }

    /// Raw pointer motion; only counted while the look button is held.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.look_held {
            self.pointer_delta.0 += dx as f32;
            self.pointer_delta.1 += dy as f32;
        }
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
        };
    }

    /// Releases everything that is held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
        self.up = false;
        self.down = false;
        self.look_held = false;
        self.pan_modifier = false;
    }

    /// Returns `true` if the event changed the input state.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => self.handle_key(code, event.state, event.repeat),
                PhysicalKey::Unidentified(_) => false,
            },
            WindowEvent::ModifiersChanged(modifiers) => {
                self.pan_modifier = modifiers.state().shift_key();
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(*button, *state);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle_scroll(delta);
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                true
            }
            _ => false,
        }
    }

    /// Drains the add-item requests made since the last call.
    pub fn take_pending_items(&mut self) -> Vec<Primitive> {
        std::mem::take(&mut self.pending_items)
    }

    /// Clears the per-frame deltas.
    pub fn end_frame(&mut self) {
        self.pointer_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }
}
