use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::state::SceneState;

/// Identifier for a keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    /// Parses names such as `"w"`, `"W"`, `"7"`, `"Up"` or `"ArrowLeft"`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_ascii_alphabetic() {
            return Some(Self::Character(ch.to_ascii_uppercase()));
        }
        if ch.is_ascii_digit() {
            return Some(Self::Digit(ch as u8 - b'0'));
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" | " " => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Non-character keys that can be bound to actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    PageUp,
    PageDown,
}

/// Scene changes the controller can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    LightUp,
    LightDown,
    CameraLeft,
    CameraRight,
}

/// Key assigned to each [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub light_up: KeyCode,
    pub light_down: KeyCode,
    pub camera_left: KeyCode,
    pub camera_right: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            light_up: KeyCode::Character('W'),
            light_down: KeyCode::Character('S'),
            camera_left: KeyCode::Character('A'),
            camera_right: KeyCode::Character('D'),
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        if key == self.light_up {
            Some(Action::LightUp)
        } else if key == self.light_down {
            Some(Action::LightDown)
        } else if key == self.camera_left {
            Some(Action::CameraLeft)
        } else if key == self.camera_right {
            Some(Action::CameraRight)
        } else {
            None
        }
    }
}

/// Moves the light along Y and the camera along X, one step per key event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub bindings: KeyBindings,
    pub step: f32,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            step: 0.1,
        }
    }
}

impl Controller {
    pub fn new(bindings: KeyBindings, step: f32) -> Self {
        Self { bindings, step }
    }

    /// Applies the action bound to `key`, if any.
    ///
    /// The light is written through the shared handle, so every material
    /// sees the new position on the next frame. Unbound keys are ignored.
    pub fn handle_key(&self, state: &mut SceneState, key: KeyCode) -> Option<Action> {
        let Some(action) = self.bindings.action_for(key) else {
            debug!("ignoring unbound key {key:?}");
            return None;
        };
        self.apply(state, action);
        Some(action)
    }

    pub fn apply(&self, state: &mut SceneState, action: Action) {
        match action {
            Action::LightUp => {
                state.light.translate(Vec3::Y * self.step);
            }
            Action::LightDown => {
                state.light.translate(Vec3::NEG_Y * self.step);
            }
            Action::CameraLeft => state.camera.position.x -= self.step,
            Action::CameraRight => state.camera.position.x += self.step,
        }
        debug!(
            "{action:?}: light={:?} camera={:?}",
            state.light.position(),
            state.camera.position
        );
    }
}

/// Parses a key sequence such as `"wwsad"` or `"w,w,Up"` into key codes.
///
/// Comma-separated input allows multi-letter key names; otherwise each
/// character is one key.
pub fn parse_key_sequence(sequence: &str) -> Vec<Option<KeyCode>> {
    if sequence.contains(',') {
        sequence
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(KeyCode::from_name)
            .collect()
    } else {
        sequence
            .chars()
            .map(|ch| KeyCode::from_name(ch.encode_utf8(&mut [0; 4])))
            .collect()
    }
}
