//! Raw device snapshots
//!
//! The host polls its platform layer once per tick and hands the dispatcher an
//! [`InputSnapshot`]. The dispatcher keeps the previous snapshot per device and
//! synthesizes events from the diff; it never touches the platform itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Keyboard keys the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    D0, D1, D2, D3, D4, D5, D6, D7, D8, D9,
    Up, Down, Left, Right,
    Space, Enter, Escape, Tab, Backspace,
    LeftShift, RightShift,
    LeftControl, RightControl,
    LeftAlt, RightAlt,
}

/// Keys currently pressed, captured once per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardSnapshot {
    pressed: Vec<Key>,
}

impl KeyboardSnapshot {
    pub fn pressing(keys: &[Key]) -> Self {
        Self {
            pressed: keys.to_vec(),
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn pressed_keys(&self) -> &[Key] {
        &self.pressed
    }
}

/// Mouse buttons tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::X1,
        MouseButton::X2,
    ];

    fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::X1 => 3,
            MouseButton::X2 => 4,
        }
    }
}

/// Mouse position and button state, captured once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseSnapshot {
    pub pos: Vec2,
    buttons: [bool; 5],
}

impl MouseSnapshot {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            buttons: [false; 5],
        }
    }

    pub fn with_pressed(mut self, button: MouseButton) -> Self {
        self.buttons[button.index()] = true;
        self
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }
}

/// Gamepad buttons the dispatcher diffs each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadButton {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LeftStick,
    RightStick,
}

impl PadButton {
    pub const ALL: [PadButton; 14] = [
        PadButton::A,
        PadButton::B,
        PadButton::X,
        PadButton::Y,
        PadButton::Start,
        PadButton::Back,
        PadButton::LeftShoulder,
        PadButton::RightShoulder,
        PadButton::DPadUp,
        PadButton::DPadDown,
        PadButton::DPadLeft,
        PadButton::DPadRight,
        PadButton::LeftStick,
        PadButton::RightStick,
    ];
}

/// One gamepad's state for a tick. A disconnected pad is skipped entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub connected: bool,
    pressed: Vec<PadButton>,
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl GamepadSnapshot {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    pub fn with_pressed(mut self, button: PadButton) -> Self {
        if !self.pressed.contains(&button) {
            self.pressed.push(button);
        }
        self
    }

    pub fn is_pressed(&self, button: PadButton) -> bool {
        self.pressed.contains(&button)
    }
}

/// Everything the host polled this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub keyboard: KeyboardSnapshot,
    pub mouse: MouseSnapshot,
    pub gamepads: [GamepadSnapshot; 4],
}
