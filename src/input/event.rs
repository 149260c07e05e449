//! Event taxonomy and payloads

use std::time::Duration;

use glam::Vec2;

use super::snapshot::{Key, MouseButton, PadButton};
use super::TargetId;

/// Discrete input event kinds synthesized from snapshot diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    MouseMove,
    DragStart(MouseButton),
    DragEnd(MouseButton),
    /// The cursor moved onto a target
    MouseOver,
    /// The cursor left a target
    MouseOut,
    /// The cursor rested on one target long enough
    HoverDelay,
    /// A running hover expired (or was cut short by leaving the target)
    HoverTimeout,
    PadButtonDown,
    PadButtonUp,
    PadLeftStickMoved,
    PadRightStickMoved,
    PadLeftTriggerChanged,
    PadRightTriggerChanged,
}

impl EventKind {
    /// The start-event a gesture-ending kind pairs with, used to look up
    /// where the gesture began.
    pub fn start_kind(self) -> EventKind {
        match self {
            EventKind::MouseUp(btn) => EventKind::MouseDown(btn),
            EventKind::DragEnd(btn) => EventKind::DragStart(btn),
            EventKind::MouseOut => EventKind::MouseOver,
            EventKind::HoverTimeout => EventKind::HoverDelay,
            other => other,
        }
    }
}

/// Modifier reported with keyboard events. Mutually exclusive; resolution
/// order is Alt, then Control, then Shift, first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    #[default]
    None,
    Alt,
    Control,
    Shift,
}

/// Device-specific event payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Key {
        key: Key,
        shift: ShiftState,
        /// True when fired by key repeat rather than a fresh press
        repeating: bool,
    },
    Mouse {
        button: Option<MouseButton>,
        /// Cursor position when the event fired
        pos: Vec2,
        /// Where the gesture this event belongs to began
        start_pos: Vec2,
        dragging: bool,
        drag_target: Option<TargetId>,
        /// Cursor position relative to the receiving target's top-left
        offset: Vec2,
    },
    Pad {
        player: usize,
        button: Option<PadButton>,
        left_stick: Vec2,
        right_stick: Vec2,
        left_trigger: f32,
        right_trigger: f32,
    },
}

/// One dispatched input event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// The target this event is addressed to, when one won selection
    pub target: Option<TargetId>,
    /// Elapsed time for gesture-ending events (up, drag-end, out,
    /// hover-timeout); zero otherwise
    pub duration: Duration,
    pub data: EventData,
}

impl Event {
    pub fn key(&self) -> Option<Key> {
        match &self.data {
            EventData::Key { key, .. } => Some(*key),
            _ => None,
        }
    }

    pub fn mouse_button(&self) -> Option<MouseButton> {
        match &self.data {
            EventData::Mouse { button, .. } => *button,
            _ => None,
        }
    }
}
