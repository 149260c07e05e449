//! Polled input-event layer
//!
//! The host samples its platform each tick into an [`InputSnapshot`] and
//! feeds it to a [`Dispatcher`] together with the current time. The
//! dispatcher diffs consecutive snapshots into down/up/move/drag/hover
//! events, delivers them to handlers bound on registered targets, and
//! queues the rest for [`Dispatcher::drain_events`]. No wall clock is read
//! here; timing is entirely host-supplied, which keeps every sequence
//! replayable in tests.

mod dispatcher;
mod event;
mod gamepad;
mod keyboard;
mod mouse;
mod snapshot;
mod targets;
mod timing;

pub use dispatcher::{BindingHandle, Dispatcher, Handler};
pub use event::{Event, EventData, EventKind, ShiftState};
pub use gamepad::GamepadConfig;
pub use keyboard::KeyboardConfig;
pub use mouse::HoverConfig;
pub use snapshot::{
    GamepadSnapshot, InputSnapshot, Key, KeyboardSnapshot, MouseButton, MouseSnapshot, PadButton,
};
pub use targets::{TargetId, TargetRegion};
pub use timing::Token;
