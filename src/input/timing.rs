//! Tracked-token timing
//!
//! Anything that can be "held" maps to a [`Token`]; presence in the start-time
//! map means the state is currently active, and clearing yields how long it
//! was. Time is whatever monotonic `Duration` the host passes in each tick.

use std::collections::HashMap;
use std::time::Duration;

use super::event::EventKind;
use super::snapshot::{Key, MouseButton, PadButton};

/// Identity of a timed state: a physical control or a synthetic marker for
/// state machines like drag and hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Key(Key),
    Mouse(MouseButton),
    Pad(PadButton),
    Marker(EventKind),
}

/// Token → start-time map shared by all device components.
#[derive(Debug, Default)]
pub struct StartTimes {
    map: HashMap<Token, Duration>,
}

impl StartTimes {
    /// Start (or restart) timing a token.
    pub fn start(&mut self, token: Token, now: Duration) {
        self.map.insert(token, now);
    }

    /// Stop timing a token, returning how long it ran. Unknown tokens
    /// report zero.
    pub fn clear(&mut self, token: Token, now: Duration) -> Duration {
        match self.map.remove(&token) {
            Some(start) => now.saturating_sub(start),
            None => Duration::ZERO,
        }
    }

    pub fn contains(&self, token: Token) -> bool {
        self.map.contains_key(&token)
    }

    /// How long a token has been active, zero if it is not.
    pub fn duration(&self, token: Token, now: Duration) -> Duration {
        match self.map.get(&token) {
            Some(start) => now.saturating_sub(*start),
            None => Duration::ZERO,
        }
    }
}
