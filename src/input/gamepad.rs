//! Gamepad diffing for one player slot
//!
//! Buttons edge-detect with durations and optional repeat; sticks and
//! triggers report change events whose duration covers the whole excursion
//! away from rest (timing resets when the axis returns to exact center).

use std::time::Duration;

use glam::Vec2;

use super::event::{Event, EventData, EventKind};
use super::snapshot::{GamepadSnapshot, PadButton};
use super::timing::{StartTimes, Token};

/// Button repeat tuning, off by default.
#[derive(Debug, Clone, Copy)]
pub struct GamepadConfig {
    pub repeat_enabled: bool,
    pub repeat_delay_ms: u64,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            repeat_enabled: false,
            repeat_delay_ms: 500,
        }
    }
}

/// Diffs gamepad snapshots for a single player into button/stick/trigger events.
#[derive(Debug, Default)]
pub struct GamepadComponent {
    pub config: GamepadConfig,
    player: usize,
    prev: GamepadSnapshot,
    pub(super) start_times: StartTimes,
}

impl GamepadComponent {
    pub fn new(player: usize, config: GamepadConfig) -> Self {
        Self {
            config,
            player,
            ..Default::default()
        }
    }

    pub fn is_down(&self, button: PadButton) -> bool {
        self.start_times.contains(Token::Pad(button))
    }

    pub fn update(&mut self, current: &GamepadSnapshot, now: Duration) -> Vec<Event> {
        // A disconnected pad is not diffed; prev stays at the last connected
        // state so reconnecting does not replay every held button as fresh.
        if !current.connected {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.process_buttons(current, now, &mut events);
        self.process_sticks(current, now, &mut events);
        self.process_triggers(current, now, &mut events);
        self.prev = current.clone();
        events
    }

    fn process_buttons(&mut self, current: &GamepadSnapshot, now: Duration, events: &mut Vec<Event>) {
        for button in PadButton::ALL {
            let was = self.prev.is_pressed(button);
            let is = current.is_pressed(button);
            if is {
                let repeating = was
                    && self.config.repeat_enabled
                    && self.start_times.duration(Token::Pad(button), now)
                        > Duration::from_millis(self.config.repeat_delay_ms);
                if !was || repeating {
                    self.start_times.start(Token::Pad(button), now);
                    events.push(self.make_event(
                        EventKind::PadButtonDown,
                        Some(button),
                        Duration::ZERO,
                        current,
                    ));
                }
            } else if was {
                let duration = self.start_times.clear(Token::Pad(button), now);
                events.push(self.make_event(
                    EventKind::PadButtonUp,
                    Some(button),
                    duration,
                    current,
                ));
            }
        }
    }

    fn process_sticks(&mut self, current: &GamepadSnapshot, now: Duration, events: &mut Vec<Event>) {
        let sticks = [
            (EventKind::PadLeftStickMoved, self.prev.left_stick, current.left_stick),
            (EventKind::PadRightStickMoved, self.prev.right_stick, current.right_stick),
        ];
        for (kind, before, after) in sticks {
            if before == after {
                continue;
            }
            let token = Token::Marker(kind);
            if !self.start_times.contains(token) {
                self.start_times.start(token, now);
            }
            let duration = if after == Vec2::ZERO {
                self.start_times.clear(token, now)
            } else {
                self.start_times.duration(token, now)
            };
            events.push(self.make_event(kind, None, duration, current));
        }
    }

    fn process_triggers(&mut self, current: &GamepadSnapshot, now: Duration, events: &mut Vec<Event>) {
        let triggers = [
            (EventKind::PadLeftTriggerChanged, self.prev.left_trigger, current.left_trigger),
            (EventKind::PadRightTriggerChanged, self.prev.right_trigger, current.right_trigger),
        ];
        for (kind, before, after) in triggers {
            if before == after {
                continue;
            }
            let token = Token::Marker(kind);
            if !self.start_times.contains(token) {
                self.start_times.start(token, now);
            }
            let duration = if after == 0.0 {
                self.start_times.clear(token, now)
            } else {
                self.start_times.duration(token, now)
            };
            events.push(self.make_event(kind, None, duration, current));
        }
    }

    fn make_event(
        &self,
        kind: EventKind,
        button: Option<PadButton>,
        duration: Duration,
        current: &GamepadSnapshot,
    ) -> Event {
        Event {
            kind,
            target: None,
            duration,
            data: EventData::Pad {
                player: self.player,
                button,
                left_stick: current.left_stick,
                right_stick: current.right_stick,
                left_trigger: current.left_trigger,
                right_trigger: current.right_trigger,
            },
        }
    }
}
