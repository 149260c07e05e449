//! Keyboard diffing

use std::time::Duration;

use super::event::{Event, EventData, EventKind, ShiftState};
use super::snapshot::{Key, KeyboardSnapshot};
use super::timing::{StartTimes, Token};

/// Keyboard tuning
#[derive(Debug, Clone, Copy)]
pub struct KeyboardConfig {
    /// Fire repeated key-down events while a key stays held
    pub repeat_enabled: bool,
    /// Milliseconds a key must be held before a repeat fires
    pub repeat_delay_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            repeat_enabled: false,
            repeat_delay_ms: 1000,
        }
    }
}

/// Diffs keyboard snapshots into key-down/key-up events.
#[derive(Debug, Default)]
pub struct KeyboardComponent {
    pub config: KeyboardConfig,
    held: Vec<Key>,
    pub(super) start_times: StartTimes,
}

impl KeyboardComponent {
    pub fn new(config: KeyboardConfig) -> Self {
        Self {
            config,
            held: Vec::new(),
            start_times: StartTimes::default(),
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Diff one tick's snapshot. Down events fire for newly pressed keys (or
    /// repeat-expired held keys, restarting their timer); up events fire with
    /// the held duration.
    pub fn update(&mut self, current: &KeyboardSnapshot, now: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        let shift = shift_state(current);
        let repeat_delay = Duration::from_millis(self.config.repeat_delay_ms);

        for &key in current.pressed_keys() {
            let token = Token::Key(key);
            let fresh = !self.held.contains(&key);
            let repeating = !fresh
                && self.config.repeat_enabled
                && self.start_times.duration(token, now) > repeat_delay;
            if !fresh && !repeating {
                continue;
            }

            self.start_times.start(token, now);
            if fresh {
                self.held.push(key);
            }
            events.push(Event {
                kind: EventKind::KeyDown,
                target: None,
                duration: Duration::ZERO,
                data: EventData::Key {
                    key,
                    shift,
                    repeating,
                },
            });
        }

        // Snapshot held keys so releases can be removed while iterating.
        let held: Vec<Key> = self.held.clone();
        for key in held {
            if current.is_pressed(key) {
                continue;
            }
            let duration = self.start_times.clear(Token::Key(key), now);
            self.held.retain(|&k| k != key);
            events.push(Event {
                kind: EventKind::KeyUp,
                target: None,
                duration,
                data: EventData::Key {
                    key,
                    shift,
                    repeating: false,
                },
            });
        }

        events
    }
}

/// Resolve the modifier for this tick. Priority order Alt, Control, Shift;
/// only the first active modifier is reported.
fn shift_state(snapshot: &KeyboardSnapshot) -> ShiftState {
    if snapshot.is_pressed(Key::LeftAlt) || snapshot.is_pressed(Key::RightAlt) {
        ShiftState::Alt
    } else if snapshot.is_pressed(Key::LeftControl) || snapshot.is_pressed(Key::RightControl) {
        ShiftState::Control
    } else if snapshot.is_pressed(Key::LeftShift) || snapshot.is_pressed(Key::RightShift) {
        ShiftState::Shift
    } else {
        ShiftState::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_held_key_fires_one_down_one_up() {
        let mut kb = KeyboardComponent::default();
        let pressed = KeyboardSnapshot::pressing(&[Key::Space]);
        let released = KeyboardSnapshot::default();

        let events = kb.update(&pressed, 0 * MS);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::KeyDown);

        // Held for many ticks with repeat disabled: silence
        for tick in 1..=20u32 {
            assert!(kb.update(&pressed, tick * 16 * MS).is_empty());
        }
        assert!(kb.is_down(Key::Space));

        let events = kb.update(&released, 400 * MS);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::KeyUp);
        assert_eq!(events[0].duration, 400 * MS);
        assert!(!kb.is_down(Key::Space));
    }

    #[test]
    fn test_repeat_fires_after_delay_and_restarts() {
        let mut kb = KeyboardComponent::new(KeyboardConfig {
            repeat_enabled: true,
            repeat_delay_ms: 100,
        });
        let pressed = KeyboardSnapshot::pressing(&[Key::A]);

        assert_eq!(kb.update(&pressed, 0 * MS).len(), 1);
        assert!(kb.update(&pressed, 50 * MS).is_empty());

        let events = kb.update(&pressed, 150 * MS);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].data,
            EventData::Key {
                repeating: true,
                ..
            }
        ));

        // Timer restarted at 150: nothing until past 250
        assert!(kb.update(&pressed, 200 * MS).is_empty());
        assert_eq!(kb.update(&pressed, 260 * MS).len(), 1);
    }

    #[test]
    fn test_shift_state_priority() {
        let snap = KeyboardSnapshot::pressing(&[Key::LeftShift, Key::LeftControl, Key::LeftAlt]);
        assert_eq!(shift_state(&snap), ShiftState::Alt);
        let snap = KeyboardSnapshot::pressing(&[Key::LeftShift, Key::RightControl]);
        assert_eq!(shift_state(&snap), ShiftState::Control);
        let snap = KeyboardSnapshot::pressing(&[Key::RightShift]);
        assert_eq!(shift_state(&snap), ShiftState::Shift);
        assert_eq!(shift_state(&KeyboardSnapshot::default()), ShiftState::None);
    }

    #[test]
    fn test_up_duration_per_key() {
        let mut kb = KeyboardComponent::default();
        kb.update(&KeyboardSnapshot::pressing(&[Key::A]), 0 * MS);
        kb.update(&KeyboardSnapshot::pressing(&[Key::A, Key::B]), 100 * MS);

        let events = kb.update(&KeyboardSnapshot::pressing(&[Key::B]), 250 * MS);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key(), Some(Key::A));
        assert_eq!(events[0].duration, 250 * MS);

        let events = kb.update(&KeyboardSnapshot::default(), 300 * MS);
        assert_eq!(events[0].key(), Some(Key::B));
        assert_eq!(events[0].duration, 200 * MS);
    }
}
