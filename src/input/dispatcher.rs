//! Polled event dispatch over registered targets
//!
//! Each tick the host hands the dispatcher a full [`InputSnapshot`] and the
//! current time; the components diff it into events, which are delivered to
//! bound handlers and then queued for the host unless the kind is marked
//! no-bubble and a handler consumed it. Keyboard events go to every binding
//! whose target is visible, focused, and input-enabled; mouse events go to
//! the bindings of the target under the cursor; gamepad events are never
//! target-addressed and only bubble.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use super::event::{Event, EventKind};
use super::gamepad::{GamepadComponent, GamepadConfig};
use super::keyboard::{KeyboardComponent, KeyboardConfig};
use super::mouse::{HoverConfig, MouseComponent};
use super::snapshot::InputSnapshot;
use super::targets::{TargetId, TargetRegion, Targets};
use super::timing::Token;

pub type Handler = Box<dyn FnMut(&Event)>;

/// Identifies one binding for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingHandle(u64);

struct Binding {
    id: u64,
    target: TargetId,
    kind: EventKind,
    handler: Handler,
}

pub struct Dispatcher {
    targets: Targets,
    bindings: Vec<Binding>,
    next_binding: u64,
    no_bubble: HashSet<EventKind>,
    queue: VecDeque<Event>,
    keyboard: KeyboardComponent,
    mouse: MouseComponent,
    gamepads: [GamepadComponent; 4],
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(
            KeyboardConfig::default(),
            HoverConfig::default(),
            GamepadConfig::default(),
        )
    }
}

impl Dispatcher {
    pub fn new(keyboard: KeyboardConfig, hover: HoverConfig, gamepad: GamepadConfig) -> Self {
        Self {
            targets: Targets::default(),
            bindings: Vec::new(),
            next_binding: 0,
            no_bubble: HashSet::new(),
            queue: VecDeque::new(),
            keyboard: KeyboardComponent::new(keyboard),
            mouse: MouseComponent::new(hover),
            gamepads: std::array::from_fn(|player| GamepadComponent::new(player, gamepad)),
        }
    }

    pub fn register_target(&mut self, region: TargetRegion) -> TargetId {
        self.targets.insert(region)
    }

    pub fn target(&self, id: TargetId) -> Option<&TargetRegion> {
        self.targets.get(id)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut TargetRegion> {
        self.targets.get_mut(id)
    }

    /// Removes a target and every binding attached to it.
    pub fn remove_target(&mut self, id: TargetId) {
        self.targets.remove(id);
        self.bindings.retain(|b| b.target != id);
    }

    pub fn bind(
        &mut self,
        target: TargetId,
        kind: EventKind,
        handler: impl FnMut(&Event) + 'static,
    ) -> BindingHandle {
        let id = self.next_binding;
        self.next_binding += 1;
        self.bindings.push(Binding {
            id,
            target,
            kind,
            handler: Box::new(handler),
        });
        BindingHandle(id)
    }

    pub fn unbind(&mut self, handle: BindingHandle) {
        self.bindings.retain(|b| b.id != handle.0);
    }

    /// Events of this kind stop at their handlers instead of bubbling,
    /// provided at least one handler received them.
    pub fn mark_no_bubble(&mut self, kind: EventKind) {
        self.no_bubble.insert(kind);
    }

    pub fn update(&mut self, snapshot: &InputSnapshot, now: Duration) {
        for event in self.keyboard.update(&snapshot.keyboard, now) {
            self.dispatch_keyboard(event);
        }
        for event in self.mouse.update(&snapshot.mouse, &self.targets, now) {
            self.dispatch_mouse(event);
        }
        for player in 0..self.gamepads.len() {
            for event in self.gamepads[player].update(&snapshot.gamepads[player], now) {
                // Gamepads are not target-addressed; bubble only.
                self.queue.push_back(event);
            }
        }
    }

    /// Takes the bubbled events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.queue.drain(..).collect()
    }

    pub fn is_down(&self, token: Token) -> bool {
        match token {
            Token::Key(key) => self.keyboard.is_down(key),
            Token::Mouse(button) => self.mouse.is_down(button),
            Token::Pad(button) => self.gamepads.iter().any(|pad| pad.is_down(button)),
            // Markers can live in the mouse (drag, hover) or any pad
            // (stick/trigger excursions).
            Token::Marker(_) => {
                self.mouse.start_times.contains(token)
                    || self.gamepads.iter().any(|pad| pad.start_times.contains(token))
            }
        }
    }

    /// How long the token's press or gesture has been running, zero if idle.
    pub fn duration(&self, token: Token, now: Duration) -> Duration {
        match token {
            Token::Key(_) => self.keyboard.start_times.duration(token, now),
            Token::Mouse(_) => self.mouse.start_times.duration(token, now),
            Token::Pad(_) => self.pad_duration(token, now),
            Token::Marker(_) => self
                .mouse
                .start_times
                .duration(token, now)
                .max(self.pad_duration(token, now)),
        }
    }

    fn pad_duration(&self, token: Token, now: Duration) -> Duration {
        self.gamepads
            .iter()
            .map(|pad| pad.start_times.duration(token, now))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Keyboard events go to every binding whose target can accept input.
    fn dispatch_keyboard(&mut self, event: Event) {
        let mut fired = false;
        let count = self.bindings.len();
        for i in 0..count {
            if self.bindings[i].kind != event.kind {
                continue;
            }
            let accepts = self
                .targets
                .get(self.bindings[i].target)
                .is_some_and(|t| t.visible && t.has_focus && t.input_enabled);
            if !accepts {
                continue;
            }
            let mut delivered = event.clone();
            delivered.target = Some(self.bindings[i].target);
            (self.bindings[i].handler)(&delivered);
            fired = true;
        }
        self.bubble(event, fired);
    }

    /// Mouse events go to the bindings of the event's own target, in bind order.
    fn dispatch_mouse(&mut self, event: Event) {
        let mut fired = false;
        if let Some(target) = event.target {
            let count = self.bindings.len();
            for i in 0..count {
                if self.bindings[i].target == target && self.bindings[i].kind == event.kind {
                    (self.bindings[i].handler)(&event);
                    fired = true;
                }
            }
        }
        self.bubble(event, fired);
    }

    fn bubble(&mut self, event: Event, fired: bool) {
        if fired && self.no_bubble.contains(&event.kind) {
            return;
        }
        self.queue.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use super::*;
    use crate::input::snapshot::{
        GamepadSnapshot, Key, KeyboardSnapshot, MouseButton, MouseSnapshot, PadButton,
    };

    const MS: Duration = Duration::from_millis(1);

    fn region(pos: Vec2) -> TargetRegion {
        TargetRegion::new(pos, Vec2::new(50.0, 50.0))
    }

    fn key_snapshot(keys: &[Key]) -> InputSnapshot {
        InputSnapshot {
            keyboard: KeyboardSnapshot::pressing(keys),
            ..Default::default()
        }
    }

    fn mouse_snapshot(mouse: MouseSnapshot) -> InputSnapshot {
        InputSnapshot {
            mouse,
            ..Default::default()
        }
    }

    #[test]
    fn test_keyboard_delivery_requires_focus() {
        let mut dispatcher = Dispatcher::default();
        let focused = dispatcher.register_target(region(Vec2::ZERO).with_focus());
        let unfocused = dispatcher.register_target(region(Vec2::new(100.0, 0.0)));

        let hits = Rc::new(RefCell::new(Vec::new()));
        for id in [focused, unfocused] {
            let hits = Rc::clone(&hits);
            dispatcher.bind(id, EventKind::KeyDown, move |event| {
                hits.borrow_mut().push(event.target);
            });
        }

        dispatcher.update(&key_snapshot(&[Key::Space]), 0 * MS);
        assert_eq!(*hits.borrow(), vec![Some(focused)]);
    }

    #[test]
    fn test_keyboard_gating_respects_visibility_and_enable() {
        let mut dispatcher = Dispatcher::default();
        let id = dispatcher.register_target(region(Vec2::ZERO).with_focus());

        let hits = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&hits);
        dispatcher.bind(id, EventKind::KeyDown, move |_| *counter.borrow_mut() += 1);

        dispatcher.update(&key_snapshot(&[Key::A]), 0 * MS);
        assert_eq!(*hits.borrow(), 1);

        dispatcher.target_mut(id).unwrap().visible = false;
        dispatcher.update(&key_snapshot(&[]), 10 * MS);
        dispatcher.update(&key_snapshot(&[Key::A]), 20 * MS);
        assert_eq!(*hits.borrow(), 1);

        dispatcher.target_mut(id).unwrap().visible = true;
        dispatcher.target_mut(id).unwrap().input_enabled = false;
        dispatcher.update(&key_snapshot(&[]), 30 * MS);
        dispatcher.update(&key_snapshot(&[Key::A]), 40 * MS);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_mouse_delivery_goes_to_hovered_target_in_bind_order() {
        let mut dispatcher = Dispatcher::default();
        let id = dispatcher.register_target(region(Vec2::ZERO));

        let order = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second"] {
            let order = Rc::clone(&order);
            dispatcher.bind(id, EventKind::MouseDown(MouseButton::Left), move |_| {
                order.borrow_mut().push(label);
            });
        }

        // Move over the target, then press
        dispatcher.update(&mouse_snapshot(MouseSnapshot::at(Vec2::new(10.0, 10.0))), 0 * MS);
        dispatcher.update(
            &mouse_snapshot(MouseSnapshot::at(Vec2::new(10.0, 10.0)).with_pressed(MouseButton::Left)),
            16 * MS,
        );
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_no_bubble_suppresses_only_consumed_kinds() {
        let mut dispatcher = Dispatcher::default();
        // Away from the resting cursor so no mouse-over sneaks into the queue
        let id = dispatcher.register_target(region(Vec2::new(200.0, 200.0)).with_focus());
        dispatcher.bind(id, EventKind::KeyDown, |_| {});
        dispatcher.mark_no_bubble(EventKind::KeyDown);

        dispatcher.update(&key_snapshot(&[Key::Enter]), 0 * MS);
        dispatcher.update(&key_snapshot(&[]), 100 * MS);
        let bubbled: Vec<EventKind> = dispatcher.drain_events().iter().map(|e| e.kind).collect();
        // Down was consumed and marked no-bubble; up still bubbles
        assert_eq!(bubbled, vec![EventKind::KeyUp]);
    }

    #[test]
    fn test_unconsumed_no_bubble_kind_still_bubbles() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.mark_no_bubble(EventKind::KeyDown);

        // No binding fired, so suppression does not apply
        dispatcher.update(&key_snapshot(&[Key::Enter]), 0 * MS);
        let bubbled: Vec<EventKind> = dispatcher.drain_events().iter().map(|e| e.kind).collect();
        assert_eq!(bubbled, vec![EventKind::KeyDown]);
    }

    #[test]
    fn test_gamepad_events_bubble_only() {
        let mut dispatcher = Dispatcher::default();
        let id = dispatcher.register_target(region(Vec2::new(200.0, 200.0)).with_focus());

        let hits = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&hits);
        dispatcher.bind(id, EventKind::PadButtonDown, move |_| {
            *counter.borrow_mut() += 1
        });

        let mut snapshot = InputSnapshot::default();
        snapshot.gamepads[0] = GamepadSnapshot::connected().with_pressed(PadButton::A);
        dispatcher.update(&snapshot, 0 * MS);

        assert_eq!(*hits.borrow(), 0);
        let bubbled = dispatcher.drain_events();
        assert_eq!(bubbled.len(), 1);
        assert_eq!(bubbled[0].kind, EventKind::PadButtonDown);
    }

    #[test]
    fn test_unbind_and_remove_target() {
        let mut dispatcher = Dispatcher::default();
        let id = dispatcher.register_target(region(Vec2::ZERO).with_focus());

        let hits = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&hits);
        let handle =
            dispatcher.bind(id, EventKind::KeyDown, move |_| *counter.borrow_mut() += 1);

        dispatcher.update(&key_snapshot(&[Key::A]), 0 * MS);
        assert_eq!(*hits.borrow(), 1);

        dispatcher.unbind(handle);
        dispatcher.update(&key_snapshot(&[]), 10 * MS);
        dispatcher.update(&key_snapshot(&[Key::A]), 20 * MS);
        assert_eq!(*hits.borrow(), 1);

        let counter = Rc::clone(&hits);
        dispatcher.bind(id, EventKind::KeyDown, move |_| *counter.borrow_mut() += 1);
        dispatcher.remove_target(id);
        dispatcher.update(&key_snapshot(&[]), 30 * MS);
        dispatcher.update(&key_snapshot(&[Key::A]), 40 * MS);
        assert_eq!(*hits.borrow(), 1);
        assert!(dispatcher.target(id).is_none());
    }

    #[test]
    fn test_marker_duration_covers_gamepad_gestures() {
        let mut dispatcher = Dispatcher::default();
        let mut snapshot = InputSnapshot::default();
        snapshot.gamepads[0] = GamepadSnapshot::connected();
        dispatcher.update(&snapshot, 0 * MS);

        snapshot.gamepads[0].left_stick = Vec2::new(0.5, 0.0);
        dispatcher.update(&snapshot, 100 * MS);

        let token = Token::Marker(EventKind::PadLeftStickMoved);
        assert!(dispatcher.is_down(token));
        assert_eq!(dispatcher.duration(token, 500 * MS), 400 * MS);

        // Stick back at center: the excursion is over
        snapshot.gamepads[0].left_stick = Vec2::ZERO;
        dispatcher.update(&snapshot, 600 * MS);
        assert!(!dispatcher.is_down(token));
        assert_eq!(dispatcher.duration(token, 700 * MS), Duration::ZERO);
    }

    #[test]
    fn test_is_down_and_duration() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.update(&key_snapshot(&[Key::Left]), 0 * MS);
        assert!(dispatcher.is_down(Token::Key(Key::Left)));
        assert_eq!(dispatcher.duration(Token::Key(Key::Left), 250 * MS), 250 * MS);

        dispatcher.update(&key_snapshot(&[]), 300 * MS);
        assert!(!dispatcher.is_down(Token::Key(Key::Left)));
        assert_eq!(dispatcher.duration(Token::Key(Key::Left), 400 * MS), Duration::ZERO);

        let mut snapshot = InputSnapshot::default();
        snapshot.mouse = MouseSnapshot::at(Vec2::ZERO).with_pressed(MouseButton::Middle);
        dispatcher.update(&snapshot, 500 * MS);
        assert!(dispatcher.is_down(Token::Mouse(MouseButton::Middle)));
    }
}
