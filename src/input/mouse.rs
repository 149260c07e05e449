//! Mouse diffing, drag promotion, and hover tracking
//!
//! Button edges fire down/up with durations. The first position change while a
//! button is held promotes that press into a drag; only one drag is modeled at
//! a time (a later drag-start overwrites the shared slot, and any drag-end
//! clears it). Target selection and hover are suspended while dragging.

use std::collections::HashMap;
use std::time::Duration;

use glam::Vec2;

use super::event::{Event, EventData, EventKind};
use super::snapshot::{MouseButton, MouseSnapshot};
use super::targets::{TargetId, Targets};
use super::timing::{StartTimes, Token};

/// Hover tuning
#[derive(Debug, Clone, Copy)]
pub struct HoverConfig {
    /// Milliseconds of rest on one target before hover-delay fires
    pub delay_ms: u64,
    /// Milliseconds after hover-delay before hover-timeout fires
    pub timeout_ms: u64,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            timeout_ms: 2000,
        }
    }
}

/// Diffs mouse snapshots into move/down/up/drag/over/hover events.
#[derive(Debug, Default)]
pub struct MouseComponent {
    pub config: HoverConfig,
    prev: MouseSnapshot,
    pub(super) start_times: StartTimes,
    /// Gesture start positions, keyed by the gesture's start event kind
    start_pos: HashMap<EventKind, Vec2>,
    dragging: bool,
    /// Dragging state as of the previous tick; offsets freeze mid-drag
    was_dragging: bool,
    drag_target: Option<TargetId>,
    /// Offset captured when the drag was promoted; reported unchanged for
    /// the rest of the drag
    drag_offset: Vec2,
    over: Option<TargetId>,
    last_over: Option<TargetId>,
    /// Latches after a hover-delay fires so it is one-shot per visit
    hover_on: bool,
}

impl MouseComponent {
    pub fn new(config: HoverConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.start_times.contains(Token::Mouse(button))
    }

    /// The target currently under the cursor (frozen while dragging).
    pub fn moused_over(&self) -> Option<TargetId> {
        self.over
    }

    pub fn update(
        &mut self,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        self.was_dragging = self.dragging;

        self.select_target(current, targets, now, &mut events);
        self.process_down(current, targets, now, &mut events);
        self.process_up(current, targets, now, &mut events);
        self.process_move(current, targets, now, &mut events);

        self.prev = current.clone();
        events
    }

    /// Re-pick the moused-over target and run over/out/hover transitions.
    /// Skipped entirely while a drag is in progress.
    fn select_target(
        &mut self,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        if self.dragging {
            return;
        }

        self.last_over = self.over;
        self.over = targets.target_at(current.pos);

        if self.last_over.is_none() && self.over.is_none() {
            return;
        }

        if self.last_over != self.over {
            self.hover_on = false;
            if let Some(last) = self.last_over {
                self.hover_off(true, last, current, targets, now, events);

                let out = self.make_event(
                    EventKind::MouseOut,
                    None,
                    Some(last),
                    self.start_times.duration(Token::Marker(EventKind::MouseOver), now),
                    current,
                    targets,
                );
                events.push(out);
                self.start_times.clear(Token::Marker(EventKind::MouseOver), now);
                self.start_pos.remove(&EventKind::MouseOver);
            }
            if let Some(new) = self.over {
                self.start_pos.insert(EventKind::MouseOver, current.pos);
                self.start_times
                    .start(Token::Marker(EventKind::MouseOver), now);
                let over = self.make_event(
                    EventKind::MouseOver,
                    None,
                    Some(new),
                    Duration::ZERO,
                    current,
                    targets,
                );
                events.push(over);
            }
        } else if let Some(id) = self.over {
            self.hover_on_check(id, current, targets, now, events);
            self.hover_off(false, id, current, targets, now, events);
        }
    }

    /// Fire hover-delay once the cursor has rested long enough on one target.
    fn hover_on_check(
        &mut self,
        id: TargetId,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        let over_token = Token::Marker(EventKind::MouseOver);
        if !self.start_times.contains(over_token)
            || self.start_times.contains(Token::Marker(EventKind::HoverDelay))
            || self.hover_on
        {
            return;
        }
        if self.start_times.duration(over_token, now)
            > Duration::from_millis(self.config.delay_ms)
        {
            self.hover_on = true;
            self.start_times
                .start(Token::Marker(EventKind::HoverDelay), now);
            self.start_pos.insert(EventKind::HoverDelay, current.pos);
            let event = self.make_event(
                EventKind::HoverDelay,
                None,
                Some(id),
                Duration::ZERO,
                current,
                targets,
            );
            events.push(event);
        }
    }

    /// Fire hover-timeout when a running hover elapses, or immediately when
    /// forced (the hovered target changed).
    fn hover_off(
        &mut self,
        force: bool,
        target: TargetId,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        let token = Token::Marker(EventKind::HoverDelay);
        if !self.start_times.contains(token) {
            return;
        }
        if !force
            && self.start_times.duration(token, now)
                < Duration::from_millis(self.config.timeout_ms)
        {
            return;
        }

        let duration = self.start_times.clear(token, now);
        let event = self.make_event(
            EventKind::HoverTimeout,
            None,
            Some(target),
            duration,
            current,
            targets,
        );
        events.push(event);
        self.start_pos.remove(&EventKind::HoverDelay);
    }

    fn process_down(
        &mut self,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        for button in MouseButton::ALL {
            if self.prev.is_pressed(button) || !current.is_pressed(button) {
                continue;
            }
            self.start_pos
                .insert(EventKind::MouseDown(button), current.pos);
            self.start_times.start(Token::Mouse(button), now);
            let event = self.make_event(
                EventKind::MouseDown(button),
                Some(button),
                self.over,
                Duration::ZERO,
                current,
                targets,
            );
            events.push(event);
        }
    }

    fn process_up(
        &mut self,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        for button in MouseButton::ALL {
            if !self.prev.is_pressed(button) || current.is_pressed(button) {
                continue;
            }

            let duration = self.start_times.clear(Token::Mouse(button), now);
            let up = self.make_event(
                EventKind::MouseUp(button),
                Some(button),
                self.over,
                duration,
                current,
                targets,
            );
            events.push(up);
            self.start_pos.remove(&EventKind::MouseDown(button));

            if self.start_pos.contains_key(&EventKind::DragStart(button)) {
                let drag_duration = self
                    .start_times
                    .clear(Token::Marker(EventKind::DragStart(button)), now);
                let end = self.make_event(
                    EventKind::DragEnd(button),
                    Some(button),
                    self.over,
                    drag_duration,
                    current,
                    targets,
                );
                events.push(end);
                self.start_pos.remove(&EventKind::DragStart(button));
                // Any drag-end clears the one shared drag slot.
                self.dragging = false;
                self.drag_target = None;
            }
        }
    }

    fn process_move(
        &mut self,
        current: &MouseSnapshot,
        targets: &Targets,
        now: Duration,
        events: &mut Vec<Event>,
    ) {
        if current.pos == self.prev.pos {
            return;
        }

        let mut moved = self.make_event(
            EventKind::MouseMove,
            None,
            self.over,
            Duration::ZERO,
            current,
            targets,
        );
        if let EventData::Mouse { start_pos, .. } = &mut moved.data {
            *start_pos = self.prev.pos;
        }
        events.push(moved);

        // First move with a button held promotes the press into a drag.
        for button in MouseButton::ALL {
            if !current.is_pressed(button)
                || self.start_pos.contains_key(&EventKind::DragStart(button))
            {
                continue;
            }
            self.start_pos
                .insert(EventKind::DragStart(button), current.pos);
            self.start_times
                .start(Token::Marker(EventKind::DragStart(button)), now);
            self.dragging = true;
            self.drag_target = self.over;
            self.drag_offset = self
                .over
                .and_then(|id| targets.get(id))
                .map(|region| current.pos - region.pos)
                .unwrap_or(Vec2::ZERO);
            let event = self.make_event(
                EventKind::DragStart(button),
                Some(button),
                self.over,
                Duration::ZERO,
                current,
                targets,
            );
            events.push(event);
        }
    }

    fn make_event(
        &self,
        kind: EventKind,
        button: Option<MouseButton>,
        target: Option<TargetId>,
        duration: Duration,
        current: &MouseSnapshot,
        targets: &Targets,
    ) -> Event {
        let start_pos = self
            .start_pos
            .get(&kind.start_kind())
            .copied()
            .unwrap_or(current.pos);
        // Offsets are not recomputed while a drag was already running last
        // tick; the receiver keeps the offset from the drag's start.
        let offset = if self.was_dragging {
            self.drag_offset
        } else {
            target
                .and_then(|id| targets.get(id))
                .map(|region| current.pos - region.pos)
                .unwrap_or(Vec2::ZERO)
        };
        Event {
            kind,
            target,
            duration,
            data: EventData::Mouse {
                button,
                pos: current.pos,
                start_pos,
                dragging: self.dragging,
                drag_target: self.drag_target,
                offset,
            },
        }
    }
}
