//! Listener targets
//!
//! Listeners register a plain screen region with capability flags instead of
//! implementing an interface; the host updates the region when its widget
//! moves or changes state.

use std::collections::HashMap;

use glam::Vec2;

use crate::Aabb;

/// Dispatcher-issued identity for a registered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(super) u64);

/// Where a target sits on screen and whether it can receive input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRegion {
    pub pos: Vec2,
    /// Stacking order; the highest value under the cursor wins selection
    pub depth: f32,
    pub size: Vec2,
    /// Hidden targets receive no events
    pub visible: bool,
    /// Keyboard events require focus
    pub has_focus: bool,
    /// Master per-target input switch
    pub input_enabled: bool,
}

impl TargetRegion {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            depth: 0.0,
            size,
            visible: true,
            has_focus: false,
            input_enabled: true,
        }
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_focus(mut self) -> Self {
        self.has_focus = true;
        self
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Registered targets, keyed by issued id.
#[derive(Debug, Default)]
pub(crate) struct Targets {
    map: HashMap<TargetId, TargetRegion>,
    next: u64,
}

impl Targets {
    pub fn insert(&mut self, region: TargetRegion) -> TargetId {
        let id = TargetId(self.next);
        self.next += 1;
        self.map.insert(id, region);
        id
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetRegion> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetRegion> {
        self.map.get_mut(&id)
    }

    pub fn remove(&mut self, id: TargetId) -> Option<TargetRegion> {
        self.map.remove(&id)
    }

    /// The visible, input-enabled target under the cursor point with the
    /// highest depth. Ties resolve to the lowest id for determinism.
    pub fn target_at(&self, point: Vec2) -> Option<TargetId> {
        let mut ids: Vec<&TargetId> = self.map.keys().collect();
        ids.sort();

        let mut best: Option<(TargetId, f32)> = None;
        for &id in ids {
            let region = &self.map[&id];
            if !region.visible || !region.input_enabled {
                continue;
            }
            if !region.rect().contains_point(point) {
                continue;
            }
            if best.is_none_or(|(_, depth)| region.depth > depth) {
                best = Some((id, region.depth));
            }
        }
        best.map(|(id, _)| id)
    }
}
