//! Brickfall - a Breakout-style brick-breaker core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pixel-exact collisions, bounce resolution, game state)
//! - `input`: Polled-input event dispatcher (down/up/move/drag/hover with bubbling)
//! - `level`: Level-definition parsing and the level set
//! - `audio`: Cue-player abstraction the simulation fires into
//! - `settings`: Serde-backed preferences

pub mod audio;
pub mod input;
pub mod level;
pub mod settings;
pub mod sim;

pub use audio::{AudioCue, CuePlayer, NullCuePlayer};
pub use settings::Settings;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Play-field dimensions (field-local coordinates, y grows downward)
    pub const FIELD_WIDTH: f32 = 750.0;
    pub const FIELD_HEIGHT: f32 = 700.0;
    /// Border thickness around the play field; also the brick-grid row pitch
    pub const FIELD_BORDER: f32 = 25.0;
    /// Extra slack below the field before a fallen ball counts as lost
    pub const BALL_LOSS_SLACK: f32 = 50.0;

    /// Ball defaults
    pub const BALL_SIZE: f32 = 16.0;
    pub const BALL_START_SPEED: f32 = 0.05;
    /// Speed added on every bounce (walls, bricks, paddle)
    pub const SPEED_INCREMENT: f32 = 0.0001;
    /// Distance scale converting `speed` into per-tick displacement
    pub const BALL_STEP_SCALE: f32 = 100.0;
    /// Paddle-bounce horizontal ratio clamp
    pub const X_CHANGE_MIN: f32 = 0.7;
    pub const X_CHANGE_MAX: f32 = 1.3;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 125.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    pub const PADDLE_START_X: f32 = 351.0;
    pub const PADDLE_START_Y: f32 = 650.0;
    pub const PADDLE_MIN_WIDTH: f32 = 50.0;
    pub const PADDLE_MAX_WIDTH: f32 = 200.0;
    pub const PADDLE_MOVE_SPEED: f32 = 10.0;
    /// Width delta applied by the paddle size power-ups
    pub const PADDLE_SIZE_STEP: f32 = 25.0;

    /// Brick defaults
    pub const BRICK_WIDTH: f32 = 50.0;
    pub const BRICK_HEIGHT: f32 = 25.0;

    /// Power-up defaults
    pub const POWER_UP_FALL_SPEED: f32 = 3.0;
    pub const POWER_UP_SPEED_CHANGE: f32 = 0.01;
    pub const POWER_UP_SCORE: i64 = 100;
    /// Slack below the field before a falling power-up is discarded
    pub const POWER_UP_LOSS_SLACK: f32 = 100.0;

    pub const STARTING_LIVES: i32 = 3;
}

/// Axis-aligned bounding box in field coordinates (y grows downward).
///
/// Derived from an entity's position and size each time it is needed,
/// never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test; touching edges do not count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// The overlapping rectangle, if any.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(Aabb::new(
                Vec2::new(left, top),
                Vec2::new(right - left, bottom - top),
            ))
        } else {
            None
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }
}

/// The play field rectangle in field-local coordinates.
pub fn field_rect() -> Aabb {
    Aabb::new(
        Vec2::ZERO,
        Vec2::new(consts::FIELD_WIDTH, consts::FIELD_HEIGHT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        assert!(a.intersects(&b));

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.pos, Vec2::new(5.0, 5.0));
        assert_eq!(overlap.size, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_aabb_touching_edges_do_not_intersect() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_aabb_contains_point() {
        let a = Aabb::new(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0));
        assert!(a.contains_point(Vec2::new(2.0, 2.0)));
        assert!(a.contains_point(Vec2::new(5.9, 5.9)));
        assert!(!a.contains_point(Vec2::new(6.0, 6.0)));
    }
}
