//! Bounce resolution
//!
//! Brick contacts are classified by where the ball's center sits relative to
//! the brick's box: beyond the right edge, left edge, above the top, below the
//! bottom. A corner contact sets two flags. All contacts in a tick are
//! accumulated into a [`HitPattern`] and resolved into one direction change,
//! so striking several bricks at once still produces a single sane bounce.

use glam::Vec2;

use crate::consts::{X_CHANGE_MAX, X_CHANGE_MIN};
use crate::Aabb;

/// Which side of a brick the ball's center fell beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Accumulated brick contacts for one tick.
#[derive(Debug, Clone, Default)]
pub struct HitPattern {
    sides: Vec<Side>,
    bricks: u32,
}

impl HitPattern {
    /// Record one confirmed brick contact, classifying its side flags.
    pub fn record(&mut self, ball: &Aabb, brick: &Aabb) {
        self.bricks += 1;
        let center = ball.center();
        if center.x > brick.right() {
            self.sides.push(Side::Right);
        }
        if center.x < brick.left() {
            self.sides.push(Side::Left);
        }
        if center.y < brick.top() {
            self.sides.push(Side::Top);
        }
        if center.y > brick.bottom() {
            self.sides.push(Side::Bottom);
        }
    }

    pub fn brick_count(&self) -> u32 {
        self.bricks
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    fn has(&self, side: Side) -> bool {
        self.sides.contains(&side)
    }
}

/// A multi-brick pattern collapsed down to its surviving votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapsed {
    /// Opposing votes canceled out entirely
    Empty,
    /// A surplus of two or more on one axis
    Horizontal,
    Vertical,
    /// Distinct leftovers on both axes (or a lone vote)
    Mixed,
}

/// Cancel opposing side votes (top against bottom, left against right) and
/// classify what survives. A single raw vote counts double, the way a lone
/// contact flag among several bricks reads as a clean side hit.
pub fn collapse_hit_pattern(sides: &[Side]) -> Collapsed {
    if sides.len() == 1 {
        return if sides[0].is_horizontal() {
            Collapsed::Horizontal
        } else {
            Collapsed::Vertical
        };
    }

    let count = |side: Side| sides.iter().filter(|&&s| s == side).count();
    let vertical = count(Side::Top).abs_diff(count(Side::Bottom));
    let horizontal = count(Side::Left).abs_diff(count(Side::Right));

    if vertical >= 2 {
        Collapsed::Vertical
    } else if horizontal >= 2 {
        Collapsed::Horizontal
    } else if vertical + horizontal == 0 {
        Collapsed::Empty
    } else {
        Collapsed::Mixed
    }
}

/// Choose the post-bounce direction for the brick contacts of one tick.
/// Returns `direction` unchanged when no brick was struck.
pub fn resolve_brick_bounce(direction: Vec2, pattern: &HitPattern) -> Vec2 {
    match pattern.brick_count() {
        0 => direction,
        1 => match pattern.sides() {
            [side] => {
                if side.is_horizontal() {
                    Vec2::new(-direction.x, direction.y)
                } else {
                    Vec2::new(direction.x, -direction.y)
                }
            }
            // Corner contact: snap to the diagonal pointing away from it.
            // A flagless contact (center buried in the brick) reads top-right.
            _ => {
                if pattern.has(Side::Left) && pattern.has(Side::Bottom) {
                    Vec2::new(-1.0, 1.0)
                } else if pattern.has(Side::Right) && pattern.has(Side::Bottom) {
                    Vec2::new(1.0, 1.0)
                } else if pattern.has(Side::Left) && pattern.has(Side::Top) {
                    Vec2::new(-1.0, -1.0)
                } else {
                    Vec2::new(1.0, -1.0)
                }
            }
        },
        _ => match collapse_hit_pattern(pattern.sides()) {
            Collapsed::Horizontal => Vec2::new(-direction.x, direction.y),
            Collapsed::Vertical => Vec2::new(direction.x, -direction.y),
            Collapsed::Empty | Collapsed::Mixed => -direction,
        },
    }
}

/// Horizontal deflection for a paddle bounce. The multiplier grows with the
/// distance of the contact point from the paddle's near edge, clamped to
/// [`X_CHANGE_MIN`, `X_CHANGE_MAX`]; a near-vertical result is pushed out to
/// ±0.4 so the ball always works its way toward the sides.
pub fn paddle_deflect_x(direction: Vec2, ball_center_x: f32, paddle: &Aabb) -> f32 {
    let half_width = paddle.size.x / 2.0;
    let ratio = if direction.x > 0.0 {
        (ball_center_x - paddle.pos.x) / half_width
    } else {
        (paddle.pos.x + paddle.size.x - ball_center_x) / half_width
    }
    .clamp(X_CHANGE_MIN, X_CHANGE_MAX);

    let x = direction.x * ratio;
    if x.abs() < 0.2 {
        if direction.x <= 0.0 { -0.4 } else { 0.4 }
    } else {
        x
    }
}
