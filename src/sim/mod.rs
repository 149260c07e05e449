//! Deterministic game simulation
//!
//! - `mask`: per-sprite alpha buffers and the pixel-exact intersection test
//! - `state`: entities and game state
//! - `collision`: side classification, hit-pattern collapse, bounce resolution
//! - `tick`: per-frame update

pub mod collision;
pub mod mask;
pub mod state;
pub mod tick;

pub use collision::{collapse_hit_pattern, paddle_deflect_x, resolve_brick_bounce, Collapsed, HitPattern, Side};
pub use mask::{pixels_intersect, PixelMask};
pub use state::{Ball, Brick, BrickKind, GamePhase, GameState, Paddle, PowerUp, PowerUpKind};
pub use tick::{tick, TickInput};
