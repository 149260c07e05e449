//! Game state and entity types
//!
//! Entities are plain data records (position, size, mask); behavior lives in
//! free functions and the tick. No draw or platform state in here.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::mask::PixelMask;
use crate::consts::*;
use crate::level::{LevelDef, LevelSet};
use crate::Aabb;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball held on the paddle, waiting for launch input
    Serve,
    /// Active gameplay
    Playing,
    /// Lives exhausted; score hand-off is the host's concern
    GameOver,
}

/// Trail point for ball rendering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
}

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 20;

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub size: Vec2,
    /// Bounce-resolved direction vector; roughly unit-scale but not normalized
    pub direction: Vec2,
    pub speed: f32,
    /// Set on a paddle bounce, cleared by any wall/brick bounce. Gates
    /// re-triggering while the ball is still overlapping the paddle.
    pub bounce_off_paddle: bool,
    /// Meteor mode: the ball passes through bricks without bouncing
    pub meteor: bool,
    pub mask: PixelMask,
    /// Trail history, newest first (at most one trail per ball)
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl Ball {
    /// New ball resting centered above the paddle.
    pub fn new(paddle: &Paddle) -> Self {
        let size = Vec2::splat(BALL_SIZE);
        Self {
            pos: held_position(paddle, size),
            size,
            direction: Vec2::new(1.0, -1.0),
            speed: BALL_START_SPEED,
            bounce_off_paddle: true,
            meteor: false,
            mask: PixelMask::opaque(BALL_SIZE as u32, BALL_SIZE as u32),
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Advance along the current direction by one tick's displacement.
    pub fn step(&mut self) {
        self.pos += self.direction * (self.speed * BALL_STEP_SCALE);
    }

    /// Bounce side effect: speed always creeps up; the paddle flag records
    /// what the ball last bounced off.
    pub fn bounce(&mut self, off_paddle: bool) {
        self.bounce_off_paddle = off_paddle;
        self.speed += SPEED_INCREMENT;
    }

    /// Record the current position to the trail (call each tick when moving).
    pub fn record_trail(&mut self) {
        self.trail.insert(0, TrailPoint { pos: self.pos });
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}

/// Resting position for a held ball: centered over the paddle, one pixel above.
pub fn held_position(paddle: &Paddle, ball_size: Vec2) -> Vec2 {
    Vec2::new(
        paddle.pos.x + paddle.size.x / 2.0,
        paddle.pos.y - (ball_size.y + 1.0),
    )
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub size: Vec2,
    pub mask: PixelMask,
}

impl Default for Paddle {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PADDLE_START_X, PADDLE_START_Y),
            size: Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
            mask: PixelMask::opaque(PADDLE_WIDTH as u32, PADDLE_HEIGHT as u32),
        }
    }
}

impl Paddle {
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Move one step left/right, clamped to the field.
    pub fn slide(&mut self, dir: f32) {
        self.pos.x += dir.signum() * PADDLE_MOVE_SPEED;
        self.pos.x = self.pos.x.clamp(0.0, FIELD_WIDTH - self.size.x);
    }

    /// Widen by one power-up step, keeping the center fixed. No-op at the cap.
    pub fn grow(&mut self) {
        if self.size.x < PADDLE_MAX_WIDTH {
            self.size.x += PADDLE_SIZE_STEP;
            self.pos.x -= PADDLE_SIZE_STEP / 2.0;
        }
    }

    /// Narrow by one power-up step, keeping the center fixed. No-op at the floor.
    pub fn shrink(&mut self) {
        if self.size.x > PADDLE_MIN_WIDTH {
            self.size.x -= PADDLE_SIZE_STEP;
            self.pos.x += PADDLE_SIZE_STEP / 2.0;
        }
    }
}

/// Brick tiers. Hits downgrade one tier at a time; Normal bricks are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrickKind {
    Normal,
    Ice,
    Stone,
    Metal,
    /// Scores like a bonus brick, then behaves as Normal
    Rogue,
}

impl BrickKind {
    /// Level-file digit codes (1–5); 0 is an empty cell.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BrickKind::Normal),
            2 => Some(BrickKind::Ice),
            3 => Some(BrickKind::Stone),
            4 => Some(BrickKind::Metal),
            5 => Some(BrickKind::Rogue),
            _ => None,
        }
    }
}

/// Outcome of one brick hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickHit {
    pub score: i64,
    pub destroyed: bool,
}

/// A brick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: BrickKind,
    pub mask: PixelMask,
    /// Dormant power-up released when the brick is destroyed
    pub power_up: Option<PowerUp>,
}

impl Brick {
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Apply one hit: downgrade a tier and award its score, or mark a Normal
    /// brick destroyed. Never skips a tier.
    pub fn hit(&mut self) -> BrickHit {
        let (next, score) = match self.kind {
            BrickKind::Rogue => (Some(BrickKind::Normal), 100),
            BrickKind::Metal => (Some(BrickKind::Stone), 50),
            BrickKind::Stone => (Some(BrickKind::Ice), 30),
            BrickKind::Ice => (Some(BrickKind::Normal), 10),
            BrickKind::Normal => (None, 200),
        };
        match next {
            Some(kind) => {
                self.kind = kind;
                BrickHit {
                    score,
                    destroyed: false,
                }
            }
            None => BrickHit {
                score,
                destroyed: true,
            },
        }
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    SpeedUp,
    SpeedDown,
    PaddleInc,
    PaddleDec,
    Meteor,
}

impl PowerUpKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PowerUpKind::SpeedUp),
            2 => Some(PowerUpKind::SpeedDown),
            3 => Some(PowerUpKind::PaddleInc),
            4 => Some(PowerUpKind::PaddleDec),
            5 => Some(PowerUpKind::Meteor),
            _ => None,
        }
    }

    /// Effect duration in seconds once caught
    pub fn max_timer(&self) -> f32 {
        match self {
            PowerUpKind::SpeedUp | PowerUpKind::SpeedDown => 15.0,
            PowerUpKind::PaddleInc | PowerUpKind::PaddleDec => 60.0,
            PowerUpKind::Meteor => 30.0,
        }
    }
}

/// A power-up: dormant while attached to a brick, falling once `active`,
/// a timed effect once `activated`, gone when consumed or off-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: Vec2,
    /// Falling and collectible
    pub active: bool,
    /// Caught; the timed effect is running
    pub activated: bool,
    /// Seconds elapsed since activation
    pub timer: f32,
    /// Seconds until expiry; Meteor extension adds to this
    pub max_timer: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            pos,
            size,
            active: false,
            activated: false,
            timer: 0.0,
            max_timer: kind.max_timer(),
        }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Apply the caught effect to the ball/paddle.
    pub fn apply(&mut self, ball: &mut Ball, paddle: &mut Paddle) {
        match self.kind {
            PowerUpKind::SpeedUp => ball.speed += POWER_UP_SPEED_CHANGE,
            PowerUpKind::SpeedDown => ball.speed -= POWER_UP_SPEED_CHANGE,
            PowerUpKind::PaddleInc => paddle.grow(),
            PowerUpKind::PaddleDec => paddle.shrink(),
            PowerUpKind::Meteor => ball.meteor = true,
        }
        self.active = false;
    }

    /// Invert the effect when the timer runs out.
    pub fn expire(&mut self, ball: &mut Ball, paddle: &mut Paddle) {
        match self.kind {
            PowerUpKind::SpeedUp => ball.speed -= POWER_UP_SPEED_CHANGE,
            PowerUpKind::SpeedDown => ball.speed += POWER_UP_SPEED_CHANGE,
            PowerUpKind::PaddleInc => paddle.shrink(),
            PowerUpKind::PaddleDec => paddle.grow(),
            PowerUpKind::Meteor => ball.meteor = false,
        }
        self.activated = false;
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
}

/// Maximum particles
pub const MAX_PARTICLES: usize = 256;

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed (power-up placement)
    pub seed: u64,
    pub level_number: u32,
    pub level_title: String,
    pub background_asset: String,
    pub phase: GamePhase,
    pub lives: i32,
    pub score: i64,
    pub ball: Ball,
    pub paddle: Paddle,
    pub bricks: Vec<Brick>,
    /// Falling (active) power-ups
    pub power_ups: Vec<PowerUp>,
    /// Caught, timed power-up effects
    pub active_powers: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Tick counter, for deterministic particle spread
    pub time_ticks: u64,
}

impl GameState {
    /// Fresh game on the given level. An out-of-range level number clamps to
    /// the first level (the level set logs the fallback).
    pub fn new(levels: &LevelSet, level_number: u32, seed: u64) -> Self {
        let paddle = Paddle::default();
        let ball = Ball::new(&paddle);
        let mut state = Self {
            seed,
            level_number,
            level_title: String::new(),
            background_asset: String::new(),
            phase: GamePhase::Serve,
            lives: STARTING_LIVES,
            score: 0,
            ball,
            paddle,
            bricks: Vec::new(),
            power_ups: Vec::new(),
            active_powers: Vec::new(),
            particles: Vec::new(),
            time_ticks: 0,
        };
        state.apply_level(levels, level_number);
        state
    }

    /// Replace the brick field from a level definition, keeping score/lives.
    pub fn apply_level(&mut self, levels: &LevelSet, level_number: u32) {
        let (number, def) = levels.get_or_first(level_number);
        self.level_number = number;
        self.level_title = def.title.clone();
        self.background_asset = def.background_asset.clone();
        self.bricks = build_bricks(def);
        self.power_ups.clear();
        self.active_powers.clear();
        attach_power_ups(&mut self.bricks, def.power_up_count, self.seed ^ number as u64);
    }

    /// Reset ball and paddle to the serve position, keeping the level.
    pub fn reset_ball(&mut self) {
        self.paddle = Paddle::default();
        self.ball = Ball::new(&self.paddle);
        self.phase = GamePhase::Serve;
    }

    pub fn is_completed(&self) -> bool {
        self.bricks.is_empty()
    }
}

/// Instantiate bricks from the level's digit grid.
fn build_bricks(def: &LevelDef) -> Vec<Brick> {
    let size = Vec2::new(BRICK_WIDTH, BRICK_HEIGHT);
    let mask = PixelMask::opaque(BRICK_WIDTH as u32, BRICK_HEIGHT as u32);
    let mut bricks = Vec::new();
    for (row, cells) in def.rows.iter().enumerate() {
        for (column, &code) in cells.iter().enumerate() {
            if let Some(kind) = BrickKind::from_code(code) {
                bricks.push(Brick {
                    pos: Vec2::new(
                        column as f32 * BRICK_WIDTH,
                        (row as f32 + 2.0) * BRICK_HEIGHT,
                    ),
                    size,
                    kind,
                    mask: mask.clone(),
                    power_up: None,
                });
            }
        }
    }
    bricks
}

/// Attach up to `count` power-ups to distinct, randomly drawn bricks.
fn attach_power_ups(bricks: &mut [Brick], count: u32, seed: u64) {
    if bricks.is_empty() {
        return;
    }
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut free: Vec<usize> = (0..bricks.len()).collect();
    for _ in 0..count {
        if free.is_empty() {
            break;
        }
        let slot = rng.random_range(0..free.len());
        let idx = free.swap_remove(slot);
        let code = rng.random_range(1..=5u8);
        let kind = PowerUpKind::from_code(code).unwrap_or(PowerUpKind::SpeedUp);
        let brick = &mut bricks[idx];
        brick.power_up = Some(PowerUp::new(kind, brick.pos, brick.size));
    }
}
