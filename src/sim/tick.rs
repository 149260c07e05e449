//! Per-frame simulation update

use glam::Vec2;
use log::{debug, info};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{paddle_deflect_x, resolve_brick_bounce, HitPattern};
use super::mask::pixels_intersect;
use super::state::{GamePhase, GameState, Particle, PowerUp, PowerUpKind, MAX_PARTICLES};
use crate::audio::{AudioCue, CuePlayer};
use crate::consts::*;
use crate::level::LevelSet;

/// Player input sampled for one tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Release a held ball
    pub launch: bool,
    /// Debug shortcut: jump straight to the next level
    pub skip_level: bool,
}

/// Advance the simulation by one fixed step. `dt` is the step length in
/// seconds and only drives the power-up timers; movement is per-tick.
pub fn tick(
    state: &mut GameState,
    levels: &LevelSet,
    input: &TickInput,
    dt: f32,
    cues: &mut dyn CuePlayer,
) {
    state.time_ticks += 1;

    if state.phase == GamePhase::GameOver {
        update_particles(state, dt);
        return;
    }

    if input.skip_level {
        advance_level(state, levels);
        return;
    }

    if input.move_left {
        state.paddle.slide(-1.0);
    }
    if input.move_right {
        state.paddle.slide(1.0);
    }

    update_falling_power_ups(state);
    update_active_powers(state, dt);

    match state.phase {
        GamePhase::Serve => {
            state.ball.pos = super::state::held_position(&state.paddle, state.ball.size);
            if input.launch {
                state.phase = GamePhase::Playing;
            }
        }
        GamePhase::Playing => {
            state.ball.step();
            state.ball.record_trail();
            check_walls(state, cues);
            if state.phase == GamePhase::Playing {
                check_bricks(state, levels, cues);
            }
            if state.phase == GamePhase::Playing {
                check_paddle(state, cues);
            }
        }
        GamePhase::GameOver => {}
    }

    catch_power_ups(state, cues);
    update_particles(state, dt);
}

/// Falling power-ups drop at a fixed rate and vanish well below the field.
fn update_falling_power_ups(state: &mut GameState) {
    for power_up in &mut state.power_ups {
        power_up.pos.y += POWER_UP_FALL_SPEED;
    }
    state
        .power_ups
        .retain(|p| p.pos.y <= FIELD_HEIGHT + POWER_UP_LOSS_SLACK);
}

/// Tick active effect timers and undo expired effects.
fn update_active_powers(state: &mut GameState, dt: f32) {
    // Splitting the borrow: timers advance first, then expired entries are
    // drained so expire() can touch ball and paddle.
    for power in &mut state.active_powers {
        power.timer += dt;
    }
    let mut i = 0;
    while i < state.active_powers.len() {
        if state.active_powers[i].timer >= state.active_powers[i].max_timer {
            let mut power = state.active_powers.remove(i);
            debug!("power-up {:?} expired", power.kind);
            power.expire(&mut state.ball, &mut state.paddle);
        } else {
            i += 1;
        }
    }
}

fn check_walls(state: &mut GameState, cues: &mut dyn CuePlayer) {
    let rect = state.ball.rect();
    let field = crate::field_rect();

    if rect.right() >= field.right() {
        if state.ball.direction.x > 0.0 {
            state.ball.direction.x = -state.ball.direction.x;
        }
        cues.play(AudioCue::BallHit);
    } else if rect.left() <= field.left() {
        if state.ball.direction.x < 0.0 {
            state.ball.direction.x = -state.ball.direction.x;
        }
        cues.play(AudioCue::BallHit);
    }

    if rect.top() <= field.top() && state.ball.direction.y < 0.0 {
        state.ball.direction.y = -state.ball.direction.y;
        cues.play(AudioCue::BallHit);
        state.ball.bounce(false);
    }

    // The slack keeps the loss from registering the instant the ball dips
    // below the field edge.
    if field.bottom() + FIELD_BORDER + BALL_LOSS_SLACK <= rect.top() {
        lose_ball(state, cues);
    }
}

fn lose_ball(state: &mut GameState, cues: &mut dyn CuePlayer) {
    cues.play(AudioCue::BallLost);
    state.lives -= 1;
    // Effects die with the ball; the fresh ball/paddle make them moot.
    state.active_powers.clear();
    state.reset_ball();
    if state.lives <= 0 {
        info!("game over with score {}", state.score);
        state.phase = GamePhase::GameOver;
    }
}

fn check_bricks(state: &mut GameState, levels: &LevelSet, cues: &mut dyn CuePlayer) {
    let ball_rect = state.ball.rect();
    let mut pattern = HitPattern::default();
    let mut destroyed = Vec::new();

    for (i, brick) in state.bricks.iter_mut().enumerate() {
        let brick_rect = brick.rect();
        if !ball_rect.intersects(&brick_rect) {
            continue;
        }
        if !pixels_intersect(&ball_rect, &state.ball.mask, &brick_rect, &brick.mask) {
            continue;
        }

        pattern.record(&ball_rect, &brick_rect);
        let hit = brick.hit();
        state.score += hit.score;
        cues.play(AudioCue::BrickHit);
        state.ball.bounce(false);
        if hit.destroyed {
            destroyed.push(i);
        }
    }

    // Remove destroyed bricks back-to-front and release their power-ups.
    for &i in destroyed.iter().rev() {
        let brick = state.bricks.remove(i);
        spawn_explosion(state, brick.rect().center());
        if let Some(mut power_up) = brick.power_up {
            power_up.active = true;
            state.power_ups.push(power_up);
        }
    }
    if pattern.brick_count() > 0 {
        let center = state.ball.center();
        spawn_impact(state, center);
    }

    if pattern.brick_count() > 0 && state.is_completed() {
        advance_level(state, levels);
        return;
    }

    if !state.ball.meteor {
        state.ball.direction = resolve_brick_bounce(state.ball.direction, &pattern);
    }
}

fn check_paddle(state: &mut GameState, cues: &mut dyn CuePlayer) {
    let ball_rect = state.ball.rect();
    let paddle_rect = state.paddle.rect();
    if !ball_rect.intersects(&paddle_rect) || state.ball.bounce_off_paddle {
        return;
    }
    if !pixels_intersect(&ball_rect, &state.ball.mask, &paddle_rect, &state.paddle.mask) {
        return;
    }

    state.ball.direction.y = -state.ball.direction.y;
    cues.play(AudioCue::BallHit);
    state.ball.bounce(true);
    state.ball.direction.x =
        paddle_deflect_x(state.ball.direction, state.ball.center().x, &paddle_rect);
}

/// Paddle catches a falling power-up: apply its effect, bank the bonus and
/// start (or extend) its timer.
fn catch_power_ups(state: &mut GameState, cues: &mut dyn CuePlayer) {
    let paddle_rect = state.paddle.rect();
    let mut caught = Vec::new();
    let mut i = 0;
    while i < state.power_ups.len() {
        if state.power_ups[i].active && state.power_ups[i].rect().intersects(&paddle_rect) {
            caught.push(state.power_ups.remove(i));
        } else {
            i += 1;
        }
    }

    for mut power_up in caught {
        cues.play(AudioCue::PowerUp);
        power_up.apply(&mut state.ball, &mut state.paddle);
        state.score += POWER_UP_SCORE;
        activate_power(state, power_up);
    }
}

/// A second Meteor extends the running one instead of stacking.
fn activate_power(state: &mut GameState, power_up: PowerUp) {
    if power_up.kind == PowerUpKind::Meteor {
        if let Some(existing) = state
            .active_powers
            .iter_mut()
            .find(|p| p.kind == PowerUpKind::Meteor)
        {
            existing.max_timer += power_up.max_timer;
            return;
        }
    }
    let mut power_up = power_up;
    power_up.activated = true;
    state.active_powers.push(power_up);
}

/// Move to the next level, carrying score and lives over. Running past the
/// last level wraps back to the first.
fn advance_level(state: &mut GameState, levels: &LevelSet) {
    let next = state.level_number + 1;
    info!("level {} cleared, loading level {next}", state.level_number);
    state.apply_level(levels, next);
    state.reset_ball();
}

fn spawn_impact(state: &mut GameState, pos: Vec2) {
    spawn_particles(state, pos, 8, 1.5);
}

fn spawn_explosion(state: &mut GameState, pos: Vec2) {
    spawn_particles(state, pos, 24, 3.0);
}

fn spawn_particles(state: &mut GameState, pos: Vec2, count: usize, speed: f32) {
    let mut rng = Pcg32::seed_from_u64(state.seed ^ state.time_ticks);
    for _ in 0..count {
        if state.particles.len() >= MAX_PARTICLES {
            break;
        }
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        state.particles.push(Particle {
            pos,
            vel: Vec2::from_angle(angle) * speed * rng.random_range(0.3..1.0),
            life: rng.random_range(0.3..0.8),
            size: rng.random_range(1.0..3.0),
        });
    }
}

fn update_particles(state: &mut GameState, dt: f32) {
    for particle in &mut state.particles {
        particle.pos += particle.vel;
        particle.vel *= 0.96;
        particle.life -= dt;
    }
    state.particles.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingCuePlayer;
    use crate::sim::mask::PixelMask;
    use crate::sim::state::{Ball, Brick, BrickKind};

    const DT: f32 = 1.0 / 60.0;

    fn levels() -> LevelSet {
        LevelSet::parse_all(&[
            "One,bg,0,11111".to_string(),
            "Two,bg,0,22222".to_string(),
        ])
        .unwrap()
    }

    fn playing_state() -> GameState {
        let mut state = GameState::new(&levels(), 1, 1);
        state.phase = GamePhase::Playing;
        state.bricks.clear();
        state
    }

    fn brick_at(pos: Vec2, kind: BrickKind) -> Brick {
        Brick {
            pos,
            size: Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
            kind,
            mask: PixelMask::opaque(BRICK_WIDTH as u32, BRICK_HEIGHT as u32),
            power_up: None,
        }
    }

    fn step(state: &mut GameState, levels: &LevelSet) -> RecordingCuePlayer {
        let mut cues = RecordingCuePlayer::default();
        tick(state, levels, &TickInput::default(), DT, &mut cues);
        cues
    }

    #[test]
    fn test_serve_ball_follows_paddle_until_launch() {
        let levels = levels();
        let mut state = GameState::new(&levels, 1, 1);
        let mut cues = RecordingCuePlayer::default();

        let input = TickInput {
            move_right: true,
            ..Default::default()
        };
        tick(&mut state, &levels, &input, DT, &mut cues);
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(
            state.ball.pos.x,
            state.paddle.pos.x + state.paddle.size.x / 2.0
        );

        let input = TickInput {
            launch: true,
            ..Default::default()
        };
        tick(&mut state, &levels, &input, DT, &mut cues);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_side_wall_bounce_keeps_speed() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.pos = Vec2::new(FIELD_WIDTH - state.ball.size.x, 300.0);
        state.ball.direction = Vec2::new(1.0, -1.0);
        let speed = state.ball.speed;

        let cues = step(&mut state, &levels);
        assert!(state.ball.direction.x < 0.0);
        // Side walls do not feed the speed creep
        assert_eq!(state.ball.speed, speed);
        assert_eq!(cues.count(AudioCue::BallHit), 1);
    }

    #[test]
    fn test_top_wall_bounce_increments_speed() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.pos = Vec2::new(300.0, 0.0);
        state.ball.direction = Vec2::new(1.0, -1.0);
        let speed = state.ball.speed;

        step(&mut state, &levels);
        assert!(state.ball.direction.y > 0.0);
        assert_eq!(state.ball.speed, speed + SPEED_INCREMENT);
        assert!(!state.ball.bounce_off_paddle);
    }

    #[test]
    fn test_lost_ball_costs_a_life_and_reserves() {
        let levels = levels();
        let mut state = playing_state();
        state.score = 500;
        state.active_powers.push(PowerUp::new(
            PowerUpKind::Meteor,
            Vec2::ZERO,
            Vec2::ONE,
        ));
        state.ball.pos = Vec2::new(300.0, FIELD_HEIGHT + FIELD_BORDER + BALL_LOSS_SLACK + 1.0);
        state.ball.direction = Vec2::new(0.5, 1.0);

        let cues = step(&mut state, &levels);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.phase, GamePhase::Serve);
        assert!(state.active_powers.is_empty());
        assert_eq!(state.score, 500);
        assert_eq!(cues.count(AudioCue::BallLost), 1);
    }

    #[test]
    fn test_last_life_ends_the_game() {
        let levels = levels();
        let mut state = playing_state();
        state.lives = 1;
        state.ball.pos = Vec2::new(300.0, FIELD_HEIGHT + FIELD_BORDER + BALL_LOSS_SLACK + 1.0);
        state.ball.direction = Vec2::new(0.5, 1.0);

        step(&mut state, &levels);
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_brick_hit_scores_and_bounces() {
        let levels = levels();
        let mut state = playing_state();
        let mut brick = brick_at(Vec2::new(300.0, 200.0), BrickKind::Ice);
        brick.power_up = Some(PowerUp::new(
            PowerUpKind::SpeedUp,
            brick.pos,
            brick.size,
        ));
        state.bricks.push(brick);
        state.bricks.push(brick_at(Vec2::new(350.0, 200.0), BrickKind::Normal));
        // Approaching the Ice brick from below, center past its bottom edge
        state.ball.pos = Vec2::new(310.0, 220.0);
        state.ball.direction = Vec2::new(0.5, -1.0);
        state.ball.speed = 0.0;

        let cues = step(&mut state, &levels);
        assert_eq!(state.score, 10);
        assert_eq!(state.bricks[0].kind, BrickKind::Normal);
        assert!(state.ball.direction.y > 0.0);
        assert_eq!(cues.count(AudioCue::BrickHit), 1);

        // Second hit destroys it and releases the power-up
        step(&mut state, &levels);
        assert_eq!(state.score, 210);
        assert_eq!(state.bricks.len(), 1);
        assert_eq!(state.power_ups.len(), 1);
        assert!(state.power_ups[0].active);
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_two_brick_corner_hit_inverts_both_axes() {
        let levels = levels();
        let mut state = playing_state();
        // Ball straddles two bricks: center past the right edge of the first
        // and above the top of the second, so the pattern reads r then t.
        state.bricks.push(brick_at(Vec2::new(200.0, 200.0), BrickKind::Normal));
        state.bricks.push(brick_at(Vec2::new(250.0, 210.0), BrickKind::Normal));
        state.bricks.push(brick_at(Vec2::new(500.0, 400.0), BrickKind::Metal));
        state.ball.pos = Vec2::new(244.0, 198.0);
        state.ball.direction = Vec2::new(1.0, -1.0);
        state.ball.speed = 0.0;

        step(&mut state, &levels);
        assert_eq!(state.ball.direction, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn test_meteor_ball_passes_through_bricks() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.meteor = true;
        state.bricks.push(brick_at(Vec2::new(300.0, 200.0), BrickKind::Stone));
        state.bricks.push(brick_at(Vec2::new(400.0, 400.0), BrickKind::Normal));
        state.ball.pos = Vec2::new(310.0, 205.0);
        state.ball.direction = Vec2::new(0.5, -1.0);
        state.ball.speed = 0.0;
        let speed_before = state.ball.speed;

        step(&mut state, &levels);
        // Brick still takes the hit, ball keeps its course
        assert_eq!(state.bricks[0].kind, BrickKind::Ice);
        assert_eq!(state.ball.direction, Vec2::new(0.5, -1.0));
        // and the bounce side effect still applies
        assert_eq!(state.ball.speed, speed_before + SPEED_INCREMENT);
    }

    #[test]
    fn test_paddle_bounce_gated_by_flag() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.speed = 0.0;
        state.ball.pos = Vec2::new(
            state.paddle.pos.x + 40.0,
            state.paddle.pos.y - state.ball.size.y / 2.0,
        );
        state.ball.direction = Vec2::new(0.5, 1.0);

        // Flag still set from the serve: no bounce
        state.ball.bounce_off_paddle = true;
        step(&mut state, &levels);
        assert!(state.ball.direction.y > 0.0);

        // Cleared by a wall/brick bounce on the way down: bounce fires
        state.ball.bounce_off_paddle = false;
        step(&mut state, &levels);
        assert!(state.ball.direction.y < 0.0);
        assert!(state.ball.bounce_off_paddle);
    }

    #[test]
    fn test_paddle_bounce_deflects_by_contact_point() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.speed = 0.0;
        state.ball.bounce_off_paddle = false;
        // Rightward ball striking near the paddle's right edge
        state.ball.pos = Vec2::new(
            state.paddle.pos.x + state.paddle.size.x - 12.0,
            state.paddle.pos.y - state.ball.size.y / 2.0,
        );
        state.ball.direction = Vec2::new(1.0, 1.0);

        step(&mut state, &levels);
        assert!(state.ball.direction.x > 1.0);
        assert!(state.ball.direction.x <= X_CHANGE_MAX);
    }

    #[test]
    fn test_power_up_falls_and_is_caught() {
        let levels = levels();
        let mut state = playing_state();
        let mut power_up = PowerUp::new(
            PowerUpKind::PaddleInc,
            Vec2::new(state.paddle.pos.x + 20.0, state.paddle.pos.y - 40.0),
            Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
        );
        power_up.active = true;
        state.power_ups.push(power_up);
        // Park the ball away from everything
        state.ball.pos = Vec2::new(100.0, 100.0);
        state.ball.speed = 0.0;
        let width_before = state.paddle.size.x;

        let mut caught = false;
        for _ in 0..30 {
            let cues = step(&mut state, &levels);
            if cues.count(AudioCue::PowerUp) > 0 {
                caught = true;
                break;
            }
        }
        assert!(caught);
        assert_eq!(state.paddle.size.x, width_before + PADDLE_SIZE_STEP);
        assert_eq!(state.score, POWER_UP_SCORE);
        assert!(state.power_ups.is_empty());
        assert_eq!(state.active_powers.len(), 1);
        assert!(state.active_powers[0].activated);
    }

    #[test]
    fn test_missed_power_up_despawns_below_field() {
        let levels = levels();
        let mut state = playing_state();
        let mut power_up = PowerUp::new(
            PowerUpKind::SpeedUp,
            Vec2::new(30.0, FIELD_HEIGHT + POWER_UP_LOSS_SLACK - 1.0),
            Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
        );
        power_up.active = true;
        state.power_ups.push(power_up);
        state.ball.pos = Vec2::new(300.0, 100.0);
        state.ball.speed = 0.0;

        step(&mut state, &levels);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_active_power_expires_with_inverse_effect() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.pos = Vec2::new(300.0, 100.0);
        state.ball.speed = 0.1;
        let mut power = PowerUp::new(PowerUpKind::SpeedUp, Vec2::ZERO, Vec2::ONE);
        power.activated = true;
        power.timer = power.max_timer - DT / 2.0;
        state.active_powers.push(power);

        step(&mut state, &levels);
        assert!(state.active_powers.is_empty());
        assert!((state.ball.speed - (0.1 - POWER_UP_SPEED_CHANGE)).abs() < 1e-6);
    }

    #[test]
    fn test_second_meteor_extends_the_first() {
        let levels = levels();
        let mut state = playing_state();
        let mut running = PowerUp::new(PowerUpKind::Meteor, Vec2::ZERO, Vec2::ONE);
        running.activated = true;
        running.timer = 10.0;
        state.active_powers.push(running);

        let fresh = PowerUp::new(PowerUpKind::Meteor, Vec2::ZERO, Vec2::ONE);
        activate_power(&mut state, fresh);

        assert_eq!(state.active_powers.len(), 1);
        assert_eq!(
            state.active_powers[0].max_timer,
            PowerUpKind::Meteor.max_timer() * 2.0
        );
    }

    #[test]
    fn test_clearing_last_brick_advances_level() {
        let levels = levels();
        let mut state = playing_state();
        state.score = 1000;
        state.lives = 2;
        state.bricks.push(brick_at(Vec2::new(300.0, 200.0), BrickKind::Normal));
        state.ball.pos = Vec2::new(310.0, 220.0);
        state.ball.direction = Vec2::new(0.5, -1.0);
        state.ball.speed = 0.0;

        step(&mut state, &levels);
        assert_eq!(state.level_number, 2);
        assert_eq!(state.level_title, "Two");
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.lives, 2);
        // Destruction score banked before the advance
        assert_eq!(state.score, 1200);
        assert!(!state.bricks.is_empty());
    }

    #[test]
    fn test_empty_field_without_a_hit_does_not_advance() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.pos = Vec2::new(300.0, 100.0);
        state.ball.speed = 0.0;

        // No bricks and no contact this tick: the level only advances off
        // the hit that cleared the last brick.
        step(&mut state, &levels);
        assert_eq!(state.level_number, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.bricks.is_empty());
    }

    #[test]
    fn test_level_past_the_end_wraps_to_first() {
        let levels = levels();
        let mut state = playing_state();
        state.level_number = 2;
        state.bricks.push(brick_at(Vec2::new(300.0, 200.0), BrickKind::Normal));
        state.ball.pos = Vec2::new(310.0, 220.0);
        state.ball.direction = Vec2::new(0.5, -1.0);
        state.ball.speed = 0.0;

        step(&mut state, &levels);
        assert_eq!(state.level_number, 1);
        assert_eq!(state.level_title, "One");
    }

    #[test]
    fn test_game_over_freezes_the_field() {
        let levels = levels();
        let mut state = playing_state();
        state.phase = GamePhase::GameOver;
        let ball_pos = state.ball.pos;
        let input = TickInput {
            move_left: true,
            launch: true,
            ..Default::default()
        };
        let mut cues = RecordingCuePlayer::default();
        tick(&mut state, &levels, &input, DT, &mut cues);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.ball.pos, ball_pos);
        assert!(cues.cues.is_empty());
    }

    #[test]
    fn test_particles_decay() {
        let levels = levels();
        let mut state = playing_state();
        state.ball.pos = Vec2::new(300.0, 100.0);
        state.ball.speed = 0.0;
        state.particles.push(Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ONE,
            life: DT / 2.0,
            size: 2.0,
        });
        step(&mut state, &levels);
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_trail_caps_length() {
        let paddle = crate::sim::state::Paddle::default();
        let mut ball = Ball::new(&paddle);
        for _ in 0..50 {
            ball.record_trail();
        }
        assert_eq!(ball.trail.len(), crate::sim::state::TRAIL_LENGTH);
    }
}
