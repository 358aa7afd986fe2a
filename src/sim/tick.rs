//! Fixed timestep simulation tick
//!
//! Core game loop entry point: advances the physics one step, folds the
//! result into the game state and evaluates the overflow countdown.

use std::time::{Duration, Instant};

use super::container::Container;
use super::physics;
use super::state::{GamePhase, GameState};

/// Whether the run continues after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSignal {
    Continue,
    GameOver,
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    /// Points earned this tick
    pub score_delta: u64,
    /// Merges performed this tick
    pub merges: u32,
    pub signal: TickSignal,
}

impl TickResult {
    fn game_over() -> Self {
        Self {
            score_delta: 0,
            merges: 0,
            signal: TickSignal::GameOver,
        }
    }

    #[inline]
    pub fn game_over_signaled(&self) -> bool {
        self.signal == TickSignal::GameOver
    }
}

/// Advance the game state by one fixed timestep
///
/// `now` is the wall-clock reading used only by the overflow countdown, so
/// the physics stays deterministic regardless of frame timing.
pub fn tick(state: &mut GameState, now: Instant) -> TickResult {
    if state.phase == GamePhase::GameOver {
        return TickResult::game_over();
    }

    state.time_ticks += 1;

    let report = physics::step(&mut state.balls, &state.settings.basket, &state.settings.physics);
    state.score += report.score_delta;

    // The drop is over once its ball has landed or been absorbed
    if let Some(id) = state.dropping {
        let in_flight = state.balls.iter().any(|b| b.id == id && !b.landed);
        if !in_flight {
            state.dropping = None;
        }
    }

    if report.game_over {
        state.end_game("ball out of bounds");
    } else {
        update_countdown(state, now);
    }
    state.refresh_phase();

    TickResult {
        score_delta: report.score_delta,
        merges: report.merges,
        signal: if state.phase == GamePhase::GameOver {
            TickSignal::GameOver
        } else {
            TickSignal::Continue
        },
    }
}

/// Run up to `ticks` steps, stopping early at game over
pub fn tick_n(state: &mut GameState, ticks: u32, now: Instant) -> TickResult {
    let mut total = TickResult {
        score_delta: 0,
        merges: 0,
        signal: TickSignal::Continue,
    };
    for _ in 0..ticks {
        let result = tick(state, now);
        total.score_delta += result.score_delta;
        total.merges += result.merges;
        total.signal = result.signal;
        if result.game_over_signaled() {
            break;
        }
    }
    total
}

/// Start, cancel or expire the overflow countdown
fn update_countdown(state: &mut GameState, now: Instant) {
    let ceiling = state.settings.basket.field().ceiling;
    let overflowing = state.balls.iter().any(|b| b.landed && b.top() < ceiling);

    match (overflowing, state.countdown_started) {
        (true, None) => {
            log::info!("Stack above overflow line, countdown started");
            state.countdown_started = Some(now);
        }
        (true, Some(started)) => {
            let limit = Duration::from_secs_f64(state.settings.rules.countdown_secs.max(0.0));
            if now.saturating_duration_since(started) >= limit {
                state.end_game("overflow countdown expired");
            }
        }
        (false, Some(_)) => {
            log::info!("Overflow cleared, countdown cancelled");
            state.countdown_started = None;
        }
        (false, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::{Settings, Variant};
    use crate::sim::ball::{Ball, BallHandle};
    use glam::DVec2;

    fn run_until_settled(state: &mut GameState, now: Instant) {
        for _ in 0..600 {
            tick(state, now);
            if state.phase != GamePhase::Dropping {
                break;
            }
        }
    }

    #[test]
    fn test_drop_settles_and_scores() {
        let mut state = GameState::new(Settings::default(), 7);
        let now = Instant::now();
        state.spawn_ball(400.0, 0).unwrap();
        assert_eq!(state.phase(), GamePhase::Dropping);

        let mut total = 0;
        for _ in 0..300 {
            total += tick(&mut state, now).score_delta;
        }

        assert_eq!(state.phase(), GamePhase::Settling);
        let ball = &state.balls()[0];
        assert!(ball.grounded && ball.scored);
        assert_eq!(ball.pos.y, 500.0 - 20.0);
        assert_eq!(state.score(), 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_dropping_ends_when_ball_lands() {
        let mut state = GameState::new(Settings::default(), 7);
        let now = Instant::now();
        state.spawn_ball(400.0, 0).unwrap();
        run_until_settled(&mut state, now);
        assert_eq!(state.phase(), GamePhase::Settling);
        assert!(state.balls()[0].landed);
        assert!(state.spawn_ball(200.0, 0).is_some());
    }

    #[test]
    fn test_merge_in_basket() {
        let mut state = GameState::new(Settings::default(), 7);
        let now = Instant::now();
        state.spawn_ball(400.0, 0).unwrap();
        run_until_settled(&mut state, now);
        state.spawn_ball(410.0, 0).unwrap();

        let merges = tick_n(&mut state, 200, now).merges;

        assert_eq!(merges, 1);
        assert_eq!(state.balls().len(), 1);
        assert_eq!(state.balls()[0].tier, 1);
    }

    #[test]
    fn test_out_of_bounds_rest_ends_game() {
        let mut state = GameState::new(Settings::from_preset(Variant::Inset), 3);
        let now = Instant::now();
        state.spawn_ball(40.0, 0).unwrap();

        let result = tick_n(&mut state, 600, now);

        assert!(result.game_over_signaled());
        assert_eq!(state.phase(), GamePhase::GameOver);
        // Further ticks keep reporting game over without moving anything
        let frozen = state.balls().to_vec();
        assert!(tick(&mut state, now).game_over_signaled());
        assert_eq!(state.balls(), frozen.as_slice());
    }

    fn overflowing_ball(state: &mut GameState) {
        let id = state.next_entity_id();
        let tiers = state.settings.physics.tiers.clone();
        let mut ball = Ball::new(id, DVec2::new(400.0, 40.0), 0, &tiers).unwrap();
        ball.landed = true;
        ball.vel.y = -GRAVITY;
        state.balls.push(ball);
    }

    #[test]
    fn test_countdown_expires_into_game_over() {
        let mut state = GameState::new(Settings::default(), 7);
        let start = Instant::now();
        overflowing_ball(&mut state);

        let result = tick(&mut state, start);
        assert!(!result.game_over_signaled());
        assert_eq!(state.phase(), GamePhase::CountdownToGameOver);
        assert_eq!(state.countdown_remaining(start), Some(COUNTDOWN_SECS));

        // Keep it pinned above the line
        state.balls[0].pos.y = 40.0;
        state.balls[0].vel.y = -GRAVITY;
        let later = start + Duration::from_secs_f64(COUNTDOWN_SECS + 0.1);
        let result = tick(&mut state, later);

        assert!(result.game_over_signaled());
        assert_eq!(state.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_countdown_cancels_when_stack_clears() {
        let mut state = GameState::new(Settings::default(), 7);
        let start = Instant::now();
        overflowing_ball(&mut state);

        tick(&mut state, start);
        assert!(state.countdown_started.is_some());

        state.balls.clear();
        let result = tick(&mut state, start + Duration::from_secs(1));

        assert!(!result.game_over_signaled());
        assert!(state.countdown_started.is_none());
        assert_eq!(state.phase(), GamePhase::Settling);
    }

    #[test]
    fn test_falling_ball_does_not_start_countdown() {
        let mut state = GameState::new(Settings::default(), 7);
        let now = Instant::now();
        state.spawn_ball(400.0, 4).unwrap();
        tick(&mut state, now);
        assert!(state.countdown_started.is_none());
        assert_eq!(state.phase(), GamePhase::Dropping);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = GameState::new(Settings::from_preset(Variant::Inset), 3);
        let now = Instant::now();
        state.spawn_ball(40.0, 0).unwrap();
        tick_n(&mut state, 600, now);
        assert_eq!(state.phase(), GamePhase::GameOver);

        state.restart();

        assert_eq!(state.phase(), GamePhase::Settling);
        assert!(state.balls().is_empty());
        assert!(!tick(&mut state, now).game_over_signaled());
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut state = GameState::new(Settings::default(), 99999);
            let now = Instant::now();
            for i in 0..6 {
                state.dropping = None;
                state.drop_next(200.0 + 60.0 * i as f64);
                tick_n(&mut state, 40, now);
            }
            tick_n(&mut state, 200, now);
            state
                .balls()
                .iter()
                .map(|b| (b.id, b.tier, b.pos, b.vel))
                .collect::<Vec<(BallHandle, u8, DVec2, DVec2)>>()
        };
        assert_eq!(run(), run());
    }
}
