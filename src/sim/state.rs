//! Game state and the spawn/aim surface used by the presentation layer
//!
//! The state owns the ball collection. The physics step borrows it mutably
//! once per tick and never keeps it.

use std::time::Instant;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallHandle};
use super::container::Container;
use super::trajectory::{launch_velocity, predict_trajectory};
use crate::clamp_drop_x;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Aim gesture in progress, no committed ball
    Aiming,
    /// A committed ball is falling and has not landed yet
    Dropping,
    /// Balls tick normally, new drops accepted
    Settling,
    /// The stack is above the overflow line; game over unless it clears
    CountdownToGameOver,
    /// Run ended. Only a restart leaves this phase.
    GameOver,
}

/// Ball waiting to be released by an aim gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDrop {
    /// Where the gesture started; the ball drops from this x
    pub start: DVec2,
    pub tier: u8,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    /// Seed for the spawn queue
    pub seed: u64,
    rng: Pcg32,
    pub score: u64,
    /// Active balls in spawn order
    pub balls: Vec<Ball>,
    pub phase: GamePhase,
    /// Tier the next drop will use
    pub next_tier: u8,
    /// Aim gesture in progress
    pub pending: Option<PendingDrop>,
    /// Most recent drop that has not landed yet
    pub dropping: Option<BallHandle>,
    /// Monotonic timestamp of the first overflow detection
    pub countdown_started: Option<Instant>,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given settings and spawn-queue seed
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut state = Self {
            settings,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            score: 0,
            balls: Vec::new(),
            phase: GamePhase::Settling,
            next_tier: 0,
            pending: None,
            dropping: None,
            countdown_started: None,
            time_ticks: 0,
            next_id: 1,
        };
        state.next_tier = state.roll_tier();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> BallHandle {
        let id = self.next_id;
        self.next_id += 1;
        BallHandle(id)
    }

    fn roll_tier(&mut self) -> u8 {
        let max = self
            .settings
            .rules
            .spawn_tier_max
            .min(self.settings.physics.tiers.max_tier());
        self.rng.random_range(0..=max)
    }

    /// Is a new ball allowed right now?
    fn accepts_drop(&self) -> bool {
        if self.phase == GamePhase::GameOver {
            return false;
        }
        !(self.settings.rules.single_drop && self.dropping.is_some())
    }

    /// Insert a new ball of `tier` above the field at `x`
    ///
    /// Returns `None` without changing anything if the game is over, the tier
    /// is unknown, `x` is not finite, or single-drop mode already has a ball
    /// in flight or an aim in progress.
    pub fn spawn_ball(&mut self, x: f64, tier: u8) -> Option<BallHandle> {
        if self.settings.rules.single_drop && self.pending.is_some() {
            log::trace!("Spawn rejected: aim in progress");
            return None;
        }
        self.spawn_with_velocity(x, tier, DVec2::ZERO)
    }

    fn spawn_with_velocity(&mut self, x: f64, tier: u8, velocity: DVec2) -> Option<BallHandle> {
        if !self.accepts_drop() || !x.is_finite() {
            log::trace!("Spawn rejected in phase {:?}", self.phase);
            return None;
        }
        let radius = self.settings.physics.tiers.radius(tier)?;
        let width = self.settings.basket.field().width;
        let pos = DVec2::new(clamp_drop_x(x, radius, width), -radius);

        let id = self.next_entity_id();
        let mut ball = Ball::new(id, pos, tier, &self.settings.physics.tiers)?;
        ball.vel = velocity;
        self.balls.push(ball);
        self.dropping = Some(id);
        self.refresh_phase();

        log::debug!("Spawned {:?} tier {} at x={:.1}", id, tier, pos.x);
        Some(id)
    }

    /// Drop the queued tier at `x` and roll the next one
    pub fn drop_next(&mut self, x: f64) -> Option<BallHandle> {
        let handle = self.spawn_ball(x, self.next_tier)?;
        self.next_tier = self.roll_tier();
        Some(handle)
    }

    /// Start an aim gesture at `start`. Returns false if it was refused.
    pub fn begin_aim(&mut self, start: DVec2) -> bool {
        if self.pending.is_some() || !self.accepts_drop() || !start.is_finite() {
            return false;
        }
        self.pending = Some(PendingDrop {
            start,
            tier: self.next_tier,
        });
        self.refresh_phase();
        true
    }

    /// Abort the aim gesture without dropping anything
    pub fn cancel_aim(&mut self) {
        if self.pending.take().is_some() {
            self.refresh_phase();
        }
    }

    /// Finish the aim gesture at `end` and release the pending ball
    pub fn release_aim(&mut self, end: DVec2) -> Option<BallHandle> {
        let pending = self.pending.take()?;
        if !end.is_finite() {
            self.refresh_phase();
            return None;
        }
        let velocity = launch_velocity(end - pending.start, self.settings.rules.aim_velocity_scale);
        let handle = self.spawn_with_velocity(pending.start.x, pending.tier, velocity);
        if handle.is_some() {
            self.next_tier = self.roll_tier();
        }
        self.refresh_phase();
        handle
    }

    /// Preview the path of the queued ball dropped from `start` with drag `release`
    ///
    /// Read-only: the live balls are neither consulted nor modified.
    pub fn preview_trajectory(&self, start: DVec2, release: DVec2) -> Vec<DVec2> {
        let tier = self.pending.map(|p| p.tier).unwrap_or(self.next_tier);
        let radius = self.settings.physics.tiers.radius(tier).unwrap_or_default();
        let width = self.settings.basket.field().width;
        let origin = DVec2::new(clamp_drop_x(start.x, radius, width), -radius);
        let velocity = launch_velocity(release, self.settings.rules.aim_velocity_scale);
        predict_trajectory(
            &self.settings.basket,
            &self.settings.physics,
            origin,
            velocity,
            radius,
            self.settings.rules.preview_steps,
        )
    }

    /// Preview for the aim gesture in progress, dragged to `current`
    pub fn aim_preview(&self, current: DVec2) -> Option<Vec<DVec2>> {
        let pending = self.pending?;
        Some(self.preview_trajectory(pending.start, current - pending.start))
    }

    /// Clear balls, score and timers and start over
    pub fn reset(&mut self) {
        self.balls.clear();
        self.score = 0;
        self.pending = None;
        self.dropping = None;
        self.countdown_started = None;
        self.time_ticks = 0;
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.next_tier = self.roll_tier();
        self.phase = GamePhase::Settling;
        log::info!("Game reset (seed {})", self.seed);
    }

    /// Restart after game over
    pub fn restart(&mut self) {
        self.reset();
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn next_tier(&self) -> u8 {
        self.next_tier
    }

    /// Seconds left before the countdown ends the game
    pub fn countdown_remaining(&self, now: Instant) -> Option<f64> {
        let started = self.countdown_started?;
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        Some((self.settings.rules.countdown_secs - elapsed).max(0.0))
    }

    /// Enter the terminal phase
    pub(crate) fn end_game(&mut self, reason: &str) {
        if self.phase != GamePhase::GameOver {
            log::info!("Game over ({}), final score {}", reason, self.score);
        }
        self.phase = GamePhase::GameOver;
        self.pending = None;
        self.countdown_started = None;
    }

    /// Recompute the phase from the current flags
    pub(crate) fn refresh_phase(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = if self.countdown_started.is_some() {
            GamePhase::CountdownToGameOver
        } else if self.pending.is_some() {
            GamePhase::Aiming
        } else if self.dropping.is_some() {
            GamePhase::Dropping
        } else {
            GamePhase::Settling
        };
    }
}
