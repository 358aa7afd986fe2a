//! Per-tick ball physics
//!
//! One step runs, in order:
//! 1. integration and boundary resolution for each active ball
//! 2. rest detection, scoring and termination checks
//! 3. pairwise merge/bounce resolution in collection order
//! 4. positional relaxation of bounced pairs, re-confining moved balls to the
//!    container after every pass
//! 5. removal of balls absorbed by merges
//!
//! The trajectory preview reuses [`advance`] so both paths share constants
//! and boundary rules.

use serde::{Deserialize, Serialize};

use super::ball::{Ball, TierTable};
use super::collision::{PairOutcome, circle_circle_collision, resolve_pair, separate};
use super::container::{Contact, Container};
use crate::consts::*;

/// Physical constants shared by the live engine and the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Added to vertical velocity each tick while airborne
    pub gravity: f64,
    /// Horizontal velocity multiplier per tick, in (0, 1]
    pub friction: f64,
    /// Coefficient of restitution, in (0, 1)
    pub bounce: f64,
    /// Vertical speed under which a floor contact becomes a rest
    pub rest_threshold: f64,
    /// Speed of the survivor right after a merge
    pub merge_impulse: f64,
    pub tiers: TierTable,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: FRICTION,
            bounce: BOUNCE_FACTOR,
            rest_threshold: REST_THRESHOLD,
            merge_impulse: MERGE_IMPULSE,
            tiers: TierTable::default(),
        }
    }
}

/// Summary of one physics step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Points earned by balls coming to rest this step
    pub score_delta: u64,
    /// Number of merges performed
    pub merges: u32,
    /// Number of bouncing pairs resolved
    pub bounces: u32,
    /// A ball rests outside the scoring region or fell off the board
    pub game_over: bool,
}

/// Move one ball by a single tick and resolve it against the container
///
/// Gravity only acts on airborne balls; horizontal motion always integrates
/// and decays by the friction factor. A floor contact whose rebound is slower
/// than the rest threshold grounds the ball. Grounded balls on a sloped floor
/// pick up the downhill share of gravity and slide until the floor drops away.
pub fn advance<C: Container + ?Sized>(ball: &mut Ball, container: &C, physics: &PhysicsConfig) -> Contact {
    if ball.grounded && !container.supports(ball) {
        ball.grounded = false;
    }
    if ball.grounded {
        let slope = container.floor_slope(ball.pos.x);
        ball.vel.x += physics.gravity * slope / (1.0 + slope * slope);
    }

    if !ball.grounded {
        ball.vel.y += physics.gravity;
        ball.pos.y += ball.vel.y;
    }
    ball.pos.x += ball.vel.x;
    ball.vel.x *= physics.friction;

    let contact = container.resolve_collision(ball, physics.bounce);
    if contact.floor {
        ball.landed = true;
        ball.vel.x *= physics.friction;
        if ball.vel.y.abs() < physics.rest_threshold {
            ball.vel.y = 0.0;
            ball.grounded = true;
        }
    }
    contact
}

/// Advance every active ball by one fixed step
///
/// `balls` is mutated in place; absorbed balls are removed before returning.
pub fn step<C: Container + ?Sized>(balls: &mut Vec<Ball>, container: &C, physics: &PhysicsConfig) -> StepReport {
    let mut report = StepReport::default();
    let field = *container.field();

    for ball in balls.iter_mut().filter(|b| b.active) {
        advance(ball, container, physics);

        let in_region = container.contains_score(ball.pos, ball.radius);
        if ball.grounded && in_region && !ball.scored {
            ball.scored = true;
            report.score_delta += ball.tier as u64 + 1;
        }

        if ball.grounded && !in_region {
            log::debug!("Ball {:?} came to rest out of bounds at {:?}", ball.id, ball.pos);
            report.game_over = true;
        }
        if ball.top() > field.height {
            log::debug!("Ball {:?} fell off the board", ball.id);
            report.game_over = true;
        }
    }

    let (merges, bounces) = resolve_pairs(balls, container, physics);
    report.merges = merges;
    report.bounces = bounces;

    balls.retain(|b| b.active);
    report
}

/// Resolve every overlapping pair in collection order
///
/// For a pair `(i, j)` with `i < j`, ball `i` is the survivor of a merge.
/// Merges and impulses happen once, in the first pass. Later passes only push
/// still-overlapping pairs apart until the worst overlap is within
/// `RELAX_TOLERANCE` or `RELAX_ITERATIONS` runs out. Every ball moved here is
/// resolved against the container again, so side walls hold after the call.
/// Returns `(merges, bounces)`.
pub fn resolve_pairs<C: Container + ?Sized>(balls: &mut [Ball], container: &C, physics: &PhysicsConfig) -> (u32, u32) {
    let mut merges = 0;
    let mut bounces = 0;
    let mut touched = vec![false; balls.len()];

    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            let (a, b) = pair_mut(balls, i, j);
            if !a.active || !b.active {
                continue;
            }

            let contact = circle_circle_collision(a.pos, a.radius, b.pos, b.radius);
            if !contact.hit {
                continue;
            }

            match resolve_pair(a, b, &contact, &physics.tiers, physics.bounce, physics.merge_impulse) {
                PairOutcome::Merged => {
                    log::debug!("Ball {:?} absorbed {:?} -> tier {}", a.id, b.id, a.tier);
                    merges += 1;
                }
                PairOutcome::Bounced => bounces += 1,
            }
            touched[i] = true;
            touched[j] = true;
        }
    }

    confine(balls, &touched, container, physics.bounce);
    for _ in 0..RELAX_ITERATIONS {
        let worst = relax_overlaps(balls, &mut touched, &physics.tiers);
        confine(balls, &touched, container, physics.bounce);
        if worst <= RELAX_TOLERANCE {
            break;
        }
    }

    (merges, bounces)
}

/// One positional pass over overlapping pairs that cannot merge
///
/// Returns the deepest penetration seen before correction.
fn relax_overlaps(balls: &mut [Ball], touched: &mut [bool], tiers: &TierTable) -> f64 {
    let mut worst = 0.0f64;
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            let (a, b) = pair_mut(balls, i, j);
            // Same-tier pairs are left touching so they merge next tick
            if !a.active || !b.active || a.can_merge_with(b, tiers) {
                continue;
            }
            let contact = circle_circle_collision(a.pos, a.radius, b.pos, b.radius);
            if !contact.hit {
                continue;
            }
            worst = worst.max(contact.penetration);
            separate(a, b, &contact);
            touched[i] = true;
            touched[j] = true;
        }
    }
    worst
}

/// Resolve balls moved by pair resolution against the container again
fn confine<C: Container + ?Sized>(balls: &mut [Ball], touched: &[bool], container: &C, bounce: f64) {
    for (ball, _) in balls.iter_mut().zip(touched).filter(|(b, t)| **t && b.active) {
        container.resolve_collision(ball, bounce);
    }
}

#[inline]
fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    let (head, tail) = balls.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
