//! Collision detection and response for circles
//!
//! Ball/ball contacts drive both merges and bounces. Ball/point contacts cover
//! the rim caps at the top of basket walls.

use glam::DVec2;

use super::ball::{Ball, TierTable};
use crate::distance_or_none;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit contact normal. For ball pairs it points from the first ball
    /// toward the second; for point contacts it points toward the ball center.
    pub normal: DVec2,
    /// Penetration depth (for position correction)
    pub penetration: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: DVec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// What happened when two overlapping balls were resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// `a` absorbed `b` and moved up a tier
    Merged,
    /// The pair was pushed apart and exchanged momentum
    Bounced,
}

/// Check overlap between two circles
///
/// Coincident centers produce a hit with a fixed upward normal so callers
/// never divide by zero.
pub fn circle_circle_collision(pos_a: DVec2, radius_a: f64, pos_b: DVec2, radius_b: f64) -> CollisionResult {
    let combined = radius_a + radius_b;
    if pos_a.distance_squared(pos_b) >= combined * combined {
        return CollisionResult::miss();
    }

    match distance_or_none(pos_a, pos_b) {
        Some(dist) => CollisionResult {
            hit: true,
            normal: (pos_b - pos_a) / dist,
            penetration: combined - dist,
        },
        None => CollisionResult {
            hit: true,
            normal: DVec2::NEG_Y,
            penetration: combined,
        },
    }
}

/// Check collision between a ball and a fixed point (e.g. a wall end)
pub fn circle_point_collision(ball_pos: DVec2, ball_radius: f64, point: DVec2) -> CollisionResult {
    let offset = ball_pos - point;
    if offset.length_squared() >= ball_radius * ball_radius {
        return CollisionResult::miss();
    }

    match distance_or_none(ball_pos, point) {
        Some(dist) => CollisionResult {
            hit: true,
            normal: offset / dist,
            penetration: ball_radius - dist,
        },
        None => CollisionResult {
            hit: true,
            normal: DVec2::NEG_Y,
            penetration: ball_radius,
        },
    }
}

/// Reflect velocity off a surface with a coefficient of restitution
///
/// v' = v - (1 + e)(v·n)n: the normal component is reversed and scaled by
/// `bounce`, the tangential component is kept.
///
/// Velocities already leaving the surface are returned unchanged.
#[inline]
pub fn reflect_velocity_with_bounce(velocity: DVec2, normal: DVec2, bounce: f64) -> DVec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + bounce) * vn * normal
}

/// Push two overlapping balls apart by half the penetration each
pub fn separate(a: &mut Ball, b: &mut Ball, contact: &CollisionResult) {
    let half = contact.normal * (contact.penetration * 0.5);
    a.pos -= half;
    b.pos += half;
}

/// Exchange momentum along the contact normal, using radius as mass
///
/// Only closing pairs receive an impulse; separating pairs keep their
/// velocities so positional correction can finish the job.
pub fn exchange_impulse(a: &mut Ball, b: &mut Ball, normal: DVec2, bounce: f64) {
    let closing = (a.vel - b.vel).dot(normal);
    if closing <= 0.0 {
        return;
    }

    let total_mass = a.radius + b.radius;
    let p = (1.0 + bounce) * closing / total_mass;
    a.vel -= normal * (p * b.radius);
    b.vel += normal * (p * a.radius);
}

/// Merge `absorbed` into `survivor`
///
/// The survivor moves up a tier and is popped away from the absorbed ball's
/// center. Returns false if the survivor is already at the top tier, in which
/// case neither ball is touched.
pub fn merge(survivor: &mut Ball, absorbed: &mut Ball, normal: DVec2, tiers: &TierTable, impulse: f64) -> bool {
    if !survivor.promote(tiers) {
        return false;
    }
    absorbed.active = false;
    survivor.dislodge();
    survivor.landed = true;
    survivor.vel = -normal * impulse;
    true
}

/// Resolve a single overlapping pair
///
/// Equal tiers below the top merge into `a`; anything else bounces.
pub fn resolve_pair(
    a: &mut Ball,
    b: &mut Ball,
    contact: &CollisionResult,
    tiers: &TierTable,
    bounce: f64,
    merge_impulse: f64,
) -> PairOutcome {
    if a.can_merge_with(b, tiers) && merge(a, b, contact.normal, tiers, merge_impulse) {
        return PairOutcome::Merged;
    }

    separate(a, b, contact);
    exchange_impulse(a, b, contact.normal, bounce);
    a.dislodge();
    b.dislodge();
    a.landed = true;
    b.landed = true;
    PairOutcome::Bounced
}
