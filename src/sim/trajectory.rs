//! Aim-assist trajectory preview
//!
//! Simulates a single hypothetical ball with the live engine's integration
//! and boundary rules. Real balls are ignored and never touched.

use glam::DVec2;

use super::ball::Ball;
use super::container::Container;
use super::physics::{PhysicsConfig, advance};

/// Convert a drag vector (release point minus press point) into a launch velocity
///
/// Only the horizontal component of the drag is used; drops always start with
/// zero vertical speed.
#[inline]
pub fn launch_velocity(release: DVec2, scale: f64) -> DVec2 {
    DVec2::new(release.x * scale, 0.0)
}

/// Predict the path of a ball of `radius` launched from `start` with `velocity`
///
/// Returns `steps + 1` points, starting with `start`.
pub fn predict_trajectory<C: Container + ?Sized>(
    container: &C,
    physics: &PhysicsConfig,
    start: DVec2,
    velocity: DVec2,
    radius: f64,
    steps: usize,
) -> Vec<DVec2> {
    let mut ghost = Ball::ghost(start, velocity, radius);
    let mut points = Vec::with_capacity(steps + 1);
    points.push(ghost.pos);

    for _ in 0..steps {
        advance(&mut ghost, container, physics);
        points.push(ghost.pos);
    }

    points
}
