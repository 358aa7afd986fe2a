//! Merge Drop - A falling-ball merge arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, baskets, merges, game state)
//! - `settings`: Data-driven game variants and physical constants
//!
//! Rendering, input polling and menus belong to the presentation layer, which
//! calls [`sim::tick`] once per frame and reads back the ball list.

pub mod settings;
pub mod sim;

pub use settings::{Rules, Settings, SettingsError, Variant};

use glam::DVec2;

/// Game configuration constants
///
/// All velocities and accelerations are expressed per tick.
pub mod consts {
    /// Fixed simulation rate
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep (seconds of wall clock per tick)
    pub const SIM_DT: f64 = 1.0 / TICK_RATE as f64;

    /// Classic field dimensions
    pub const FIELD_WIDTH: f64 = 800.0;
    pub const FIELD_HEIGHT: f64 = 600.0;
    /// Height of the basket slab under the classic floor
    pub const BASKET_HEIGHT: f64 = 100.0;

    /// Downward acceleration
    pub const GRAVITY: f64 = 0.9;
    /// Coefficient of restitution for floors, walls and ball pairs
    pub const BOUNCE_FACTOR: f64 = 0.4;
    /// Horizontal velocity multiplier applied every tick
    pub const FRICTION: f64 = 0.99;
    /// Vertical speed below which a floor contact becomes a rest
    pub const REST_THRESHOLD: f64 = 1.0;
    /// Speed given to the survivor of a merge
    pub const MERGE_IMPULSE: f64 = 5.0;

    /// Classic tier radii (ascending)
    pub const BALL_SIZES: [f64; 5] = [20.0, 30.0, 40.0, 50.0, 60.0];
    /// Classic tier colors (RGB)
    pub const BALL_COLORS: [[u8; 3]; 5] = [
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [255, 255, 0],
        [255, 0, 255],
    ];

    /// Seconds a stack may stay above the overflow line
    pub const COUNTDOWN_SECS: f64 = 3.0;
    /// Drag distance to horizontal launch speed
    pub const AIM_VELOCITY_SCALE: f64 = 0.1;
    /// Steps simulated for the aim preview
    pub const PREVIEW_STEPS: usize = 50;

    /// Tolerance used by containment tests and degenerate contacts
    pub const EPSILON: f64 = 1e-6;
    /// Gap under a grounded ball before it counts as unsupported
    pub const SUPPORT_TOLERANCE: f64 = 1e-3;
    /// Cap on positional passes over overlapping ball pairs per tick
    pub const RELAX_ITERATIONS: u32 = 16;
    /// Overlap small enough to stop relaxing
    pub const RELAX_TOLERANCE: f64 = 1e-3;
}

/// Distance between two points, with a flag for coincident centers
#[inline]
pub fn distance_or_none(a: DVec2, b: DVec2) -> Option<f64> {
    let d = a.distance(b);
    if d <= consts::EPSILON { None } else { Some(d) }
}

/// Clamp a drop position so a ball of `radius` fits between `0` and `width`
#[inline]
pub fn clamp_drop_x(x: f64, radius: f64, width: f64) -> f64 {
    if width <= 2.0 * radius {
        return width / 2.0;
    }
    x.clamp(radius, width - radius)
}
