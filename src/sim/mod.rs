//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies
//!
//! The wall clock is consulted only by the overflow countdown, through the
//! `Instant` handed to [`tick`].

pub mod ball;
pub mod collision;
pub mod container;
pub mod physics;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use ball::{Ball, BallHandle, Tier, TierTable};
pub use collision::{CollisionResult, PairOutcome, circle_circle_collision, circle_point_collision};
pub use container::{Basket, Contact, Container, Field, FlatBasket, InsetBasket, ParabolicBasket};
pub use physics::{PhysicsConfig, StepReport, advance, step};
pub use state::{GamePhase, GameState, PendingDrop};
pub use tick::{TickResult, TickSignal, tick, tick_n};
pub use trajectory::{launch_velocity, predict_trajectory};
