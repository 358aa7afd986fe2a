//! Basket geometry
//!
//! Every basket lives inside a rectangular field whose left/right edges always
//! reflect balls. The basket itself decides where the floor is, which extra
//! walls exist and which part of the field counts for scoring.
//!
//! Coordinates are screen-style: x grows to the right, y grows downward, the
//! field spans `[0, width] x [0, height]`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::collision::{circle_point_collision, reflect_velocity_with_bounce};
use crate::consts::{EPSILON, SUPPORT_TOLERANCE};

/// The play field shared by every basket shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    /// Bottom edge of the board; balls falling past it are lost
    pub height: f64,
    /// Overflow line. A settled ball whose top is above it starts the countdown.
    pub ceiling: f64,
}

/// Surfaces touched while resolving one ball against the container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contact {
    /// Touched a floor (eligible for rest detection)
    pub floor: bool,
    /// Touched a side wall, basket wall or rim cap
    pub wall: bool,
}

/// Capability set of a basket shape
pub trait Container {
    fn field(&self) -> &Field;

    /// Height of the floor under `x`, or `None` if nothing catches a ball there
    fn floor_at(&self, x: f64) -> Option<f64>;

    /// Is a ball at `pos` with `radius` inside the scoring region?
    fn contains_score(&self, pos: DVec2, radius: f64) -> bool;

    /// dy/dx of the floor under `x`. Positive means the floor drops toward +x.
    fn floor_slope(&self, _x: f64) -> f64 {
        0.0
    }

    /// Basket-specific walls. Returns true on contact.
    fn resolve_walls(&self, _ball: &mut Ball, _bounce: f64) -> bool {
        false
    }

    /// Resolve floor, then basket walls, then the field's side walls
    fn resolve_collision(&self, ball: &mut Ball, bounce: f64) -> Contact {
        let floor = resolve_floor(self, ball, bounce);
        let basket_wall = self.resolve_walls(ball, bounce);
        let side_wall = resolve_side_walls(self.field(), ball, bounce);
        Contact {
            floor,
            wall: basket_wall || side_wall,
        }
    }

    /// Does the floor still hold a grounded ball up?
    fn supports(&self, ball: &Ball) -> bool {
        match self.floor_at(ball.pos.x) {
            Some(floor) => ball.bottom() >= floor - SUPPORT_TOLERANCE,
            None => false,
        }
    }
}

/// Clamp a ball onto the floor under it and reflect its vertical velocity
fn resolve_floor<C: Container + ?Sized>(container: &C, ball: &mut Ball, bounce: f64) -> bool {
    let Some(floor) = container.floor_at(ball.pos.x) else {
        return false;
    };
    if ball.bottom() <= floor {
        return false;
    }
    ball.pos.y = floor - ball.radius;
    if ball.vel.y > 0.0 {
        ball.vel.y *= -bounce;
    }
    true
}

/// Reflect off the field's left/right edges
///
/// Only velocity heading into the wall is reflected, so resolving the same
/// ball twice in one tick is harmless.
pub fn resolve_side_walls(field: &Field, ball: &mut Ball, bounce: f64) -> bool {
    if ball.pos.x - ball.radius < 0.0 {
        ball.pos.x = ball.radius;
        if ball.vel.x < 0.0 {
            ball.vel.x *= -bounce;
        }
        true
    } else if ball.pos.x + ball.radius > field.width {
        ball.pos.x = field.width - ball.radius;
        if ball.vel.x > 0.0 {
            ball.vel.x *= -bounce;
        }
        true
    } else {
        false
    }
}

/// A single horizontal floor spanning the whole field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatBasket {
    pub field: Field,
    pub floor_y: f64,
}

impl Container for FlatBasket {
    fn field(&self) -> &Field {
        &self.field
    }

    fn floor_at(&self, _x: f64) -> Option<f64> {
        Some(self.floor_y)
    }

    fn contains_score(&self, pos: DVec2, radius: f64) -> bool {
        pos.x - radius >= -EPSILON
            && pos.x + radius <= self.field.width + EPSILON
            && pos.y + radius <= self.floor_y + EPSILON
    }
}

/// A rectangular basket that may not span the full field width
///
/// Its walls run from `top` down to `bottom`. Beside the basket a ball either
/// lands on the ledge (and is out of bounds) or, with no ledge, falls off the
/// board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsetBasket {
    pub field: Field,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    #[serde(default)]
    pub ledge_y: Option<f64>,
}

impl InsetBasket {
    #[inline]
    fn spans(&self, x: f64) -> bool {
        x >= self.left && x <= self.right
    }

    /// Push a ball off one vertical wall at `wall_x`
    fn resolve_wall(&self, ball: &mut Ball, wall_x: f64, bounce: f64) -> bool {
        if ball.top() > self.bottom {
            return false;
        }
        if ball.pos.y <= self.top {
            // Above the rim: only the cap can be touched
            let cap = DVec2::new(wall_x, self.top);
            let result = circle_point_collision(ball.pos, ball.radius, cap);
            if !result.hit {
                return false;
            }
            ball.pos += result.normal * result.penetration;
            ball.vel = reflect_velocity_with_bounce(ball.vel, result.normal, bounce);
            return true;
        }

        if (ball.pos.x - wall_x).abs() >= ball.radius {
            return false;
        }
        if ball.pos.x >= wall_x {
            ball.pos.x = wall_x + ball.radius;
            if ball.vel.x < 0.0 {
                ball.vel.x *= -bounce;
            }
        } else {
            ball.pos.x = wall_x - ball.radius;
            if ball.vel.x > 0.0 {
                ball.vel.x *= -bounce;
            }
        }
        true
    }
}

impl Container for InsetBasket {
    fn field(&self) -> &Field {
        &self.field
    }

    fn floor_at(&self, x: f64) -> Option<f64> {
        if self.spans(x) { Some(self.bottom) } else { self.ledge_y }
    }

    fn contains_score(&self, pos: DVec2, radius: f64) -> bool {
        pos.x - radius >= self.left - EPSILON
            && pos.x + radius <= self.right + EPSILON
            && pos.y + radius <= self.bottom + EPSILON
    }

    fn resolve_walls(&self, ball: &mut Ball, bounce: f64) -> bool {
        let left = self.resolve_wall(ball, self.left, bounce);
        let right = self.resolve_wall(ball, self.right, bounce);
        left || right
    }
}

/// A bowl whose floor follows `y = -a(x - h)² + k`
///
/// With y growing downward and `a > 0` the curve is lowest on screen at
/// `x = h` and rises toward the field edges. The scoring region is the part
/// of the bowl below the rim line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParabolicBasket {
    pub field: Field,
    pub a: f64,
    pub h: f64,
    pub k: f64,
    pub rim_y: f64,
}

impl ParabolicBasket {
    #[inline]
    pub fn curve(&self, x: f64) -> f64 {
        -self.a * (x - self.h).powi(2) + self.k
    }

    /// Half-width of the bowl at the rim line
    pub fn rim_half_width(&self) -> f64 {
        if self.a <= 0.0 || self.k <= self.rim_y {
            return 0.0;
        }
        ((self.k - self.rim_y) / self.a).sqrt()
    }
}

impl Container for ParabolicBasket {
    fn field(&self) -> &Field {
        &self.field
    }

    fn floor_at(&self, x: f64) -> Option<f64> {
        Some(self.curve(x))
    }

    fn contains_score(&self, pos: DVec2, _radius: f64) -> bool {
        (pos.x - self.h).abs() <= self.rim_half_width() + EPSILON
    }

    fn floor_slope(&self, x: f64) -> f64 {
        -2.0 * self.a * (x - self.h)
    }
}

/// Serializable choice of basket shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Basket {
    Flat(FlatBasket),
    Inset(InsetBasket),
    Parabolic(ParabolicBasket),
}

impl Basket {
    fn inner(&self) -> &dyn Container {
        match self {
            Basket::Flat(b) => b,
            Basket::Inset(b) => b,
            Basket::Parabolic(b) => b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Basket::Flat(_) => "flat",
            Basket::Inset(_) => "inset",
            Basket::Parabolic(_) => "parabolic",
        }
    }
}

impl Container for Basket {
    fn field(&self) -> &Field {
        self.inner().field()
    }

    fn floor_at(&self, x: f64) -> Option<f64> {
        self.inner().floor_at(x)
    }

    fn contains_score(&self, pos: DVec2, radius: f64) -> bool {
        self.inner().contains_score(pos, radius)
    }

    fn floor_slope(&self, x: f64) -> f64 {
        self.inner().floor_slope(x)
    }

    fn resolve_walls(&self, ball: &mut Ball, bounce: f64) -> bool {
        self.inner().resolve_walls(ball, bounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ball::{BallHandle, TierTable};

    fn field() -> Field {
        Field {
            width: 800.0,
            height: 800.0,
            ceiling: 330.0,
        }
    }

    fn ball_at(x: f64, y: f64) -> Ball {
        Ball::new(BallHandle(1), DVec2::new(x, y), 0, &TierTable::default()).unwrap()
    }

    fn inset() -> InsetBasket {
        InsetBasket {
            field: field(),
            left: 150.0,
            right: 650.0,
            top: 380.0,
            bottom: 780.0,
            ledge_y: Some(800.0),
        }
    }

    #[test]
    fn test_flat_floor_clamps_and_reflects() {
        let basket = FlatBasket {
            field: field(),
            floor_y: 500.0,
        };
        let mut ball = ball_at(400.0, 490.0);
        ball.vel = DVec2::new(0.0, 10.0);
        let contact = basket.resolve_collision(&mut ball, 0.4);
        assert!(contact.floor);
        assert!(!contact.wall);
        assert_eq!(ball.pos.y, 480.0);
        assert!((ball.vel.y + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_side_walls_always_active() {
        let basket = FlatBasket {
            field: field(),
            floor_y: 500.0,
        };
        let mut ball = ball_at(5.0, 100.0);
        ball.vel = DVec2::new(-10.0, 0.0);
        let contact = basket.resolve_collision(&mut ball, 0.5);
        assert!(contact.wall);
        assert_eq!(ball.pos.x, 20.0);
        assert!((ball.vel.x - 5.0).abs() < 1e-12);

        let mut ball = ball_at(795.0, 100.0);
        ball.vel = DVec2::new(10.0, 0.0);
        basket.resolve_collision(&mut ball, 0.5);
        assert_eq!(ball.pos.x, 780.0);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_inset_floor_only_inside_span() {
        let basket = inset();
        assert_eq!(basket.floor_at(400.0), Some(780.0));
        assert_eq!(basket.floor_at(100.0), Some(800.0));
        let open = InsetBasket {
            ledge_y: None,
            ..basket
        };
        assert_eq!(open.floor_at(100.0), None);
    }

    #[test]
    fn test_inset_wall_keeps_ball_inside() {
        let basket = inset();
        let mut ball = ball_at(160.0, 600.0);
        ball.vel = DVec2::new(-8.0, 0.0);
        let contact = basket.resolve_collision(&mut ball, 0.5);
        assert!(contact.wall);
        assert_eq!(ball.pos.x, 170.0);
        assert!((ball.vel.x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_inset_wall_keeps_ball_outside() {
        let basket = inset();
        let mut ball = ball_at(140.0, 600.0);
        ball.vel = DVec2::new(8.0, 0.0);
        basket.resolve_collision(&mut ball, 0.5);
        assert_eq!(ball.pos.x, 130.0);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_inset_rim_cap_deflects() {
        let basket = inset();
        // Falling straight onto the top of the left wall, slightly inside
        let mut ball = ball_at(155.0, 365.0);
        ball.vel = DVec2::new(0.0, 6.0);
        let contact = basket.resolve_collision(&mut ball, 0.5);
        assert!(contact.wall);
        assert!(ball.pos.distance(DVec2::new(150.0, 380.0)) >= ball.radius - 1e-9);
        // Deflected to the inside of the basket
        assert!(ball.vel.x > 0.0);
    }

    #[test]
    fn test_inset_scoring_region() {
        let basket = inset();
        assert!(basket.contains_score(DVec2::new(400.0, 760.0), 20.0));
        assert!(basket.contains_score(DVec2::new(170.0, 760.0), 20.0));
        assert!(!basket.contains_score(DVec2::new(100.0, 780.0), 20.0));
    }

    #[test]
    fn test_parabola_floor_follows_curve() {
        let basket = ParabolicBasket {
            field: Field {
                width: 600.0,
                height: 800.0,
                ceiling: 300.0,
            },
            a: 0.004,
            h: 300.0,
            k: 760.0,
            rim_y: 460.0,
        };
        assert_eq!(basket.curve(300.0), 760.0);
        assert!((basket.curve(400.0) - 720.0).abs() < 1e-9);

        let mut ball = ball_at(400.0, 710.0);
        ball.vel = DVec2::new(0.0, 5.0);
        let contact = basket.resolve_collision(&mut ball, 0.5);
        assert!(contact.floor);
        assert!((ball.bottom() - 720.0).abs() < 1e-9);
        assert!(ball.vel.y < 0.0);

        let half = basket.rim_half_width();
        assert!((half - (300.0f64 / 0.004).sqrt()).abs() < 1e-9);
        assert!(basket.contains_score(DVec2::new(300.0, 700.0), 20.0));
        assert!(!basket.contains_score(DVec2::new(300.0 + half + 1.0, 500.0), 20.0));
    }

    #[test]
    fn test_parabola_slope_points_downhill_toward_vertex() {
        let basket = Basket::Parabolic(ParabolicBasket {
            field: field(),
            a: 0.004,
            h: 300.0,
            k: 760.0,
            rim_y: 460.0,
        });
        assert_eq!(basket.floor_slope(300.0), 0.0);
        // Right of the vertex the floor rises toward +x, left of it toward -x
        assert!((basket.floor_slope(400.0) + 0.8).abs() < 1e-12);
        assert!((basket.floor_slope(200.0) - 0.8).abs() < 1e-12);
        assert_eq!(Basket::Inset(inset()).floor_slope(200.0), 0.0);
    }

    #[test]
    fn test_side_wall_twice_does_not_flip_back() {
        let mut ball = ball_at(-5.0, 100.0);
        ball.vel = DVec2::new(-10.0, 0.0);
        assert!(resolve_side_walls(&field(), &mut ball, 0.5));
        // Clamped and already moving away: a second pass changes nothing
        resolve_side_walls(&field(), &mut ball, 0.5);
        assert_eq!(ball.pos.x, 20.0);
        assert!((ball.vel.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_supports() {
        let basket = FlatBasket {
            field: field(),
            floor_y: 500.0,
        };
        assert!(basket.supports(&ball_at(400.0, 480.0)));
        assert!(!basket.supports(&ball_at(400.0, 470.0)));
    }

    #[test]
    fn test_basket_enum_delegates() {
        let basket = Basket::Inset(inset());
        assert_eq!(basket.name(), "inset");
        assert_eq!(basket.floor_at(400.0), Some(780.0));
        let mut ball = ball_at(160.0, 600.0);
        ball.vel = DVec2::new(-8.0, 0.0);
        assert!(basket.resolve_collision(&mut ball, 0.5).wall);
    }
}
