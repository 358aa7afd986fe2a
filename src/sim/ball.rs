//! Ball entities and the tier table
//!
//! A ball's radius and color are derived from its size tier. The radius is
//! cached on the ball and refreshed whenever the tier changes.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Stable identifier for a ball, returned by spawn requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallHandle(pub u32);

/// One row of the tier table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub radius: f64,
    pub color: [u8; 3],
}

/// Ascending radius/color table indexed by size tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl Default for TierTable {
    fn default() -> Self {
        Self::from_parts(&BALL_SIZES, &BALL_COLORS)
    }
}

impl TierTable {
    /// Build from parallel radius and color slices (extra entries are dropped)
    pub fn from_parts(radii: &[f64], colors: &[[u8; 3]]) -> Self {
        let tiers = radii
            .iter()
            .zip(colors)
            .map(|(&radius, &color)| Tier { radius, color })
            .collect();
        Self { tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Highest valid tier index
    pub fn max_tier(&self) -> u8 {
        self.tiers.len().saturating_sub(1).min(u8::MAX as usize) as u8
    }

    pub fn get(&self, tier: u8) -> Option<&Tier> {
        self.tiers.get(tier as usize)
    }

    pub fn radius(&self, tier: u8) -> Option<f64> {
        self.get(tier).map(|t| t.radius)
    }

    pub fn color(&self, tier: u8) -> Option<[u8; 3]> {
        self.get(tier).map(|t| t.color)
    }

    /// True when radii strictly increase with tier
    pub fn is_ascending(&self) -> bool {
        self.tiers.windows(2).all(|w| w[0].radius < w[1].radius)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallHandle,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Index into the tier table; only ever increases
    pub tier: u8,
    /// Cached `tiers[tier].radius`
    pub radius: f64,
    /// False once absorbed by a merge; never revived
    pub active: bool,
    /// Resting on a floor with negligible vertical speed
    pub grounded: bool,
    /// Already counted toward the score
    pub scored: bool,
    /// Has touched a floor or another ball at least once
    pub landed: bool,
}

impl Ball {
    /// Create a ball at rest. Returns `None` if the tier is not in the table.
    pub fn new(id: BallHandle, pos: DVec2, tier: u8, tiers: &TierTable) -> Option<Self> {
        let radius = tiers.radius(tier)?;
        Some(Self {
            id,
            pos,
            vel: DVec2::ZERO,
            tier,
            radius,
            active: true,
            grounded: false,
            scored: false,
            landed: false,
        })
    }

    /// Scratch ball used by the trajectory preview
    pub(crate) fn ghost(pos: DVec2, vel: DVec2, radius: f64) -> Self {
        Self {
            id: BallHandle(0),
            pos,
            vel,
            tier: 0,
            radius,
            active: true,
            grounded: false,
            scored: false,
            landed: false,
        }
    }

    pub fn color(&self, tiers: &TierTable) -> [u8; 3] {
        tiers.color(self.tier).unwrap_or([255, 255, 255])
    }

    /// Can this ball merge with `other` under the given table?
    pub fn can_merge_with(&self, other: &Ball, tiers: &TierTable) -> bool {
        self.tier == other.tier && self.tier < tiers.max_tier()
    }

    /// Move up one tier. Returns false (and changes nothing) at the top tier.
    pub fn promote(&mut self, tiers: &TierTable) -> bool {
        if self.tier >= tiers.max_tier() {
            return false;
        }
        match tiers.radius(self.tier + 1) {
            Some(radius) => {
                self.tier += 1;
                self.radius = radius;
                true
            }
            None => false,
        }
    }

    /// Topmost y of the ball (screen coordinates, y grows downward)
    #[inline]
    pub fn top(&self) -> f64 {
        self.pos.y - self.radius
    }

    /// Lowest y of the ball
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.pos.y + self.radius
    }

    /// Drop any resting state after being knocked
    #[inline]
    pub fn dislodge(&mut self) {
        self.grounded = false;
    }
}
