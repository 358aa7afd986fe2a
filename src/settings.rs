//! Game settings and variants
//!
//! A [`Settings`] value bundles the physical constants, the basket shape and
//! the drop rules. Presets reproduce the known game variants; JSON documents
//! can override any subset of the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::ball::TierTable;
use crate::sim::container::{Basket, Container, Field, FlatBasket, InsetBasket, ParabolicBasket};
use crate::sim::physics::PhysicsConfig;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Known game variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Wide field with a flat floor and five tiers
    #[default]
    Classic,
    /// Tall full-width basket, ten tiers, overflow countdown
    Tall,
    /// Narrow basket inset in a wider field with a ledge beside it
    Inset,
    /// Parabolic bowl
    Bowl,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "Classic",
            Variant::Tall => "Tall",
            Variant::Inset => "Inset",
            Variant::Bowl => "Bowl",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "flat" => Some(Variant::Classic),
            "tall" => Some(Variant::Tall),
            "inset" => Some(Variant::Inset),
            "bowl" | "parabola" | "parabolic" => Some(Variant::Bowl),
            _ => None,
        }
    }

    pub fn all() -> [Variant; 4] {
        [Variant::Classic, Variant::Tall, Variant::Inset, Variant::Bowl]
    }
}

/// Drop and game-over rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Refuse new drops while one is still falling
    pub single_drop: bool,
    /// Seconds the stack may stay above the overflow line
    pub countdown_secs: f64,
    /// Highest tier the spawn queue hands out
    pub spawn_tier_max: u8,
    /// Drag distance to launch speed
    pub aim_velocity_scale: f64,
    /// Points produced by the aim preview (plus the start point)
    pub preview_steps: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            single_drop: true,
            countdown_secs: COUNTDOWN_SECS,
            spawn_tier_max: (BALL_SIZES.len() - 2) as u8,
            aim_velocity_scale: AIM_VELOCITY_SCALE,
            preview_steps: PREVIEW_STEPS,
        }
    }
}

fn classic_basket() -> Basket {
    Basket::Flat(FlatBasket {
        field: Field {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            ceiling: 100.0,
        },
        floor_y: FIELD_HEIGHT - BASKET_HEIGHT,
    })
}

fn tall_tiers() -> TierTable {
    let radii: Vec<f64> = (0..10).map(|i| 20.0 + 10.0 * i as f64).collect();
    TierTable::from_parts(
        &radii,
        &[
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
            [255, 255, 0],
            [255, 0, 255],
            [0, 255, 255],
            [128, 0, 128],
            [255, 165, 0],
            [75, 0, 130],
            [139, 69, 19],
        ],
    )
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default = "classic_basket")]
    pub basket: Basket,
    #[serde(default)]
    pub rules: Rules,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_preset(Variant::Classic)
    }
}

impl Settings {
    /// Build the settings for a known variant
    pub fn from_preset(variant: Variant) -> Self {
        match variant {
            Variant::Classic => Self {
                physics: PhysicsConfig::default(),
                basket: classic_basket(),
                rules: Rules::default(),
            },
            Variant::Tall => Self {
                physics: PhysicsConfig {
                    bounce: 0.7,
                    friction: 0.98,
                    tiers: tall_tiers(),
                    ..PhysicsConfig::default()
                },
                basket: Basket::Inset(InsetBasket {
                    field: Field {
                        width: 600.0,
                        height: 800.0,
                        ceiling: 330.0,
                    },
                    left: 0.0,
                    right: 600.0,
                    top: 380.0,
                    bottom: 780.0,
                    ledge_y: None,
                }),
                rules: Rules {
                    single_drop: false,
                    spawn_tier_max: 8,
                    ..Rules::default()
                },
            },
            Variant::Inset => Self {
                physics: PhysicsConfig {
                    bounce: 0.5,
                    friction: 0.98,
                    ..PhysicsConfig::default()
                },
                basket: Basket::Inset(InsetBasket {
                    field: Field {
                        width: 800.0,
                        height: 800.0,
                        ceiling: 330.0,
                    },
                    left: 150.0,
                    right: 650.0,
                    top: 380.0,
                    bottom: 780.0,
                    ledge_y: Some(800.0),
                }),
                rules: Rules::default(),
            },
            Variant::Bowl => Self {
                physics: PhysicsConfig {
                    bounce: 0.5,
                    friction: 0.98,
                    ..PhysicsConfig::default()
                },
                basket: Basket::Parabolic(ParabolicBasket {
                    field: Field {
                        width: 600.0,
                        height: 800.0,
                        ceiling: 300.0,
                    },
                    a: 0.004,
                    h: 300.0,
                    k: 760.0,
                    rim_y: 460.0,
                }),
                rules: Rules::default(),
            },
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the physical constants and geometry for usable values
    pub fn validate(&self) -> Result<(), SettingsError> {
        let physics = &self.physics;
        if physics.tiers.is_empty() {
            return Err(SettingsError::invalid("physics.tiers", "at least one tier is required"));
        }
        if physics.tiers.len() > u8::MAX as usize + 1 {
            return Err(SettingsError::invalid("physics.tiers", "too many tiers"));
        }
        if !physics.tiers.is_ascending() || physics.tiers.iter().any(|t| !(t.radius > 0.0)) {
            return Err(SettingsError::invalid(
                "physics.tiers",
                "radii must be positive and strictly ascending",
            ));
        }
        if !(physics.friction > 0.0 && physics.friction <= 1.0) {
            return Err(SettingsError::invalid("physics.friction", format!("{} not in (0, 1]", physics.friction)));
        }
        if !(physics.bounce > 0.0 && physics.bounce < 1.0) {
            return Err(SettingsError::invalid("physics.bounce", format!("{} not in (0, 1)", physics.bounce)));
        }
        if !(physics.gravity >= 0.0) {
            return Err(SettingsError::invalid("physics.gravity", "must be non-negative"));
        }
        if !(physics.rest_threshold > 0.0) {
            return Err(SettingsError::invalid("physics.rest_threshold", "must be positive"));
        }
        if !(physics.merge_impulse >= 0.0) {
            return Err(SettingsError::invalid("physics.merge_impulse", "must be non-negative"));
        }

        if self.rules.spawn_tier_max > physics.tiers.max_tier() {
            return Err(SettingsError::invalid(
                "rules.spawn_tier_max",
                format!("{} exceeds max tier {}", self.rules.spawn_tier_max, physics.tiers.max_tier()),
            ));
        }
        if !(self.rules.countdown_secs >= 0.0) {
            return Err(SettingsError::invalid("rules.countdown_secs", "must be non-negative"));
        }

        let field = self.basket.field();
        if !(field.width > 0.0 && field.height > 0.0) {
            return Err(SettingsError::invalid("basket.field", "width and height must be positive"));
        }
        let largest = physics.tiers.radius(physics.tiers.max_tier()).unwrap_or_default();
        if field.width < 2.0 * largest {
            return Err(SettingsError::invalid("basket.field.width", "narrower than the largest ball"));
        }

        match &self.basket {
            Basket::Flat(flat) => {
                if !(flat.floor_y > 0.0 && flat.floor_y <= field.height) {
                    return Err(SettingsError::invalid("basket.floor_y", "floor must lie inside the field"));
                }
            }
            Basket::Inset(inset) => {
                if !(0.0 <= inset.left && inset.left < inset.right && inset.right <= field.width) {
                    return Err(SettingsError::invalid("basket.left", "walls must be ordered and inside the field"));
                }
                if !(inset.top < inset.bottom && inset.bottom <= field.height) {
                    return Err(SettingsError::invalid("basket.bottom", "rim must be above a floor inside the field"));
                }
            }
            Basket::Parabolic(bowl) => {
                if !(bowl.a > 0.0) {
                    return Err(SettingsError::invalid("basket.a", "bowl must open upward (a > 0)"));
                }
                if !(bowl.k <= field.height && bowl.rim_y < bowl.k) {
                    return Err(SettingsError::invalid("basket.k", "bowl bottom must be inside the field and below the rim"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for variant in Variant::all() {
            let settings = Settings::from_preset(variant);
            assert!(settings.validate().is_ok(), "{} preset invalid", variant.as_str());
        }
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!(Variant::from_str("TALL"), Some(Variant::Tall));
        assert_eq!(Variant::from_str("parabola"), Some(Variant::Bowl));
        assert_eq!(Variant::from_str("hexagon"), None);
        for variant in Variant::all() {
            assert_eq!(Variant::from_str(variant.as_str()), Some(variant));
        }
    }

    #[test]
    fn test_json_roundtrip_preserves_preset() {
        let settings = Settings::from_preset(Variant::Bowl);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let settings = Settings::from_json(r#"{ "physics": { "gravity": 0.5 } }"#).unwrap();
        assert_eq!(settings.physics.gravity, 0.5);
        assert_eq!(settings.physics.bounce, BOUNCE_FACTOR);
        assert_eq!(settings.basket, classic_basket());
        assert_eq!(settings.rules, Rules::default());
    }

    #[test]
    fn test_json_basket_shape_tag() {
        let json = r#"{
            "basket": {
                "shape": "inset",
                "field": { "width": 800.0, "height": 800.0, "ceiling": 300.0 },
                "left": 100.0, "right": 700.0, "top": 400.0, "bottom": 780.0
            }
        }"#;
        let settings = Settings::from_json(json).unwrap();
        match settings.basket {
            Basket::Inset(inset) => assert_eq!(inset.ledge_y, None),
            other => panic!("unexpected basket {}", other.name()),
        }
    }

    #[test]
    fn test_rejects_bad_bounce() {
        let err = Settings::from_json(r#"{ "physics": { "bounce": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "physics.bounce", .. }));
    }

    #[test]
    fn test_rejects_spawn_tier_above_table() {
        let mut settings = Settings::default();
        settings.rules.spawn_tier_max = 7;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "rules.spawn_tier_max", .. })
        ));
    }

    #[test]
    fn test_rejects_descending_tiers() {
        let mut settings = Settings::default();
        settings.physics.tiers = TierTable::from_parts(&[30.0, 20.0], &[[0, 0, 0]; 2]);
        settings.rules.spawn_tier_max = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Settings::load("/definitely/not/here/settings.json"),
            Err(SettingsError::Io(_))
        ));
    }
}
