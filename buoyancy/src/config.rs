//! Per-module buoyancy configuration.
//!
//! A config is loaded once when the part spawns and never changes afterwards.
//! All fields have defaults so a RON file only needs to list what differs.

use std::fs;
use std::path::Path;

use bevy_log::info;
use serde::{Deserialize, Serialize};

use crate::error::{BuoyancyError, BuoyancyResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyConfig {
    /// Inflated force used when no persisted state exists.
    pub base_force: f32,
    /// Depth at which lift saturates. At 0 depth the lift is 0.
    pub depth_range: f32,
    /// How high the part rides on the water, along the global up axis.
    pub vertical_offset: f32,
    /// Lift is only applied while the vessel's vertical speed is below this. Reduces bobbing.
    pub max_vertical_speed: f32,
    /// Linear drag while in water.
    pub drag_coefficient: f32,
    /// Collision speed above which the part is destroyed on contact with water.
    pub impact_tolerance: f32,
    pub splash_enabled: bool,
    /// Step applied by the increase/decrease force commands.
    pub increments: f32,
    /// Seconds between two splash checks.
    pub splash_cooldown: f32,
    /// Named attachment point used for the depth check and force application.
    /// Falls back to the part origin when unset or unresolvable.
    pub force_point: Option<String>,
    pub sound_inflate: Option<String>,
    pub sound_deflate: Option<String>,
    /// Whether this module drives the part's shared state when nothing is persisted.
    pub master: bool,
    pub debug_mode: bool,
}

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self {
            base_force: 12.0,
            depth_range: 1.0,
            vertical_offset: 0.05,
            max_vertical_speed: 0.2,
            drag_coefficient: 1.5,
            impact_tolerance: 125.0,
            splash_enabled: true,
            increments: 1.0,
            splash_cooldown: 0.5,
            force_point: None,
            sound_inflate: None,
            sound_deflate: None,
            master: true,
            debug_mode: false,
        }
    }
}

impl BuoyancyConfig {
    /// Rejects values the force model cannot work with.
    pub fn validate(&self) -> BuoyancyResult<()> {
        if !(self.depth_range.is_finite() && self.depth_range > 0.0) {
            return Err(BuoyancyError::InvalidConfig {
                field: "depth_range",
                value: self.depth_range,
                reason: "must be positive and finite",
            });
        }
        if !(self.splash_cooldown.is_finite() && self.splash_cooldown >= 0.0) {
            return Err(BuoyancyError::InvalidConfig {
                field: "splash_cooldown",
                value: self.splash_cooldown,
                reason: "must be non-negative and finite",
            });
        }
        if !(self.increments.is_finite() && self.increments >= 0.0) {
            return Err(BuoyancyError::InvalidConfig {
                field: "increments",
                value: self.increments,
                reason: "must be non-negative and finite",
            });
        }
        Ok(())
    }

    /// Parses and validates a config from RON text.
    pub fn from_ron_str(contents: &str) -> BuoyancyResult<Self> {
        let config: BuoyancyConfig = ron::de::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> BuoyancyResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_ron_str(&contents)?;
        info!("Loaded buoyancy config from {}", path.display());
        Ok(config)
    }

    /// Empty strings count as "no sound", matching how part files leave them blank.
    pub fn inflate_sound(&self) -> Option<&str> {
        self.sound_inflate.as_deref().filter(|s| !s.is_empty())
    }

    pub fn deflate_sound(&self) -> Option<&str> {
        self.sound_deflate.as_deref().filter(|s| !s.is_empty())
    }

    pub fn force_point_name(&self) -> Option<&str> {
        self.force_point.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BuoyancyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_depth_range() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = BuoyancyConfig {
                depth_range: bad,
                ..Default::default()
            };
            match config.validate() {
                Err(BuoyancyError::InvalidConfig { field, .. }) => assert_eq!(field, "depth_range"),
                other => panic!("expected depth_range rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_negative_cooldown_and_increments() {
        let config = BuoyancyConfig {
            splash_cooldown: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BuoyancyConfig {
            increments: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config =
            BuoyancyConfig::from_ron_str(r#"(depth_range: 2.0, force_point: Some("left"))"#)
                .unwrap();
        assert_eq!(config.depth_range, 2.0);
        assert_eq!(config.force_point_name(), Some("left"));
        assert_eq!(config.base_force, 12.0);
        assert!(config.master);
    }

    #[test]
    fn test_ron_with_invalid_range_is_rejected() {
        assert!(matches!(
            BuoyancyConfig::from_ron_str("(depth_range: 0.0)"),
            Err(BuoyancyError::InvalidConfig { .. })
        ));
        assert!(matches!(
            BuoyancyConfig::from_ron_str("(depth_range: "),
            Err(BuoyancyError::Ron(_))
        ));
    }

    #[test]
    fn test_blank_sounds_are_none() {
        let config = BuoyancyConfig {
            sound_inflate: Some(String::new()),
            sound_deflate: Some("hiss".into()),
            ..Default::default()
        };
        assert_eq!(config.inflate_sound(), None);
        assert_eq!(config.deflate_sound(), Some("hiss"));
    }
}
