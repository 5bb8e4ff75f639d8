//! Drop-test scenario description, loaded from RON.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use bevy::math::Vec3;
use bevy_log::info;
use buoyancy::inflation::BuoyancyCommand;
use buoyancy::plugin::DEFAULT_BODY_RADIUS;
use buoyancy::BuoyancyConfig;
use serde::{Deserialize, Serialize};

/// A command sent to one module at a given fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub tick: u32,
    pub module: usize,
    pub command: BuoyancyCommand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub ticks: u32,
    pub tick_rate: f64,
    pub body_radius: f64,
    pub has_ocean: bool,
    /// Height of the part above sea level at tick 0.
    pub drop_altitude: f32,
    pub initial_velocity: Vec3,
    pub mass: f32,
    pub gravity: f32,
    /// Camera position relative to the drop point.
    pub viewer_offset: Vec3,
    pub modules: Vec<BuoyancyConfig>,
    /// Local offsets of the part's named attachment points.
    pub attachment_points: HashMap<String, Vec3>,
    pub commands: Vec<ScheduledCommand>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            ticks: 3000,
            tick_rate: 50.0,
            body_radius: DEFAULT_BODY_RADIUS,
            has_ocean: true,
            drop_altitude: 2.0,
            initial_velocity: Vec3::ZERO,
            mass: 1.0,
            gravity: 9.81,
            viewer_offset: Vec3::new(0.0, 10.0, 30.0),
            modules: vec![BuoyancyConfig::default()],
            attachment_points: HashMap::new(),
            commands: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Scenario, Box<dyn std::error::Error>> {
        let contents: String = fs::read_to_string(path)?;
        let scenario: Scenario = ron::de::from_str(&contents)?;
        scenario.validate()?;

        info!("Loaded scenario from disk: {}", path.display());
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for config in &self.modules {
            config.validate()?;
        }
        if self.fixed_step().is_none() {
            return Err(format!(
                "tick_rate must give a fixed step of at least 1ns, got {}",
                self.tick_rate
            )
            .into());
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(format!("mass must be positive and finite, got {}", self.mass).into());
        }
        if !self.gravity.is_finite() {
            return Err(format!("gravity must be finite, got {}", self.gravity).into());
        }
        if !(self.body_radius.is_finite() && self.body_radius > 0.0) {
            return Err(format!(
                "body_radius must be positive and finite, got {}",
                self.body_radius
            )
            .into());
        }
        Ok(())
    }

    /// Duration of one fixed tick, `None` when the rate does not give a usable step.
    pub fn fixed_step(&self) -> Option<Duration> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / self.tick_rate)
            .ok()
            .filter(|step| !step.is_zero())
    }
}
