//! Inflate/deflate state machine for a single module.
//!
//! Only the master module of a part accepts commands. Propagation to the
//! children is handled by [`PartBuoyancy`](crate::part::PartBuoyancy), which
//! calls [`BuoyancyState::mirror`] right after every master transition.

use serde::{Deserialize, Serialize};

use crate::config::BuoyancyConfig;
use crate::constants::{DEFLATE_ANIMATION_DURATION, INFLATE_ANIMATION, INFLATE_ANIMATION_DURATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InflationState {
    #[default]
    Deflated,
    Inflated,
}

impl InflationState {
    pub fn is_inflated(self) -> bool {
        self == InflationState::Inflated
    }

    pub fn toggled(self) -> Self {
        match self {
            InflationState::Deflated => InflationState::Inflated,
            InflationState::Inflated => InflationState::Deflated,
        }
    }
}

/// Zero-argument commands a host UI or action group can send to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuoyancyCommand {
    ToggleInflate,
    ToggleAutoDeploy,
    IncreaseForce,
    DecreaseForce,
}

/// Side effects of an inflation transition, played by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InflationEffect {
    /// Drive `clip` towards `target`. `animate == false` snaps to the end state.
    PlayAnimation {
        clip: &'static str,
        target: InflationState,
        animate: bool,
        duration: f32,
    },
    PlaySound(String),
}

/// Scalars carried across save/load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub is_inflated: bool,
    pub inflated_force: f32,
    pub is_master: bool,
    pub auto_deploy: bool,
}

impl PersistedState {
    /// State of a freshly built part.
    pub fn from_config(config: &BuoyancyConfig) -> Self {
        Self {
            is_inflated: false,
            inflated_force: config.base_force,
            is_master: config.master,
            auto_deploy: true,
        }
    }
}

/// Authoritative simulation state of one module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuoyancyState {
    /// Force currently fed into the force model. Zero while deflated.
    pub current_force: f32,
    /// Force used once inflated.
    pub inflated_force: f32,
    pub inflation: InflationState,
    pub is_master: bool,
    pub auto_deploy: bool,
}

impl BuoyancyState {
    pub fn restore(persisted: &PersistedState) -> Self {
        let inflation = if persisted.is_inflated {
            InflationState::Inflated
        } else {
            InflationState::Deflated
        };
        Self {
            current_force: if persisted.is_inflated {
                persisted.inflated_force
            } else {
                0.0
            },
            inflated_force: persisted.inflated_force,
            inflation,
            is_master: persisted.is_master,
            auto_deploy: persisted.auto_deploy,
        }
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            is_inflated: self.is_inflated(),
            inflated_force: self.inflated_force,
            is_master: self.is_master,
            auto_deploy: self.auto_deploy,
        }
    }

    pub fn is_inflated(&self) -> bool {
        self.inflation.is_inflated()
    }

    /// Animation snap played when a master spawns, so the model matches the restored state.
    pub fn restore_effect(&self) -> InflationEffect {
        InflationEffect::PlayAnimation {
            clip: INFLATE_ANIMATION,
            target: self.inflation,
            animate: false,
            duration: 1.0,
        }
    }

    /// Flips inflation. Returns `None` on a child.
    pub fn toggle_inflate(&mut self, config: &BuoyancyConfig) -> Option<Vec<InflationEffect>> {
        if !self.is_master {
            return None;
        }

        let mut effects = Vec::with_capacity(2);
        match self.inflation {
            InflationState::Inflated => {
                self.current_force = 0.0;
                effects.push(InflationEffect::PlayAnimation {
                    clip: INFLATE_ANIMATION,
                    target: InflationState::Deflated,
                    animate: true,
                    duration: DEFLATE_ANIMATION_DURATION,
                });
                if let Some(sound) = config.deflate_sound() {
                    effects.push(InflationEffect::PlaySound(sound.to_string()));
                }
            }
            InflationState::Deflated => {
                self.current_force = self.inflated_force;
                effects.push(InflationEffect::PlayAnimation {
                    clip: INFLATE_ANIMATION,
                    target: InflationState::Inflated,
                    animate: true,
                    duration: INFLATE_ANIMATION_DURATION,
                });
                if let Some(sound) = config.inflate_sound() {
                    effects.push(InflationEffect::PlaySound(sound.to_string()));
                }
            }
        }
        // A manual toggle overrides automatic behavior
        self.auto_deploy = false;
        self.inflation = self.inflation.toggled();
        Some(effects)
    }

    /// Changes the inflated force by `delta`. The current force is left alone
    /// and picks the new value up on the next inflate. There is no floor, a
    /// negative force pulls the part down once inflated.
    pub fn adjust_force(&mut self, delta: f32) -> bool {
        if !self.is_master {
            return false;
        }
        self.inflated_force += delta;
        true
    }

    pub fn toggle_auto_deploy(&mut self) -> bool {
        if !self.is_master {
            return false;
        }
        self.auto_deploy = !self.auto_deploy;
        true
    }

    pub fn should_auto_deploy(&self, vessel_splashed: bool) -> bool {
        self.is_master && vessel_splashed && self.auto_deploy && !self.is_inflated()
    }

    /// Copies the shared fields from the master. `is_master` and `auto_deploy` stay local.
    pub fn mirror(&mut self, master: &BuoyancyState) {
        self.current_force = master.current_force;
        self.inflated_force = master.inflated_force;
        self.inflation = master.inflation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> BuoyancyState {
        BuoyancyState::restore(&PersistedState::from_config(&BuoyancyConfig::default()))
    }

    #[test]
    fn test_restore_sets_current_force_from_inflation() {
        let mut persisted = PersistedState::from_config(&BuoyancyConfig::default());
        persisted.inflated_force = 20.0;
        assert_eq!(BuoyancyState::restore(&persisted).current_force, 0.0);

        persisted.is_inflated = true;
        let state = BuoyancyState::restore(&persisted);
        assert_eq!(state.current_force, 20.0);
        assert!(state.is_inflated());
        assert_eq!(state.persisted(), persisted);
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let config = BuoyancyConfig::default();
        let mut state = master();
        let original_force = state.current_force;

        state.toggle_inflate(&config).unwrap();
        assert!(state.is_inflated());
        assert_eq!(state.current_force, 12.0);
        assert!(!state.auto_deploy);

        state.toggle_inflate(&config).unwrap();
        assert!(!state.is_inflated());
        assert_eq!(state.current_force, original_force);
    }

    #[test]
    fn test_toggle_effects_include_animation_and_sound() {
        let config = BuoyancyConfig {
            sound_inflate: Some("inflate_sound".into()),
            ..Default::default()
        };
        let mut state = master();

        let effects = state.toggle_inflate(&config).unwrap();
        assert_eq!(
            effects,
            vec![
                InflationEffect::PlayAnimation {
                    clip: INFLATE_ANIMATION,
                    target: InflationState::Inflated,
                    animate: true,
                    duration: INFLATE_ANIMATION_DURATION,
                },
                InflationEffect::PlaySound("inflate_sound".into()),
            ]
        );

        // No deflate sound configured
        let effects = state.toggle_inflate(&config).unwrap();
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_child_ignores_commands() {
        let config = BuoyancyConfig::default();
        let mut child = master();
        child.is_master = false;
        let before = child;

        assert!(child.toggle_inflate(&config).is_none());
        assert!(!child.adjust_force(1.0));
        assert!(!child.toggle_auto_deploy());
        assert!(!child.should_auto_deploy(true));
        assert_eq!(child, before);
    }

    #[test]
    fn test_adjust_force_leaves_current_force() {
        let config = BuoyancyConfig::default();
        let mut state = master();
        state.toggle_inflate(&config).unwrap();

        assert!(state.adjust_force(config.increments));
        assert_eq!(state.inflated_force, 13.0);
        assert_eq!(state.current_force, 12.0);
        assert!(state.is_inflated());

    }

    #[test]
    fn test_decrease_force_goes_below_zero() {
        let config = BuoyancyConfig::default();
        let mut state = BuoyancyState::restore(&PersistedState {
            is_inflated: false,
            inflated_force: 0.5,
            is_master: true,
            auto_deploy: false,
        });

        assert!(state.adjust_force(-config.increments));
        assert_eq!(state.inflated_force, -0.5);
        assert_eq!(state.current_force, 0.0);

        state.toggle_inflate(&config).unwrap();
        assert_eq!(state.current_force, -0.5);
    }

    #[test]
    fn test_auto_deploy_conditions() {
        let config = BuoyancyConfig::default();
        let mut state = master();
        assert!(!state.should_auto_deploy(false));
        assert!(state.should_auto_deploy(true));

        state.toggle_auto_deploy();
        assert!(!state.should_auto_deploy(true));

        state.toggle_auto_deploy();
        state.toggle_inflate(&config).unwrap();
        assert!(!state.should_auto_deploy(true));
    }
}
