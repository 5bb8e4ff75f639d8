//! Part-level registry of buoyancy modules and the per-tick orchestration.
//!
//! A part may carry several modules, typically one per named force point.
//! The registry is built once at spawn: it picks the master, mirrors the
//! children from it and from then on routes every command through the master.

use bevy::math::DVec3;
use bevy_log::{debug, info, warn};

use crate::config::BuoyancyConfig;
use crate::constants::{AIR_DRAG, CRASH_LOCATION, CRASH_REASON};
use crate::error::BuoyancyResult;
use crate::force::{
    lift_multiplier, should_splash, splash_intensity, submersion_depth, up_direction, uplift,
    vertical_speed_allows_lift, SplashTimer,
};
use crate::host::{AppliedForce, ImpactReport, SplashRequest, TickContext, TickResult};
use crate::inflation::{BuoyancyCommand, BuoyancyState, InflationEffect, PersistedState};

/// Where a module measures depth and applies its force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForcePoint {
    Attachment(String),
    PartOrigin,
}

impl ForcePoint {
    fn resolve(&self, ctx: &TickContext) -> DVec3 {
        match self {
            ForcePoint::Attachment(name) => ctx
                .part
                .attachment_points
                .get(name)
                .copied()
                .unwrap_or(ctx.part.position),
            ForcePoint::PartOrigin => ctx.part.position,
        }
    }
}

/// How a module is declared on a part.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    pub config: BuoyancyConfig,
    pub persisted: Option<PersistedState>,
}

impl ModuleSpec {
    pub fn new(config: BuoyancyConfig) -> Self {
        Self {
            config,
            persisted: None,
        }
    }

    pub fn with_persisted(mut self, persisted: PersistedState) -> Self {
        self.persisted = Some(persisted);
        self
    }
}

#[derive(Debug, Clone)]
pub struct BuoyancyModule {
    pub config: BuoyancyConfig,
    pub state: BuoyancyState,
    pub force_point: ForcePoint,
    splashed: bool,
    splash_timer: SplashTimer,
}

impl BuoyancyModule {
    fn spawn(spec: ModuleSpec, attachment_names: &[&str]) -> Self {
        let persisted = spec
            .persisted
            .unwrap_or_else(|| PersistedState::from_config(&spec.config));

        let force_point = match spec.config.force_point_name() {
            Some(name) if attachment_names.contains(&name) => {
                ForcePoint::Attachment(name.to_string())
            }
            Some(name) => {
                warn!("Force point '{}' not found on part, using part origin", name);
                ForcePoint::PartOrigin
            }
            None => ForcePoint::PartOrigin,
        };

        Self {
            state: BuoyancyState::restore(&persisted),
            splash_timer: SplashTimer::new(spec.config.splash_cooldown),
            force_point,
            splashed: false,
            config: spec.config,
        }
    }

    pub fn is_splashed(&self) -> bool {
        self.splashed
    }

    pub fn splash_cooldown_remaining(&self) -> f32 {
        self.splash_timer.remaining().max(0.0)
    }

    /// Force model for one module. Returns `true` when the part was destroyed.
    fn simulate(&mut self, ctx: &TickContext, result: &mut TickResult) -> bool {
        let force_point = self.force_point.resolve(ctx);
        let depth = submersion_depth(
            force_point.distance(ctx.body.center),
            ctx.body.radius,
            self.config.vertical_offset,
        );

        if depth >= 0.0 {
            if self.splashed {
                self.splashed = false;
                result.drag = Some(AIR_DRAG);
                result.water_contact = Some(false);
                result.recheck_splashed = true;
            }
            return false;
        }

        result.drag = Some(self.config.drag_coefficient);
        self.splashed = true;
        result.water_contact = Some(true);
        result.vessel_splashed = true;

        let speed = ctx.part.speed;
        if speed > self.config.impact_tolerance {
            result.destroyed = Some(ImpactReport {
                location: CRASH_LOCATION,
                reason: CRASH_REASON,
                speed,
                tolerance: self.config.impact_tolerance,
            });
            return true;
        }

        let multiplier = lift_multiplier(depth, self.config.depth_range);
        if multiplier > 0.0
            && vertical_speed_allows_lift(ctx.vessel.vertical_speed, self.config.max_vertical_speed)
        {
            let up = up_direction(ctx.body.center, ctx.vessel.position);
            result.forces.push(AppliedForce {
                force: uplift(up, self.state.current_force, multiplier),
                position: force_point,
            });
        }

        if self.config.splash_enabled && self.splash_timer.tick(ctx.dt) {
            let viewer_distance = ctx.part.position.distance(ctx.viewer_position);
            if should_splash(speed, depth, self.config.depth_range, viewer_distance) {
                result.splashes.push(SplashRequest {
                    position: ctx.part.position,
                    intensity: splash_intensity(speed),
                });
            }
        }

        false
    }
}

/// All buoyancy modules hosted by one physical part.
#[derive(Debug, Clone)]
pub struct PartBuoyancy {
    modules: Vec<BuoyancyModule>,
    master: usize,
    destroyed: bool,
}

impl PartBuoyancy {
    /// Builds the registry. Every config is validated, exactly one module ends
    /// up as master and the children are mirrored from it.
    ///
    /// Returns the registry and the effects the master plays on spawn.
    pub fn spawn(
        specs: Vec<ModuleSpec>,
        attachment_names: &[&str],
    ) -> BuoyancyResult<(Self, Vec<InflationEffect>)> {
        for spec in &specs {
            spec.config.validate()?;
        }

        let mut modules: Vec<BuoyancyModule> = specs
            .into_iter()
            .map(|spec| BuoyancyModule::spawn(spec, attachment_names))
            .collect();

        let master = match modules.iter().position(|m| m.state.is_master) {
            Some(index) => index,
            None => {
                if !modules.is_empty() {
                    warn!("No buoyancy module flagged as master, promoting module 0");
                    modules[0].state.is_master = true;
                }
                0
            }
        };
        for (index, module) in modules.iter_mut().enumerate() {
            if index != master && module.state.is_master {
                warn!(
                    "Buoyancy module {} also flagged as master, demoting it to child",
                    index
                );
                module.state.is_master = false;
            }
        }

        let mut part = Self {
            modules,
            master,
            destroyed: false,
        };
        part.update_children();

        let effects = part
            .master_module()
            .map(|m| vec![m.state.restore_effect()])
            .unwrap_or_default();
        Ok((part, effects))
    }

    pub fn modules(&self) -> &[BuoyancyModule] {
        &self.modules
    }

    pub fn master_index(&self) -> usize {
        self.master
    }

    pub fn master_module(&self) -> Option<&BuoyancyModule> {
        self.modules.get(self.master)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn any_splashed(&self) -> bool {
        self.modules.iter().any(|m| m.splashed)
    }

    pub fn persisted_states(&self) -> Vec<PersistedState> {
        self.modules.iter().map(|m| m.state.persisted()).collect()
    }

    /// Sum of the forces the part would get at full submersion.
    pub fn current_force(&self) -> f32 {
        self.modules.iter().map(|m| m.state.current_force).sum()
    }

    /// Runs `command` on module `index`. Children and unknown indices ignore it.
    pub fn command(&mut self, index: usize, command: BuoyancyCommand) -> Vec<InflationEffect> {
        if self.destroyed {
            return Vec::new();
        }
        let Some(module) = self.modules.get_mut(index) else {
            debug!("Buoyancy command {:?} for unknown module {}", command, index);
            return Vec::new();
        };
        if !module.state.is_master {
            debug!("Ignoring {:?} on child buoyancy module {}", command, index);
            return Vec::new();
        }

        let mut effects = Vec::new();
        match command {
            BuoyancyCommand::ToggleInflate => {
                if let Some(played) = module.state.toggle_inflate(&module.config) {
                    info!(
                        "Buoyancy module {} {}",
                        index,
                        if module.state.is_inflated() {
                            "inflated"
                        } else {
                            "deflated"
                        }
                    );
                    effects = played;
                }
            }
            BuoyancyCommand::ToggleAutoDeploy => {
                module.state.toggle_auto_deploy();
                // Auto-deploy is per module, children keep their own flag
                return effects;
            }
            BuoyancyCommand::IncreaseForce => {
                let step = module.config.increments;
                module.state.adjust_force(step);
                debug!("Inflated force: {}", module.state.inflated_force);
            }
            BuoyancyCommand::DecreaseForce => {
                let step = module.config.increments;
                module.state.adjust_force(-step);
                debug!("Inflated force: {}", module.state.inflated_force);
            }
        }
        self.update_children();
        effects
    }

    fn update_children(&mut self) {
        let Some(master) = self.modules.get(self.master).map(|m| m.state) else {
            return;
        };
        for (index, module) in self.modules.iter_mut().enumerate() {
            if index != self.master {
                module.state.mirror(&master);
            }
        }
    }

    /// One simulation step for the whole part.
    pub fn tick(&mut self, ctx: &TickContext) -> TickResult {
        let mut result = TickResult::default();
        if !ctx.in_flight || self.destroyed {
            return result;
        }

        let mut vessel_splashed = ctx.vessel.splashed;
        for index in 0..self.modules.len() {
            if self.modules[index].state.should_auto_deploy(vessel_splashed) {
                let effects = self.command(index, BuoyancyCommand::ToggleInflate);
                result.effects.extend(effects);
            }

            if !ctx.body.has_ocean || !ctx.part.has_rigid_body {
                continue;
            }
            if ctx.part.has_native_buoyancy {
                result.remove_native_buoyancy = true;
            }

            let destroyed = self.modules[index].simulate(ctx, &mut result);
            vessel_splashed |= result.vessel_splashed;
            if destroyed {
                warn!(
                    "Part hit the water at {:.1} m/s (tolerance {:.1}), destroying it",
                    ctx.part.speed, self.modules[index].config.impact_tolerance
                );
                self.destroyed = true;
                break;
            }
        }
        result
    }
}
