//! Headless drop tests for buoyant parts.

use bevy::math::DVec3;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_log::{info, warn};
use bevy_rapier3d::prelude::{Damping, ExternalForce, RigidBody, Velocity};
use buoyancy::host::ImpactReport;
use buoyancy::part::ModuleSpec;
use buoyancy::plugin::{
    BuoyancyCommandEvent, BuoyancySet, BuoyantPart, FlightScene, FluidBody, InflationAnimationEvent,
    InflationSoundEvent, NativeBuoyancy, SplashEvent, SplashedRecheckEvent, SplashdownCrashEvent,
    VesselSplashed, ViewerPosition, WaterContact,
};
use buoyancy::{BuoyancyError, BuoyancyResult, PersistedState};

pub mod integrator;
pub mod save;
pub mod scenario;

use integrator::{integrate_point_masses, PointMass};
use scenario::{Scenario, ScheduledCommand};

/// Upper bound on `App::update` calls per fixed tick before giving up.
const MAX_UPDATES_PER_TICK: u32 = 4;

#[derive(Resource, Debug, Default)]
pub struct TickCounter(pub u32);

#[derive(Resource, Debug)]
struct SimulatedPart(Entity);

#[derive(Resource, Debug, Default)]
struct CommandSchedule(Vec<ScheduledCommand>);

/// What happened during a run.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub ticks: u32,
    pub final_altitude: f32,
    pub min_altitude: f32,
    pub inflated: bool,
    pub splashes: usize,
    pub animations: usize,
    pub sounds: usize,
    pub rechecks: usize,
    pub crash: Option<ImpactReport>,
    /// Module states at the end of the run. Empty if the part was destroyed.
    pub persisted: Vec<PersistedState>,
}

impl SimulationReport {
    pub fn destroyed(&self) -> bool {
        self.crash.is_some()
    }
}

fn count_tick(mut counter: ResMut<TickCounter>) {
    counter.0 += 1;
}

fn send_scheduled_commands(
    counter: Res<TickCounter>,
    schedule: Res<CommandSchedule>,
    part: Res<SimulatedPart>,
    mut writer: EventWriter<BuoyancyCommandEvent>,
) {
    for scheduled in schedule.0.iter().filter(|c| c.tick == counter.0) {
        info!(
            "Tick {}: sending {:?} to module {}",
            counter.0, scheduled.command, scheduled.module
        );
        writer.write(BuoyancyCommandEvent {
            entity: part.0,
            module: scheduled.module,
            command: scheduled.command,
        });
    }
}

fn record_events(
    counter: Res<TickCounter>,
    mut report: ResMut<SimulationReport>,
    mut splashes: EventReader<SplashEvent>,
    mut crashes: EventReader<SplashdownCrashEvent>,
    mut animations: EventReader<InflationAnimationEvent>,
    mut sounds: EventReader<InflationSoundEvent>,
    mut rechecks: EventReader<SplashedRecheckEvent>,
) {
    for splash in splashes.read() {
        info!("Tick {}: splash, intensity {:.2}", counter.0, splash.intensity);
        report.splashes += 1;
    }
    for crash in crashes.read() {
        warn!(
            "Tick {}: {} ({}), speed {:.1}",
            counter.0, crash.report.reason, crash.report.location, crash.report.speed
        );
        report.crash = Some(crash.report.clone());
    }
    for animation in animations.read() {
        info!(
            "Tick {}: animation '{}' -> {:?}",
            counter.0, animation.clip, animation.target
        );
        report.animations += 1;
    }
    for sound in sounds.read() {
        info!("Tick {}: sound '{}'", counter.0, sound.clip);
        report.sounds += 1;
    }
    for recheck in rechecks.read() {
        info!("Tick {}: vessel splashed = {}", counter.0, recheck.splashed);
        report.rechecks += 1;
    }
}

/// Builds a headless app with one buoyant part dropped above the ocean.
pub fn build_app(
    scenario: &Scenario,
    persisted: Option<Vec<PersistedState>>,
) -> BuoyancyResult<App> {
    let mut specs: Vec<ModuleSpec> = scenario
        .modules
        .iter()
        .cloned()
        .map(ModuleSpec::new)
        .collect();
    if let Some(states) = persisted {
        if states.len() > specs.len() {
            warn!(
                "Part state lists {} modules but the scenario has {}, extra entries are ignored",
                states.len(),
                specs.len()
            );
        } else if states.len() < specs.len() {
            warn!(
                "Part state lists {} modules but the scenario has {}, the rest start from config defaults",
                states.len(),
                specs.len()
            );
        }
        for (spec, state) in specs.iter_mut().zip(states) {
            spec.persisted = Some(state);
        }
    }
    let part = BuoyantPart::new(specs, scenario.attachment_points.clone())?;

    let step = scenario
        .fixed_step()
        .ok_or(BuoyancyError::InvalidConfig {
            field: "tick_rate",
            value: scenario.tick_rate as f32,
            reason: "must give a fixed step of at least 1ns",
        })?;
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(buoyancy::BuoyancyPlugin);
    app.insert_resource(Time::<Fixed>::from_duration(step));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));

    let body = FluidBody {
        center: DVec3::new(0.0, -scenario.body_radius, 0.0),
        radius: scenario.body_radius,
        has_ocean: scenario.has_ocean,
    };
    let start = Vec3::new(0.0, scenario.drop_altitude, 0.0);
    app.insert_resource(body);
    app.insert_resource(FlightScene(true));
    app.insert_resource(ViewerPosition((start + scenario.viewer_offset).as_dvec3()));
    app.insert_resource(CommandSchedule(scenario.commands.clone()));
    app.init_resource::<TickCounter>();
    app.init_resource::<SimulationReport>();

    app.add_systems(
        FixedUpdate,
        (
            (count_tick, send_scheduled_commands)
                .chain()
                .before(BuoyancySet::Commands),
            (integrate_point_masses, record_events)
                .chain()
                .after(BuoyancySet::Tick),
        ),
    );

    let entity = app
        .world_mut()
        .spawn((
            part,
            Transform::from_translation(start),
            Velocity {
                linvel: scenario.initial_velocity,
                angvel: Vec3::ZERO,
            },
            ExternalForce::default(),
            Damping::default(),
            RigidBody::Dynamic,
            PointMass {
                mass: scenario.mass,
                gravity: scenario.gravity,
            },
            VesselSplashed::default(),
            WaterContact::default(),
            NativeBuoyancy,
        ))
        .id();
    app.insert_resource(SimulatedPart(entity));
    Ok(app)
}

/// Steps `app` for the scenario's number of fixed ticks and collects the report.
pub fn run(mut app: App, scenario: &Scenario) -> SimulationReport {
    app.finish();
    app.cleanup();

    let entity = app.world().resource::<SimulatedPart>().0;
    let altitude = |app: &App| {
        app.world().get::<Transform>(entity).map(|t| {
            let body = app.world().resource::<FluidBody>();
            (t.translation.as_dvec3().distance(body.center) - body.radius) as f32
        })
    };

    let mut min_altitude = altitude(&app).unwrap_or(scenario.drop_altitude);
    let mut last_altitude = min_altitude;
    let mut stalled = 0;
    while app.world().resource::<TickCounter>().0 < scenario.ticks {
        let before = app.world().resource::<TickCounter>().0;
        app.update();
        if app.world().resource::<TickCounter>().0 == before {
            stalled += 1;
            if stalled > MAX_UPDATES_PER_TICK {
                warn!("Fixed timestep stopped advancing, ending run early");
                break;
            }
            continue;
        }
        stalled = 0;

        match altitude(&app) {
            Some(current) => {
                last_altitude = current;
                min_altitude = min_altitude.min(current);
            }
            // Part destroyed
            None => break,
        }
    }

    let mut report = app.world().resource::<SimulationReport>().clone();
    report.ticks = app.world().resource::<TickCounter>().0;
    report.final_altitude = last_altitude;
    report.min_altitude = min_altitude;
    if let Some(part) = app.world().get::<BuoyantPart>(entity) {
        report.inflated = part
            .buoyancy
            .master_module()
            .is_some_and(|m| m.state.is_inflated());
        report.persisted = part.buoyancy.persisted_states();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoyancy::inflation::BuoyancyCommand;
    use buoyancy::BuoyancyConfig;

    fn deflated_manual() -> Vec<PersistedState> {
        vec![PersistedState {
            is_inflated: false,
            inflated_force: 12.0,
            is_master: true,
            auto_deploy: false,
        }]
    }

    #[test]
    fn test_auto_deploy_keeps_part_afloat() {
        let scenario = Scenario::default();
        let app = build_app(&scenario, None).unwrap();
        let report = run(app, &scenario);

        assert_eq!(report.ticks, scenario.ticks);
        assert!(report.inflated);
        assert!(!report.destroyed());
        assert!(report.final_altitude > -1.5 && report.final_altitude < 0.5);
        assert!(report.min_altitude < 0.0);
        // Spawn snap plus the inflate animation
        assert_eq!(report.animations, 2);
        assert!(!report.persisted[0].auto_deploy);
    }

    #[test]
    fn test_deflated_part_sinks() {
        let scenario = Scenario::default();
        let app = build_app(&scenario, Some(deflated_manual())).unwrap();
        let report = run(app, &scenario);

        assert!(!report.inflated);
        assert!(report.final_altitude < -50.0);
    }

    #[test]
    fn test_scheduled_inflate_brings_part_back_up() {
        let scenario = Scenario {
            ticks: 4000,
            commands: vec![ScheduledCommand {
                tick: 40,
                module: 0,
                command: BuoyancyCommand::ToggleInflate,
            }],
            ..Default::default()
        };
        let app = build_app(&scenario, Some(deflated_manual())).unwrap();
        let report = run(app, &scenario);

        assert!(report.inflated);
        assert!(report.min_altitude < -1.0);
        assert!(report.final_altitude > -1.5 && report.final_altitude < 0.5);
    }

    #[test]
    fn test_fast_drop_splashes() {
        let scenario = Scenario {
            drop_altitude: 10.0,
            ticks: 500,
            ..Default::default()
        };
        let app = build_app(&scenario, None).unwrap();
        let report = run(app, &scenario);

        assert!(report.splashes >= 1);
        assert!(!report.destroyed());
    }

    #[test]
    fn test_hard_impact_destroys_part() {
        let scenario = Scenario {
            drop_altitude: 5.0,
            initial_velocity: Vec3::new(0.0, -200.0, 0.0),
            ticks: 100,
            ..Default::default()
        };
        let app = build_app(&scenario, None).unwrap();
        let report = run(app, &scenario);

        assert!(report.destroyed());
        assert!(report.ticks < 10);
        assert!(report.persisted.is_empty());
    }

    #[test]
    fn test_build_app_rejects_unusable_tick_rate() {
        let scenario = Scenario {
            tick_rate: 1e300,
            ..Default::default()
        };
        assert!(matches!(
            build_app(&scenario, None),
            Err(BuoyancyError::InvalidConfig {
                field: "tick_rate",
                ..
            })
        ));
    }

    fn spawned_part(app: &App) -> &BuoyantPart {
        let entity = app.world().resource::<SimulatedPart>().0;
        app.world().get::<BuoyantPart>(entity).unwrap()
    }

    #[test]
    fn test_short_part_state_leaves_rest_to_config() {
        let scenario = Scenario {
            modules: vec![
                BuoyancyConfig::default(),
                BuoyancyConfig {
                    master: false,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let state = PersistedState {
            is_inflated: true,
            inflated_force: 20.0,
            is_master: true,
            auto_deploy: false,
        };
        let app = build_app(&scenario, Some(vec![state])).unwrap();
        let modules = spawned_part(&app).buoyancy.modules();

        assert_eq!(modules[0].state.persisted(), state);
        assert!(!modules[1].state.is_master);
        assert!(modules[1].state.auto_deploy);
        assert_eq!(modules[1].state.inflated_force, 20.0);
    }

    #[test]
    fn test_long_part_state_ignores_extra_entries() {
        let scenario = Scenario::default();
        let mut states = deflated_manual();
        states.push(PersistedState {
            is_inflated: true,
            inflated_force: 30.0,
            is_master: false,
            auto_deploy: true,
        });
        let app = build_app(&scenario, Some(states)).unwrap();
        let part = spawned_part(&app);

        assert_eq!(part.buoyancy.modules().len(), 1);
        assert_eq!(part.buoyancy.persisted_states(), deflated_manual());
    }

    #[test]
    fn test_no_ocean_means_free_fall() {
        let scenario = Scenario {
            has_ocean: false,
            ticks: 100,
            ..Default::default()
        };
        let app = build_app(&scenario, None).unwrap();
        let report = run(app, &scenario);

        assert_eq!(report.splashes, 0);
        assert!(!report.inflated);
        assert!(report.final_altitude < -5.0);
    }
}
