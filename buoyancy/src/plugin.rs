//! Bevy plugin binding buoyant parts to Rapier rigid bodies.
//!
//! This plugin:
//! - Handles inflate/deflate/force commands sent as events
//! - Ticks every [`BuoyantPart`] in `FixedUpdate` while in flight
//! - Writes lift into `ExternalForce` and water drag into `Damping`
//! - Emits animation, sound, splash and crash events for the host
//! - Despawns parts that hit the water too hard
//!
//! The plugin owns `ExternalForce` on buoyant parts and resets it every tick.

use std::collections::HashMap;

use bevy::ecs::system::SystemParam;
use bevy::math::DVec3;
use bevy::prelude::*;
use bevy_log::warn;
use bevy_rapier3d::prelude::{Damping, ExternalForce, RigidBody, Velocity};

use crate::error::BuoyancyResult;
use crate::force::up_direction;
use crate::host::{
    EffectsHost, FluidBodyInfo, ImpactReport, PartInfo, PresentationHost, ReportHost,
    RigidBodyHost, TickContext, TickResult, VesselHost, VesselInfo,
};
use crate::inflation::{BuoyancyCommand, InflationEffect, InflationState};
use crate::part::{ModuleSpec, PartBuoyancy};

/// Radius of the default ocean body.
pub const DEFAULT_BODY_RADIUS: f64 = 600_000.0;

/// Ocean-bearing body the parts float on.
///
/// Positions are relative to a floating origin near the vessel, so the body
/// center usually sits far below the world origin.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct FluidBody {
    pub center: DVec3,
    pub radius: f64,
    pub has_ocean: bool,
}

impl Default for FluidBody {
    fn default() -> Self {
        Self {
            center: DVec3::new(0.0, -DEFAULT_BODY_RADIUS, 0.0),
            radius: DEFAULT_BODY_RADIUS,
            has_ocean: true,
        }
    }
}

/// Whether the flight scene is loaded. Buoyancy only runs in flight.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlightScene(pub bool);

/// Camera position used to cull distant splashes.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewerPosition(pub DVec3);

/// Buoyancy modules of one part, plus the local offsets of its named attachment points.
#[derive(Component, Debug)]
pub struct BuoyantPart {
    pub buoyancy: PartBuoyancy,
    pub attachment_points: HashMap<String, Vec3>,
    pending_effects: Vec<InflationEffect>,
}

impl BuoyantPart {
    pub fn new(
        specs: Vec<ModuleSpec>,
        attachment_points: HashMap<String, Vec3>,
    ) -> BuoyancyResult<Self> {
        let names: Vec<&str> = attachment_points.keys().map(String::as_str).collect();
        let (buoyancy, pending_effects) = PartBuoyancy::spawn(specs, &names)?;
        Ok(Self {
            buoyancy,
            attachment_points,
            pending_effects,
        })
    }
}

/// Whether any part of the vessel is in fluid contact.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VesselSplashed(pub bool);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaterContact(pub bool);

/// Engine-native buoyancy. Removed as soon as a buoyant part ticks, so force
/// is not applied twice.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct NativeBuoyancy;

#[derive(Event, Clone, Copy, Debug)]
pub struct BuoyancyCommandEvent {
    pub entity: Entity,
    pub module: usize,
    pub command: BuoyancyCommand,
}

#[derive(Event, Clone, Debug)]
pub struct InflationAnimationEvent {
    pub entity: Entity,
    pub clip: String,
    pub target: InflationState,
    pub animate: bool,
    pub duration: f32,
}

#[derive(Event, Clone, Debug)]
pub struct InflationSoundEvent {
    pub entity: Entity,
    pub clip: String,
}

#[derive(Event, Clone, Copy, Debug)]
pub struct SplashEvent {
    pub position: DVec3,
    pub intensity: f32,
}

#[derive(Event, Clone, Debug)]
pub struct SplashdownCrashEvent {
    pub entity: Entity,
    pub report: ImpactReport,
}

/// Fired when a part leaves the water and the vessel's fluid contact was re-evaluated.
#[derive(Event, Clone, Copy, Debug)]
pub struct SplashedRecheckEvent {
    pub entity: Entity,
    pub splashed: bool,
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuoyancySet {
    Commands,
    Tick,
}

pub struct BuoyancyPlugin;

impl Plugin for BuoyancyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FluidBody>()
            .init_resource::<FlightScene>()
            .init_resource::<ViewerPosition>()
            .add_event::<BuoyancyCommandEvent>()
            .add_event::<InflationAnimationEvent>()
            .add_event::<InflationSoundEvent>()
            .add_event::<SplashEvent>()
            .add_event::<SplashdownCrashEvent>()
            .add_event::<SplashedRecheckEvent>()
            .configure_sets(FixedUpdate, (BuoyancySet::Commands, BuoyancySet::Tick).chain())
            .add_systems(
                FixedUpdate,
                (
                    handle_buoyancy_commands.in_set(BuoyancySet::Commands),
                    tick_buoyant_parts
                        .in_set(BuoyancySet::Tick)
                        .run_if(in_flight),
                ),
            );
    }
}

fn in_flight(scene: Res<FlightScene>) -> bool {
    scene.0
}

#[derive(SystemParam)]
struct BuoyancyOutputs<'w, 's> {
    commands: Commands<'w, 's>,
    animations: EventWriter<'w, InflationAnimationEvent>,
    sounds: EventWriter<'w, InflationSoundEvent>,
    splashes: EventWriter<'w, SplashEvent>,
    crashes: EventWriter<'w, SplashdownCrashEvent>,
    rechecks: EventWriter<'w, SplashedRecheckEvent>,
}

impl BuoyancyOutputs<'_, '_> {
    fn emit_effect(&mut self, entity: Entity, effect: InflationEffect) {
        match effect {
            InflationEffect::PlayAnimation {
                clip,
                target,
                animate,
                duration,
            } => {
                self.animations.write(InflationAnimationEvent {
                    entity,
                    clip: clip.to_string(),
                    target,
                    animate,
                    duration,
                });
            }
            InflationEffect::PlaySound(clip) => {
                self.sounds.write(InflationSoundEvent { entity, clip });
            }
        }
    }
}

fn handle_buoyancy_commands(
    mut requests: EventReader<BuoyancyCommandEvent>,
    mut parts: Query<(Entity, &mut BuoyantPart)>,
    mut outputs: BuoyancyOutputs,
) {
    for (entity, mut part) in parts.iter_mut() {
        if part.pending_effects.is_empty() {
            continue;
        }
        for effect in std::mem::take(&mut part.pending_effects) {
            outputs.emit_effect(entity, effect);
        }
    }

    for request in requests.read() {
        let Ok((entity, mut part)) = parts.get_mut(request.entity) else {
            warn!(
                "Buoyancy command {:?} for entity {:?} without a buoyant part",
                request.command, request.entity
            );
            continue;
        };
        for effect in part.buoyancy.command(request.module, request.command) {
            outputs.emit_effect(entity, effect);
        }
    }
}

/// Rapier components and event writers of one part, seen through the host traits.
struct RapierPartHost<'a, 'w, 's> {
    entity: Entity,
    origin: Vec3,
    external_force: Option<&'a mut ExternalForce>,
    damping: Option<&'a mut Damping>,
    vessel_splashed: Option<&'a mut VesselSplashed>,
    water_contact: Option<&'a mut WaterContact>,
    any_module_splashed: bool,
    outputs: &'a mut BuoyancyOutputs<'w, 's>,
}

impl RigidBodyHost for RapierPartHost<'_, '_, '_> {
    fn apply_force_at_position(&mut self, force: Vec3, position: DVec3) {
        if let Some(external) = self.external_force.as_deref_mut() {
            external.force += force;
            external.torque += (position.as_vec3() - self.origin).cross(force);
        }
    }

    fn set_linear_drag(&mut self, drag: f32) {
        if let Some(damping) = self.damping.as_deref_mut() {
            damping.linear_damping = drag;
        }
    }
}

impl PresentationHost for RapierPartHost<'_, '_, '_> {
    fn play_animation(&mut self, clip: &str, target: InflationState, animate: bool, duration: f32) {
        self.outputs.animations.write(InflationAnimationEvent {
            entity: self.entity,
            clip: clip.to_string(),
            target,
            animate,
            duration,
        });
    }

    fn play_sound(&mut self, clip: &str) {
        self.outputs.sounds.write(InflationSoundEvent {
            entity: self.entity,
            clip: clip.to_string(),
        });
    }
}

impl EffectsHost for RapierPartHost<'_, '_, '_> {
    fn splash(&mut self, position: DVec3, intensity: f32) {
        self.outputs.splashes.write(SplashEvent {
            position,
            intensity,
        });
    }
}

impl ReportHost for RapierPartHost<'_, '_, '_> {
    fn report_impact(&mut self, report: &ImpactReport) {
        self.outputs.crashes.write(SplashdownCrashEvent {
            entity: self.entity,
            report: report.clone(),
        });
    }

    fn destroy_part(&mut self) {
        self.outputs.commands.entity(self.entity).despawn();
    }
}

impl VesselHost for RapierPartHost<'_, '_, '_> {
    fn set_water_contact(&mut self, contact: bool) {
        if let Some(water_contact) = self.water_contact.as_deref_mut() {
            water_contact.0 = contact;
        }
    }

    fn set_vessel_splashed(&mut self) {
        if let Some(splashed) = self.vessel_splashed.as_deref_mut() {
            splashed.0 = true;
        }
    }

    fn recheck_splashed(&mut self) {
        let splashed = self.any_module_splashed;
        if let Some(vessel_splashed) = self.vessel_splashed.as_deref_mut() {
            vessel_splashed.0 = splashed;
        }
        self.outputs.rechecks.write(SplashedRecheckEvent {
            entity: self.entity,
            splashed,
        });
    }

    fn remove_native_buoyancy(&mut self) {
        self.outputs
            .commands
            .entity(self.entity)
            .remove::<NativeBuoyancy>();
    }
}

fn tick_buoyant_parts(
    time: Res<Time>,
    body: Res<FluidBody>,
    viewer: Res<ViewerPosition>,
    mut parts: Query<(
        Entity,
        &mut BuoyantPart,
        &Transform,
        Option<&Velocity>,
        Option<&mut ExternalForce>,
        Option<&mut Damping>,
        Option<&mut VesselSplashed>,
        Option<&mut WaterContact>,
        Has<RigidBody>,
        Has<NativeBuoyancy>,
    )>,
    mut outputs: BuoyancyOutputs,
) {
    let dt = time.delta_secs();
    for (
        entity,
        mut part,
        transform,
        velocity,
        mut external_force,
        mut damping,
        mut vessel_splashed,
        mut water_contact,
        has_rigid_body,
        has_native_buoyancy,
    ) in parts.iter_mut()
    {
        let position = transform.translation.as_dvec3();
        let linvel = velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO);
        let up = up_direction(body.center, position);

        let attachment_points = part
            .attachment_points
            .iter()
            .map(|(name, offset)| (name.clone(), transform.transform_point(*offset).as_dvec3()))
            .collect();

        let ctx = TickContext {
            in_flight: true,
            dt,
            body: FluidBodyInfo {
                center: body.center,
                radius: body.radius,
                has_ocean: body.has_ocean,
            },
            vessel: VesselInfo {
                position,
                vertical_speed: linvel.dot(up),
                splashed: vessel_splashed
                    .as_deref()
                    .map(|s| s.0)
                    .unwrap_or_else(|| part.buoyancy.any_splashed()),
            },
            part: PartInfo {
                position,
                speed: linvel.length(),
                has_rigid_body,
                has_native_buoyancy,
                attachment_points,
            },
            viewer_position: viewer.0,
        };

        if let Some(external) = external_force.as_deref_mut() {
            external.force = Vec3::ZERO;
            external.torque = Vec3::ZERO;
        }

        let result: TickResult = part.buoyancy.tick(&ctx);
        let mut host = RapierPartHost {
            entity,
            origin: transform.translation,
            external_force: external_force.as_deref_mut(),
            damping: damping.as_deref_mut(),
            vessel_splashed: vessel_splashed.as_deref_mut(),
            water_contact: water_contact.as_deref_mut(),
            any_module_splashed: part.buoyancy.any_splashed(),
            outputs: &mut outputs,
        };
        result.apply(&mut host);
    }
}
