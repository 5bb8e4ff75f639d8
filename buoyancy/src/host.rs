//! Seams between the buoyancy core and the host engine.
//!
//! The core never talks to the engine directly. Each tick it reads a
//! [`TickContext`] snapshot and returns a [`TickResult`]; the host either
//! consumes the result itself or forwards it through [`TickResult::apply`]
//! to the collaborator traits below.

use std::collections::HashMap;

use bevy::math::{DVec3, Vec3};

use crate::inflation::{InflationEffect, InflationState};

/// The celestial body whose surface the part may be floating on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidBodyInfo {
    pub center: DVec3,
    pub radius: f64,
    pub has_ocean: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VesselInfo {
    pub position: DVec3,
    /// Signed speed along the body's up axis. Positive is rising.
    pub vertical_speed: f32,
    /// Whether any part of the vessel is in fluid contact.
    pub splashed: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartInfo {
    pub position: DVec3,
    /// Collision/impact speed of the part's rigid body.
    pub speed: f32,
    pub has_rigid_body: bool,
    /// Engine-side buoyancy that would apply force a second time.
    pub has_native_buoyancy: bool,
    /// World positions of the part's named attachment points.
    pub attachment_points: HashMap<String, DVec3>,
}

/// Everything the core reads during one simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct TickContext {
    /// Only the flight scene simulates buoyancy.
    pub in_flight: bool,
    pub dt: f32,
    pub body: FluidBodyInfo,
    pub vessel: VesselInfo,
    pub part: PartInfo,
    pub viewer_position: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vec3,
    pub position: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashRequest {
    pub position: DVec3,
    pub intensity: f32,
}

/// Structured report fired when a part hits the water too hard.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactReport {
    pub location: &'static str,
    pub reason: &'static str,
    pub speed: f32,
    pub tolerance: f32,
}

/// Directives produced by one part tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickResult {
    pub effects: Vec<InflationEffect>,
    pub remove_native_buoyancy: bool,
    pub forces: Vec<AppliedForce>,
    /// New linear drag, when it changed this tick.
    pub drag: Option<f32>,
    /// New part water-contact flag, when it changed this tick.
    pub water_contact: Option<bool>,
    pub vessel_splashed: bool,
    pub recheck_splashed: bool,
    pub splashes: Vec<SplashRequest>,
    /// Set when the part was destroyed. Nothing after the impact was processed.
    pub destroyed: Option<ImpactReport>,
}

impl TickResult {
    pub fn total_force(&self) -> Vec3 {
        self.forces.iter().map(|f| f.force).sum()
    }

    pub fn apply(self, host: &mut impl BuoyancyHost) {
        for effect in self.effects {
            match effect {
                InflationEffect::PlayAnimation {
                    clip,
                    target,
                    animate,
                    duration,
                } => host.play_animation(clip, target, animate, duration),
                InflationEffect::PlaySound(clip) => host.play_sound(&clip),
            }
        }
        if self.remove_native_buoyancy {
            host.remove_native_buoyancy();
        }
        for applied in &self.forces {
            host.apply_force_at_position(applied.force, applied.position);
        }
        if let Some(drag) = self.drag {
            host.set_linear_drag(drag);
        }
        if let Some(contact) = self.water_contact {
            host.set_water_contact(contact);
        }
        if self.vessel_splashed {
            host.set_vessel_splashed();
        }
        for splash in &self.splashes {
            host.splash(splash.position, splash.intensity);
        }
        if let Some(report) = &self.destroyed {
            host.report_impact(report);
            host.destroy_part();
        }
        if self.recheck_splashed {
            host.recheck_splashed();
        }
    }
}

pub trait RigidBodyHost {
    fn apply_force_at_position(&mut self, force: Vec3, position: DVec3);
    fn set_linear_drag(&mut self, drag: f32);
}

pub trait PresentationHost {
    fn play_animation(&mut self, clip: &str, target: InflationState, animate: bool, duration: f32);
    fn play_sound(&mut self, clip: &str);
}

pub trait EffectsHost {
    fn splash(&mut self, position: DVec3, intensity: f32);
}

pub trait ReportHost {
    fn report_impact(&mut self, report: &ImpactReport);
    fn destroy_part(&mut self);
}

pub trait VesselHost {
    fn set_water_contact(&mut self, contact: bool);
    fn set_vessel_splashed(&mut self);
    fn recheck_splashed(&mut self);
    fn remove_native_buoyancy(&mut self);
}

/// Everything a tick result can be forwarded to.
pub trait BuoyancyHost:
    RigidBodyHost + PresentationHost + EffectsHost + ReportHost + VesselHost
{
}

impl<T> BuoyancyHost for T where
    T: RigidBodyHost + PresentationHost + EffectsHost + ReportHost + VesselHost
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
        force: Vec3,
    }

    impl RigidBodyHost for RecordingHost {
        fn apply_force_at_position(&mut self, force: Vec3, _position: DVec3) {
            self.force += force;
            self.calls.push("force".into());
        }
        fn set_linear_drag(&mut self, drag: f32) {
            self.calls.push(format!("drag {drag}"));
        }
    }

    impl PresentationHost for RecordingHost {
        fn play_animation(&mut self, clip: &str, target: InflationState, _animate: bool, _duration: f32) {
            self.calls.push(format!("animation {clip} {target:?}"));
        }
        fn play_sound(&mut self, clip: &str) {
            self.calls.push(format!("sound {clip}"));
        }
    }

    impl EffectsHost for RecordingHost {
        fn splash(&mut self, _position: DVec3, intensity: f32) {
            self.calls.push(format!("splash {intensity}"));
        }
    }

    impl ReportHost for RecordingHost {
        fn report_impact(&mut self, report: &ImpactReport) {
            self.calls.push(format!("report {}", report.location));
        }
        fn destroy_part(&mut self) {
            self.calls.push("destroy".into());
        }
    }

    impl VesselHost for RecordingHost {
        fn set_water_contact(&mut self, contact: bool) {
            self.calls.push(format!("contact {contact}"));
        }
        fn set_vessel_splashed(&mut self) {
            self.calls.push("splashed".into());
        }
        fn recheck_splashed(&mut self) {
            self.calls.push("recheck".into());
        }
        fn remove_native_buoyancy(&mut self) {
            self.calls.push("remove native".into());
        }
    }

    #[test]
    fn test_apply_forwards_every_directive() {
        let result = TickResult {
            effects: vec![InflationEffect::PlaySound("pop".into())],
            remove_native_buoyancy: true,
            forces: vec![
                AppliedForce {
                    force: Vec3::Y * 2.0,
                    position: DVec3::ZERO,
                },
                AppliedForce {
                    force: Vec3::Y * 3.0,
                    position: DVec3::X,
                },
            ],
            drag: Some(1.5),
            water_contact: Some(true),
            vessel_splashed: true,
            recheck_splashed: false,
            splashes: vec![SplashRequest {
                position: DVec3::ZERO,
                intensity: 0.5,
            }],
            destroyed: Some(ImpactReport {
                location: "ocean",
                reason: "test",
                speed: 200.0,
                tolerance: 125.0,
            }),
        };
        assert_eq!(result.total_force(), Vec3::Y * 5.0);

        let mut host = RecordingHost::default();
        result.apply(&mut host);
        assert_eq!(host.force, Vec3::Y * 5.0);
        assert_eq!(
            host.calls,
            vec![
                "sound pop",
                "remove native",
                "force",
                "force",
                "drag 1.5",
                "contact true",
                "splashed",
                "splash 0.5",
                "report ocean",
                "destroy",
            ]
        );
    }
}
