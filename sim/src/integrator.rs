//! Point-mass integration of the Rapier force/velocity components.
//!
//! The simulator does not step a Rapier pipeline. It integrates the same
//! components the buoyancy plugin writes, which keeps drop tests
//! deterministic and headless.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Damping, ExternalForce, Velocity};
use buoyancy::force::up_direction;
use buoyancy::plugin::FluidBody;

#[derive(Component, Clone, Copy, Debug)]
pub struct PointMass {
    pub mass: f32,
    /// Gravity acceleration towards the body center (m/s²).
    pub gravity: f32,
}

pub fn integrate_point_masses(
    time: Res<Time>,
    body: Res<FluidBody>,
    mut bodies: Query<(
        &PointMass,
        &mut Transform,
        &mut Velocity,
        &ExternalForce,
        &Damping,
    )>,
) {
    let dt = time.delta_secs();
    for (point_mass, mut transform, mut velocity, external, damping) in bodies.iter_mut() {
        let down = -up_direction(body.center, transform.translation.as_dvec3());
        let acceleration = external.force / point_mass.mass + down * point_mass.gravity;

        velocity.linvel += acceleration * dt;
        // Same damping model as Rapier
        velocity.linvel *= 1.0 / (1.0 + dt * damping.linear_damping);
        transform.translation += velocity.linvel * dt;
    }
}
