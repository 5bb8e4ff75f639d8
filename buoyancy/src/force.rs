//! Buoyancy force model.
//!
//! Lift is a linear ramp over the configured depth range: nothing at the
//! surface, full force at `depth_range` below it and beyond. There is no
//! notion of displaced volume; the force is a scalar heuristic.

use bevy::math::{DVec3, Vec3};

use crate::constants::{SPLASH_INTENSITY_DIVISOR, SPLASH_MIN_SPEED, SPLASH_VISIBILITY_DISTANCE};

/// Signed depth of a point below the fluid surface of a spherical body.
/// Negative values are underwater.
///
/// Distances stay in `f64` until the final subtraction; planetary radii
/// would otherwise eat the whole `f32` mantissa.
#[inline]
pub fn submersion_depth(distance_from_center: f64, body_radius: f64, vertical_offset: f32) -> f32 {
    (distance_from_center - body_radius - vertical_offset as f64) as f32
}

/// Lift scale in `[0, 1]` for a given depth.
///
/// `depth_range` must be positive, which [`BuoyancyConfig::validate`](crate::config::BuoyancyConfig::validate)
/// guarantees for loaded configs.
#[inline]
pub fn lift_multiplier(depth: f32, depth_range: f32) -> f32 {
    (-depth.max(-depth_range)).max(0.0) / depth_range
}

/// Normalized direction from the body center to `position`.
#[inline]
pub fn up_direction(body_center: DVec3, position: DVec3) -> Vec3 {
    (position - body_center).normalize_or_zero().as_vec3()
}

/// Upward force for the given force magnitude and lift multiplier.
#[inline]
pub fn uplift(up: Vec3, current_force: f32, multiplier: f32) -> Vec3 {
    up * current_force * multiplier
}

/// Whether lift may be applied at this vertical speed.
///
/// A plain scalar comparison: a sinking vessel (negative speed) always
/// passes, a vessel rising at or above the cap never does.
#[inline]
pub fn vertical_speed_allows_lift(vertical_speed: f32, max_vertical_speed: f32) -> bool {
    vertical_speed < max_vertical_speed
}

/// Countdown between two splash checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashTimer {
    remaining: f32,
    cooldown: f32,
}

impl SplashTimer {
    /// Starts expired so the first submerged tick checks immediately.
    pub fn new(cooldown: f32) -> Self {
        Self {
            remaining: 0.0,
            cooldown,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Advances the timer. Returns `true` when it expired this tick, in which
    /// case it has already been reset to the full cooldown.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = self.cooldown;
            true
        } else {
            false
        }
    }
}

/// Splash gating: fast enough, not deep, and close enough to be seen.
pub fn should_splash(speed: f32, depth: f32, depth_range: f32, viewer_distance: f64) -> bool {
    speed > SPLASH_MIN_SPEED && depth > -depth_range && viewer_distance < SPLASH_VISIBILITY_DISTANCE
}

#[inline]
pub fn splash_intensity(speed: f32) -> f32 {
    speed / SPLASH_INTENSITY_DIVISOR
}
