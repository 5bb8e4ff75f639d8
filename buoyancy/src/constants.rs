/// Collision speed above which a splash effect may be emitted.
pub const SPLASH_MIN_SPEED: f32 = 6.0;
/// Splashes farther than this from the viewer are skipped.
pub const SPLASH_VISIBILITY_DISTANCE: f64 = 500.0;
/// Splash intensity is `speed / SPLASH_INTENSITY_DIVISOR`.
pub const SPLASH_INTENSITY_DIVISOR: f32 = 50.0;
/// Linear drag restored once the part leaves the water.
pub const AIR_DRAG: f32 = 0.0;

/// Name of the animation clip driven by inflate/deflate.
pub const INFLATE_ANIMATION: &str = "inflate";
/// Seconds the inflate clip plays forward.
pub const INFLATE_ANIMATION_DURATION: f32 = 2.5;
/// Seconds the same clip takes to play backward on deflate.
pub const DEFLATE_ANIMATION_DURATION: f32 = 1.0;

/// Location string attached to splashdown crash reports.
pub const CRASH_LOCATION: &str = "ocean";
/// Reason string attached to splashdown crash reports.
pub const CRASH_REASON: &str = "Hit the water too hard";
