//! Exponential decay of residual motion.

use std::time::Duration;

use bevy_math::prelude::*;

/// The multiplier to apply to residual motion for one update.
///
/// Without a `reference_rate` this is `factor` itself, so decay advances once per update. With a
/// reference rate in Hz, `factor` is treated as the per-frame decay at that rate and is rescaled
/// to the actual `delta_time`, making inertia independent of the frame rate.
pub fn frame_factor(factor: f32, reference_rate: Option<f32>, delta_time: Duration) -> f32 {
    match reference_rate {
        Some(rate) if rate > 0.0 => factor.powf(delta_time.as_secs_f32() * rate),
        _ => factor,
    }
}

/// Decay `value` toward zero by `factor`, snapping to exactly zero once its magnitude is within
/// `dead_zone`. The snap keeps residuals from drifting into denormal range.
pub fn decay_toward_zero(value: Vec2, factor: f32, dead_zone: f32) -> Vec2 {
    if value.length() <= dead_zone {
        Vec2::ZERO
    } else {
        value * factor
    }
}
