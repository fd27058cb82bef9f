//! Trapezoidal speed shaping and speed-dependent arrival tolerance.
//!
//! ```text
//! speed
//!   max ┤      ┌──────────────┐
//!       │     /                \
//!   min ┤────/                  \────
//!       └──────────────────────────── route
//!        start                    end
//! ```
//!
//! The ramp near the start follows distance travelled, the ramp near the
//! end follows distance remaining. Both are scaled by the speed modifier.

use crate::core::math::clip;

/// Offset that holds the start of the ramp at minimum speed.
const ACCEL_OFFSET: f64 = 0.1;

/// Translation and rotation effort bounds.
///
/// Invariant: `0 <= min <= max <= 1`. Setters clamp into the valid range
/// instead of rejecting input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    min: f64,
    max: f64,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 1.0 }
    }
}

impl SpeedLimits {
    /// Build limits, clamping `max` into `[0, 1]` and then `min` into
    /// `[0, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        let clamped_max = clip(max, 0.0, 1.0);
        let clamped_min = clip(min, 0.0, clamped_max);
        if clamped_max != max || clamped_min != min {
            log::warn!(
                "Speed limits ({}, {}) clamped to ({}, {})",
                min,
                max,
                clamped_min,
                clamped_max
            );
        }
        Self {
            min: clamped_min,
            max: clamped_max,
        }
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Set the minimum, clipped into `[0, max]`. Returns the stored value.
    pub fn set_min(&mut self, value: f64) -> f64 {
        self.min = clip(value, 0.0, self.max);
        if self.min != value {
            log::warn!("Minimum speed {} clamped to {}", value, self.min);
        }
        self.min
    }

    /// Set the maximum, clipped into `[min, 1]`. Returns the stored value.
    pub fn set_max(&mut self, value: f64) -> f64 {
        self.max = clip(value, self.min, 1.0);
        if self.max != value {
            log::warn!("Maximum speed {} clamped to {}", value, self.max);
        }
        self.max
    }
}

/// Commanded speed for the current position along the route.
///
/// - `decel = clip(distance_to_end · modifier, min, max)`
/// - `accel = clip(decel − distance_from_start · modifier − 0.1, 0, decel − min)`
/// - `speed = decel − accel`
///
/// The result always lies in `[min, max]`.
pub fn profile_speed(
    distance_from_start: f64,
    distance_to_end: f64,
    speed_modifier: f64,
    limits: SpeedLimits,
) -> f64 {
    let decel = clip(distance_to_end * speed_modifier, limits.min, limits.max);
    let accel = clip(
        decel - distance_from_start * speed_modifier - ACCEL_OFFSET,
        0.0,
        decel - limits.min,
    );
    decel - accel
}

/// Tolerance multiplier for the arrival tests: `(1 − 2·min) + 2·speed`.
///
/// Equals one at minimum speed and grows with speed so a fast approach
/// does not overshoot and oscillate around the target.
#[inline]
pub fn arrival_scale(speed: f64, limits: SpeedLimits) -> f64 {
    (1.0 - 2.0 * limits.min) + 2.0 * speed
}
