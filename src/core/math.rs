//! Mathematical primitives for the navigation control law.
//!
//! Range clipping, planar distance and a sign function that is defined at zero.

/// Clip `value` into `[min, max]`.
///
/// Checks the lower bound first, then the upper bound. Unlike
/// [`f64::clamp`] this never panics: when `min > max` the upper bound wins,
/// and a `NaN` value collapses onto the bounds instead of propagating.
///
/// # Example
/// ```
/// use marga_nav::core::math::clip;
///
/// assert_eq!(clip(1.5, 0.0, 1.0), 1.0);
/// assert_eq!(clip(-0.5, 0.0, 1.0), 0.0);
/// assert_eq!(clip(0.25, 0.0, 1.0), 0.25);
/// ```
#[inline]
pub fn clip(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Straight-line distance between `(ax, ay)` and `(bx, by)`.
#[inline]
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (bx - ax).hypot(by - ay)
}

/// Sign of `value`: `1.0`, `-1.0`, or `0.0` for zero and `NaN`.
///
/// [`f64::signum`] returns `1.0` for `+0.0`, which would turn a zero yaw
/// error into a full minimum-effort rotation command.
#[inline]
pub fn signum_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Replace a non-finite value with `fallback`.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
