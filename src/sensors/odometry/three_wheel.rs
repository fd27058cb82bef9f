//! Three-encoder dead reckoning.
//!
//! Two parallel tracking wheels (left/right) measure forward travel and
//! rotation; a perpendicular middle wheel measures lateral travel. Every
//! read folds the tick deltas since the previous read into the pose.
//!
//! # Kinematics
//!
//! For tick deltas `l`, `r`, `m` and `k = 2π·radius / ticks_per_rotation`:
//!
//! ```text
//! dz = k·(r − l) / side_distance        rotation, counter-clockwise
//! dy = k·(l + r) / 2                    forward travel
//! dx = k·m − dz·middle_offset           lateral travel minus the part
//!                                       caused by rotating about the centre
//! ```
//!
//! Heading is clockwise positive, so it integrates as `θ −= dz`. The local
//! step is rotated into the global frame at the midpoint heading `θ + dz/2`,
//! which is exact for constant-curvature arcs up to second order.

use serde::Deserialize;
use std::f64::consts::PI;

use super::Odometer;
use crate::core::types::Pose2D;
use crate::error::{MargaError, Result};

/// Raw tick counts from the three tracking encoders.
///
/// Counts are treated as wrapping signed integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderTicks {
    pub left: i32,
    pub right: i32,
    pub middle: i32,
}

impl EncoderTicks {
    pub fn new(left: i32, right: i32, middle: i32) -> Self {
        Self {
            left,
            right,
            middle,
        }
    }
}

/// Source of raw encoder counts (hardware or simulation).
pub trait EncoderSource: Send {
    /// Current cumulative tick counts.
    fn read_ticks(&mut self) -> EncoderTicks;
}

impl<E: EncoderSource + ?Sized> EncoderSource for Box<E> {
    fn read_ticks(&mut self) -> EncoderTicks {
        (**self).read_ticks()
    }
}

/// Physical layout of the tracking wheels.
///
/// Units are whatever linear unit the route is expressed in (inches on the
/// reference robot).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThreeWheelGeometry {
    /// Tracking wheel radius
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,

    /// Encoder counts per full wheel rotation
    #[serde(default = "default_ticks_per_rotation")]
    pub ticks_per_rotation: f64,

    /// Distance between the left and right encoders
    #[serde(default = "default_side_encoder_distance")]
    pub side_encoder_distance: f64,

    /// Forward offset of the middle encoder from the centre of rotation
    /// (negative when it sits behind the centre)
    #[serde(default = "default_middle_encoder_offset")]
    pub middle_encoder_offset: f64,

    /// Invert the left encoder (must count up when pushed forward)
    #[serde(default)]
    pub flip_left: bool,

    /// Invert the right encoder (must count up when pushed forward)
    #[serde(default)]
    pub flip_right: bool,

    /// Invert the middle encoder (must count up when pushed right)
    #[serde(default)]
    pub flip_middle: bool,
}

fn default_wheel_radius() -> f64 {
    0.945
}
fn default_ticks_per_rotation() -> f64 {
    2000.0
}
fn default_side_encoder_distance() -> f64 {
    12.5
}
fn default_middle_encoder_offset() -> f64 {
    -6.0
}

impl Default for ThreeWheelGeometry {
    fn default() -> Self {
        Self {
            wheel_radius: default_wheel_radius(),
            ticks_per_rotation: default_ticks_per_rotation(),
            side_encoder_distance: default_side_encoder_distance(),
            middle_encoder_offset: default_middle_encoder_offset(),
            flip_left: false,
            flip_right: false,
            flip_middle: false,
        }
    }
}

impl ThreeWheelGeometry {
    /// Reject geometry that would divide by zero or poison the pose.
    pub fn validate(&self) -> Result<()> {
        if !self.wheel_radius.is_finite() || self.wheel_radius <= 0.0 {
            return Err(MargaError::InvalidGeometry(format!(
                "wheel_radius must be positive, got {}",
                self.wheel_radius
            )));
        }
        if !self.ticks_per_rotation.is_finite() || self.ticks_per_rotation <= 0.0 {
            return Err(MargaError::InvalidGeometry(format!(
                "ticks_per_rotation must be positive, got {}",
                self.ticks_per_rotation
            )));
        }
        if !self.side_encoder_distance.is_finite() || self.side_encoder_distance == 0.0 {
            return Err(MargaError::InvalidGeometry(format!(
                "side_encoder_distance must be non-zero, got {}",
                self.side_encoder_distance
            )));
        }
        if !self.middle_encoder_offset.is_finite() {
            return Err(MargaError::InvalidGeometry(format!(
                "middle_encoder_offset must be finite, got {}",
                self.middle_encoder_offset
            )));
        }
        Ok(())
    }

    /// Linear travel per encoder count.
    #[inline]
    pub fn inches_per_tick(&self) -> f64 {
        2.0 * PI * self.wheel_radius / self.ticks_per_rotation
    }

    /// Apply the configured polarity to raw counts.
    #[inline]
    pub fn apply_polarity(&self, raw: EncoderTicks) -> EncoderTicks {
        #[inline]
        fn flip(value: i32, flipped: bool) -> i32 {
            if flipped { value.wrapping_neg() } else { value }
        }
        EncoderTicks {
            left: flip(raw.left, self.flip_left),
            right: flip(raw.right, self.flip_right),
            middle: flip(raw.middle, self.flip_middle),
        }
    }
}

/// Dead-reckoning pose estimator over three tracking encoders.
///
/// The pose is recomputed lazily on every read rather than on a timer.
/// Deltas are taken against the last observed counts, so repeated reads
/// with unchanged encoders never double-count motion.
pub struct ThreeWheelOdometry<E: EncoderSource> {
    geometry: ThreeWheelGeometry,
    inches_per_tick: f64,
    source: E,
    /// Last polarity-corrected counts
    last: EncoderTicks,
    /// Current estimate in the caller's frame
    pose: Pose2D,
}

impl<E: EncoderSource> ThreeWheelOdometry<E> {
    /// Create an estimator at the origin.
    ///
    /// The current encoder counts become the zero reference, so counts
    /// accumulated before construction do not move the estimate.
    ///
    /// # Errors
    /// Returns [`MargaError::InvalidGeometry`] for a zero encoder separation,
    /// non-positive wheel radius or tick count, or non-finite constants.
    pub fn new(geometry: ThreeWheelGeometry, mut source: E) -> Result<Self> {
        geometry.validate()?;
        let last = geometry.apply_polarity(source.read_ticks());

        log::debug!(
            "ThreeWheelOdometry: {:.5} units/tick, side distance {:.3}, middle offset {:.3}",
            geometry.inches_per_tick(),
            geometry.side_encoder_distance,
            geometry.middle_encoder_offset
        );

        Ok(Self {
            inches_per_tick: geometry.inches_per_tick(),
            geometry,
            source,
            last,
            pose: Pose2D::identity(),
        })
    }

    /// Geometry this estimator was built with.
    pub fn geometry(&self) -> &ThreeWheelGeometry {
        &self.geometry
    }

    /// Mutable access to the encoder source.
    pub fn source_mut(&mut self) -> &mut E {
        &mut self.source
    }

    /// Read the encoders once and integrate the motion since the last read.
    pub fn update(&mut self) -> Pose2D {
        let ticks = self.geometry.apply_polarity(self.source.read_ticks());

        let delta = EncoderTicks {
            left: ticks.left.wrapping_sub(self.last.left),
            right: ticks.right.wrapping_sub(self.last.right),
            middle: ticks.middle.wrapping_sub(self.last.middle),
        };
        self.last = ticks;

        if delta == EncoderTicks::default() {
            return self.pose;
        }

        let (dx, dy, dz) = self.local_delta(delta);

        self.pose.theta -= dz;
        let mid_theta = self.pose.theta + dz / 2.0;
        let (sin_t, cos_t) = mid_theta.sin_cos();

        self.pose.x += dy * sin_t + dx * cos_t;
        self.pose.y += dy * cos_t - dx * sin_t;

        self.pose
    }

    /// Robot-frame motion `(lateral, forward, ccw rotation)` for tick deltas.
    fn local_delta(&self, delta: EncoderTicks) -> (f64, f64, f64) {
        let k = self.inches_per_tick;
        let left = delta.left as f64;
        let right = delta.right as f64;
        let middle = delta.middle as f64;

        let dz = k * (right - left) / self.geometry.side_encoder_distance;
        let dy = k * (left + right) / 2.0;
        let dx = k * middle - dz * self.geometry.middle_encoder_offset;

        (dx, dy, dz)
    }
}

impl<E: EncoderSource> Odometer for ThreeWheelOdometry<E> {
    fn x(&mut self) -> f64 {
        self.update().x
    }

    fn y(&mut self) -> f64 {
        self.update().y
    }

    fn z(&mut self) -> f64 {
        self.update().theta
    }

    fn reset_to(&mut self, x: f64, y: f64, z: f64) {
        // Fold pending ticks first so they are not replayed in the new frame
        self.update();
        self.pose = Pose2D::new(x, y, z);
        log::debug!(
            "ThreeWheelOdometry: reset to ({:.3}, {:.3}, {:.1}°)",
            x,
            y,
            z.to_degrees()
        );
    }

    fn pose(&mut self) -> Pose2D {
        self.update()
    }
}
