//! Pose estimation from relative motion sensors.
//!
//! - [`Odometer`]: capability the navigation loop reads its pose through
//! - [`ThreeWheelOdometry`]: dead reckoning from left/right/middle encoders

mod three_wheel;

pub use three_wheel::{EncoderSource, EncoderTicks, ThreeWheelGeometry, ThreeWheelOdometry};

use crate::core::types::Pose2D;

/// Position estimator consumed by the navigation loop.
///
/// Readings are in the caller's frame: lateral `x`, axial `y` and heading
/// `z` in radians (clockwise positive). Must be cheap enough to call every
/// tick.
pub trait Odometer: Send {
    /// Estimated lateral position.
    fn x(&mut self) -> f64;

    /// Estimated axial position.
    fn y(&mut self) -> f64;

    /// Estimated heading in radians.
    fn z(&mut self) -> f64;

    /// Rebase the estimate so the current position reads as `(x, y, z)`.
    fn reset_to(&mut self, x: f64, y: f64, z: f64);

    /// Full pose from a single logical reading.
    ///
    /// The default reads the three axes one after another. Estimators that
    /// integrate on read should override this to update once.
    fn pose(&mut self) -> Pose2D {
        let x = self.x();
        let y = self.y();
        let z = self.z();
        Pose2D::new(x, y, z)
    }
}

impl<O: Odometer + ?Sized> Odometer for Box<O> {
    fn x(&mut self) -> f64 {
        (**self).x()
    }

    fn y(&mut self) -> f64 {
        (**self).y()
    }

    fn z(&mut self) -> f64 {
        (**self).z()
    }

    fn reset_to(&mut self, x: f64, y: f64, z: f64) {
        (**self).reset_to(x, y, z)
    }

    fn pose(&mut self) -> Pose2D {
        (**self).pose()
    }
}
