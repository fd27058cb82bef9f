//! Sensor processing: pose estimation from encoders.

pub mod odometry;

pub use odometry::{
    EncoderSource, EncoderTicks, Odometer, ThreeWheelGeometry, ThreeWheelOdometry,
};
