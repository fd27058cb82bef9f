//! Headless simulation of a holonomic robot with three-wheel odometry.
//!
//! Lets the navigator run end-to-end without hardware:
//!
//! ```text
//! Navigator ──set_heading──► SimulatedDrive ──► SimulatedRobot (true pose)
//!     ▲                                               │ encoder ticks
//!     └──── ThreeWheelOdometry ◄── SimulatedEncoders ◄┘
//! ```

mod encoder_sim;
mod noise;
mod robot;

pub use encoder_sim::EncoderSimulator;
pub use noise::NoiseGenerator;
pub use robot::{
    GroundTruthOdometer, SharedRobot, SimulatedDrive, SimulatedEncoders, SimulatedRobot,
};

use serde::Deserialize;

use crate::core::types::Pose2D;

/// Simulation parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct SimConfig {
    /// Simulated seconds per drive command (default: 0.02)
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Linear speed at full effort, units/s (default: 40.0)
    #[serde(default = "default_max_linear_speed")]
    pub max_linear_speed: f64,

    /// Rotation rate at full effort, rad/s (default: 3.0)
    #[serde(default = "default_max_angular_speed")]
    pub max_angular_speed: f64,

    /// Multiplicative encoder slip standard deviation (default: 0.0)
    #[serde(default)]
    pub slip_stddev: f64,

    /// Noise seed, 0 = random (default: 42)
    #[serde(default = "default_noise_seed")]
    pub noise_seed: u64,

    /// Start position, lateral
    #[serde(default)]
    pub start_x: f64,

    /// Start position, axial
    #[serde(default)]
    pub start_y: f64,

    /// Start heading in degrees
    #[serde(default)]
    pub start_heading_deg: f64,
}

fn default_dt() -> f64 {
    0.02
}
fn default_max_linear_speed() -> f64 {
    40.0
}
fn default_max_angular_speed() -> f64 {
    3.0
}
fn default_noise_seed() -> u64 {
    42
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_linear_speed: default_max_linear_speed(),
            max_angular_speed: default_max_angular_speed(),
            slip_stddev: 0.0,
            noise_seed: default_noise_seed(),
            start_x: 0.0,
            start_y: 0.0,
            start_heading_deg: 0.0,
        }
    }
}

impl SimConfig {
    /// Configured start pose with the heading in radians.
    pub fn start_pose(&self) -> Pose2D {
        Pose2D::new(
            self.start_x,
            self.start_y,
            self.start_heading_deg.to_radians(),
        )
    }
}
