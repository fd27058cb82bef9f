//! Holonomic plant and the capability adapters that expose it.
//!
//! One [`SimulatedRobot`] is shared by a [`SimulatedDrive`] (the navigator's
//! driver), a [`SimulatedEncoders`] (feeding [`ThreeWheelOdometry`]) and,
//! optionally, a [`GroundTruthOdometer`]. Every `set_heading` call advances
//! the plant by one fixed time step, so simulated time follows the loop
//! rather than the wall clock.
//!
//! [`ThreeWheelOdometry`]: crate::sensors::ThreeWheelOdometry

use std::sync::Arc;

use parking_lot::Mutex;

use super::SimConfig;
use super::encoder_sim::EncoderSimulator;
use super::noise::NoiseGenerator;
use crate::core::Driver;
use crate::core::types::{DriveCommand, Pose2D};
use crate::error::{MargaError, Result};
use crate::sensors::{EncoderSource, EncoderTicks, Odometer, ThreeWheelGeometry};

/// Handle shared by the adapters.
pub type SharedRobot = Arc<Mutex<SimulatedRobot>>;

/// Simulated holonomic robot with three tracking encoders.
pub struct SimulatedRobot {
    config: SimConfig,
    pose: Pose2D,
    encoders: EncoderSimulator,
    /// Drive commands applied
    steps: u64,
    /// Stop-and-hold requests received
    holds: u64,
    last_command: Option<DriveCommand>,
}

impl SimulatedRobot {
    /// Create a robot at the configured start pose.
    ///
    /// # Errors
    /// Rejects invalid geometry and a non-positive or non-finite time step.
    pub fn new(config: SimConfig, geometry: ThreeWheelGeometry) -> Result<Self> {
        geometry.validate()?;
        if !config.dt.is_finite() || config.dt <= 0.0 {
            return Err(MargaError::Config(format!(
                "simulation dt must be positive, got {}",
                config.dt
            )));
        }

        let noise = NoiseGenerator::new(config.noise_seed);
        Ok(Self {
            pose: config.start_pose(),
            encoders: EncoderSimulator::new(geometry, config.slip_stddev, noise),
            config,
            steps: 0,
            holds: 0,
            last_command: None,
        })
    }

    /// Wrap for sharing between adapters.
    pub fn into_shared(self) -> SharedRobot {
        Arc::new(Mutex::new(self))
    }

    /// Apply one drive command for one time step.
    pub fn step(&mut self, command: DriveCommand) {
        let command = command.sanitized();
        let dt = self.config.dt;
        let linear = command.speed * self.config.max_linear_speed * dt;

        self.move_body(
            command.axial * linear,
            command.lateral * linear,
            command.yaw * self.config.max_angular_speed * dt,
        );
        self.steps += 1;
        self.last_command = Some(command);
    }

    /// Stop in place.
    pub fn hold(&mut self) {
        self.holds += 1;
        self.last_command = None;
    }

    /// Move the body by `forward`/`right` (robot frame) and rotate
    /// clockwise by `dh`, turning the encoders to match.
    pub fn move_body(&mut self, forward: f64, right: f64, dh: f64) {
        let mid = self.pose.theta + dh / 2.0;
        let (sin_m, cos_m) = mid.sin_cos();

        self.pose.x += forward * sin_m + right * cos_m;
        self.pose.y += forward * cos_m - right * sin_m;
        self.pose.theta += dh;

        self.encoders.update(forward, right, dh);
    }

    /// True pose of the plant.
    pub fn true_pose(&self) -> Pose2D {
        self.pose
    }

    /// Encoder counts as the hardware would report them.
    pub fn encoder_ticks(&self) -> EncoderTicks {
        self.encoders.raw_ticks()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn holds(&self) -> u64 {
        self.holds
    }

    /// Command applied by the last step, `None` after a hold.
    pub fn last_command(&self) -> Option<DriveCommand> {
        self.last_command
    }

    /// Simulated seconds elapsed while driving.
    pub fn elapsed(&self) -> f64 {
        self.steps as f64 * self.config.dt
    }
}

/// [`Driver`] over a simulated robot.
pub struct SimulatedDrive {
    robot: SharedRobot,
}

impl SimulatedDrive {
    pub fn new(robot: SharedRobot) -> Self {
        Self { robot }
    }
}

impl Driver for SimulatedDrive {
    fn set_heading(&mut self, command: DriveCommand) {
        self.robot.lock().step(command);
    }

    fn stop_and_hold(&mut self) {
        self.robot.lock().hold();
    }
}

/// [`EncoderSource`] over a simulated robot.
pub struct SimulatedEncoders {
    robot: SharedRobot,
}

impl SimulatedEncoders {
    pub fn new(robot: SharedRobot) -> Self {
        Self { robot }
    }
}

impl EncoderSource for SimulatedEncoders {
    fn read_ticks(&mut self) -> EncoderTicks {
        self.robot.lock().encoder_ticks()
    }
}

/// [`Odometer`] reporting the plant's true pose, optionally rebased.
pub struct GroundTruthOdometer {
    robot: SharedRobot,
    /// (true pose, reported pose) at the last rebase
    frame: Option<(Pose2D, Pose2D)>,
}

impl GroundTruthOdometer {
    pub fn new(robot: SharedRobot) -> Self {
        Self { robot, frame: None }
    }

    fn report(&self, truth: Pose2D) -> Pose2D {
        let Some((truth_at_reset, reported_at_reset)) = self.frame else {
            return truth;
        };

        // Rotate the displacement since the reset by the heading offset
        let offset = reported_at_reset.theta - truth_at_reset.theta;
        let (sin_o, cos_o) = offset.sin_cos();
        let dx = truth.x - truth_at_reset.x;
        let dy = truth.y - truth_at_reset.y;

        Pose2D::new(
            reported_at_reset.x + dx * cos_o + dy * sin_o,
            reported_at_reset.y - dx * sin_o + dy * cos_o,
            truth.theta + offset,
        )
    }
}

impl Odometer for GroundTruthOdometer {
    fn x(&mut self) -> f64 {
        self.pose().x
    }

    fn y(&mut self) -> f64 {
        self.pose().y
    }

    fn z(&mut self) -> f64 {
        self.pose().theta
    }

    fn reset_to(&mut self, x: f64, y: f64, z: f64) {
        let truth = self.robot.lock().true_pose();
        self.frame = Some((truth, Pose2D::new(x, y, z)));
    }

    fn pose(&mut self) -> Pose2D {
        let truth = self.robot.lock().true_pose();
        self.report(truth)
    }
}
