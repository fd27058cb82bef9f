//! MargaNav - Waypoint-following navigation for wheeled robots
//!
//! Drives a robot through a queue of target poses using dead-reckoned
//! feedback from three tracking encoders, with trapezoidal speed shaping
//! and heading blending between waypoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   main.rs / sim/                    │  ← Headless runner
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │               threads/ + state/                     │  ← Orchestration
//! │        (navigation loop, shared route state)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  navigation/                        │  ← Control law
//! │     (queue, speed profile, tick, Navigator API)     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    sensors/                         │  ← Pose estimation
//! │              (three-wheel odometry)                 │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      core/                          │  ← Foundation
//! │           (types, math, Driver capability)          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Capabilities
//!
//! The navigator needs two things from the host:
//!
//! - an [`Odometer`] reporting `(x, y, heading)`; [`ThreeWheelOdometry`]
//!   provides one over any [`EncoderSource`]
//! - a [`Driver`] that turns `(axial, lateral, yaw, speed)` into motion
//!
//! # Example
//!
//! ```no_run
//! use marga_nav::navigation::{Navigator, NavigatorConfig};
//! use marga_nav::sensors::{ThreeWheelGeometry, ThreeWheelOdometry};
//! use marga_nav::sim::{SimConfig, SimulatedDrive, SimulatedEncoders, SimulatedRobot};
//!
//! # fn main() -> marga_nav::Result<()> {
//! let geometry = ThreeWheelGeometry::default();
//! let robot = SimulatedRobot::new(SimConfig::default(), geometry)?.into_shared();
//! let odometry = ThreeWheelOdometry::new(geometry, SimulatedEncoders::new(robot.clone()))?;
//!
//! let navigator = Navigator::spawn(
//!     NavigatorConfig::default(),
//!     odometry,
//!     SimulatedDrive::new(robot.clone()),
//! )?;
//! navigator.add_waypoint(0.0, 24.0, 0.0);
//! navigator.add_waypoint(24.0, 24.0, 90.0);
//! navigator.wait_while_busy()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod navigation;
pub mod sensors;
pub mod sim;
pub mod state;
pub mod threads;
pub mod utils;

pub use crate::config::MargaConfig;
pub use crate::core::{DriveCommand, Driver, Pose2D, Waypoint};
pub use crate::error::{MargaError, Result};
pub use crate::navigation::{Navigator, NavigatorConfig};
pub use crate::sensors::{EncoderSource, EncoderTicks, Odometer, ThreeWheelGeometry, ThreeWheelOdometry};
