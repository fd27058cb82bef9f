//! Core foundation: value types, math primitives and the driver capability.
//!
//! - [`types`]: `Pose2D`, `Waypoint`, `DriveCommand`
//! - [`math`]: clipping, distances, zero-safe sign
//! - [`driver::Driver`]: trait to implement for a drivetrain

pub mod driver;
pub mod math;
pub mod types;

pub use driver::Driver;
pub use types::{DriveCommand, Pose2D, Waypoint};
