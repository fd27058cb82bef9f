//! Waypoint following: route queue, speed profile, control law and the
//! public [`Navigator`] handle.
//!
//! # Architecture
//!
//! ```text
//! caller threads                      navigation thread
//!     │ add / inject / skip / clear       │
//!     ▼                                   │ snapshot
//! WaypointQueue (locked) ◄────────────────┤
//!                                         │ evaluate (pure, unlocked)
//!                                         ▼
//!                        Advance / Hold / Drive(DriveCommand)
//!                                         │
//!                                         ▼
//!                                 Driver capability
//! ```
//!
//! # Key Types
//!
//! - [`Navigator`]: owns the loop thread; the API callers use
//! - [`WaypointQueue`]: route plus cursor with change tracking
//! - [`evaluate`]: one tick of the control law
//! - [`NavigatorConfig`]: speed limits, tolerances and loop pacing

mod controller;
mod profile;
mod queue;
mod tick;

pub use controller::Navigator;
pub use profile::{SpeedLimits, arrival_scale, profile_speed};
pub use queue::{QueueSnapshot, WaypointQueue};
pub use tick::{
    CORRECTION_OVERPOWER, PathCorrection, RouteProgress, Tick, TickAction, Tolerances, evaluate,
    yaw_effort,
};

use serde::Deserialize;
use std::time::Duration;

/// Delay between ticks while verbose diagnostics are on.
pub const DEBUG_TICK_DELAY: Duration = Duration::from_millis(500);

/// Navigator configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct NavigatorConfig {
    /// Minimum translation/rotation effort while moving (default: 0.1)
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Maximum translation/rotation effort (default: 1.0)
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Position tolerance at minimum speed, linear units (default: 1.0)
    #[serde(default = "default_distance_buffer")]
    pub distance_buffer: f64,

    /// Heading tolerance at minimum speed, degrees (default: 1.0)
    #[serde(default = "default_rotation_buffer_deg")]
    pub rotation_buffer_deg: f64,

    /// Distance-to-speed scaling of the speed profile (default: 0.05)
    #[serde(default = "default_speed_modifier")]
    pub speed_modifier: f64,

    /// Throttle the loop to one tick per 500 ms. The per-tick diagnostics
    /// are logged at `debug`; the binary lowers its default log filter to
    /// `debug` when this is set (see `MargaConfig::log_filter`).
    #[serde(default)]
    pub debug: bool,

    /// Fixed delay between ticks in milliseconds, 0 = free-running
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Steer back onto the line between waypoints (default: false)
    #[serde(default)]
    pub path_correction: bool,
}

fn default_min_speed() -> f64 {
    0.1
}
fn default_max_speed() -> f64 {
    1.0
}
fn default_distance_buffer() -> f64 {
    1.0
}
fn default_rotation_buffer_deg() -> f64 {
    1.0
}
fn default_speed_modifier() -> f64 {
    0.05
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            distance_buffer: default_distance_buffer(),
            rotation_buffer_deg: default_rotation_buffer_deg(),
            speed_modifier: default_speed_modifier(),
            debug: false,
            tick_interval_ms: 0,
            path_correction: false,
        }
    }
}

impl NavigatorConfig {
    /// Initial speed limits, clamped so that `0 <= min <= max <= 1`.
    pub fn speed_limits(&self) -> SpeedLimits {
        SpeedLimits::new(self.min_speed, self.max_speed)
    }

    /// Control-law tolerances with the rotation buffer in radians.
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            distance_buffer: self.distance_buffer,
            rotation_buffer: self.rotation_buffer_deg.to_radians(),
            speed_modifier: self.speed_modifier,
            path_correction: self.path_correction,
        }
    }

    /// Pause between ticks, if any.
    pub fn tick_delay(&self) -> Option<Duration> {
        if self.debug {
            Some(DEBUG_TICK_DELAY)
        } else if self.tick_interval_ms > 0 {
            Some(Duration::from_millis(self.tick_interval_ms))
        } else {
            None
        }
    }
}
