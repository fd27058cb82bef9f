//! One evaluation of the waypoint-following control law.
//!
//! [`evaluate`] is a pure function of the estimated pose, a snapshot of the
//! route, the speed limits and the fixed tolerances. It never touches the
//! queue or the drivetrain; the navigation thread applies the returned
//! [`TickAction`].
//!
//! # Control law
//!
//! ```text
//! distance errors ──► speed profile ──► arrival scale ──► on_target / on_rotation
//!                                                              │
//!        ┌──────────────── both, not last ◄────────────────────┤
//!        ▼                                                     │
//!     Advance          both, last ──► Hold                     │
//!                                                              ▼
//!                      otherwise ──► Drive(axial, lateral, yaw, speed)
//! ```
//!
//! Drive direction is the bearing to the target relative to the current
//! heading. The yaw target blends from the previous waypoint's heading to
//! the current one as the leg progresses.

use std::f64::consts::PI;

use crate::core::math::{clip, distance, signum_or_zero};
use crate::core::types::{DriveCommand, Pose2D, Waypoint};
use crate::navigation::profile::{SpeedLimits, arrival_scale, profile_speed};
use crate::navigation::queue::QueueSnapshot;

/// Weight of the pull back onto the path line relative to the pull toward
/// the target.
pub const CORRECTION_OVERPOWER: f64 = 5.0;

/// Heading error that saturates the yaw effort.
const YAW_SATURATION_ERROR: f64 = PI / 5.0;

/// Legs shorter than this have no direction to project onto.
const MIN_LEG_LENGTH: f64 = 1e-9;

/// Fixed control-law parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Position tolerance at minimum speed (linear units).
    pub distance_buffer: f64,
    /// Heading tolerance at minimum speed (radians).
    pub rotation_buffer: f64,
    /// Distance-to-speed scaling for the speed profile.
    pub speed_modifier: f64,
    /// Steer along the path-correction heading instead of straight at the
    /// target.
    pub path_correction: bool,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            distance_buffer: 1.0,
            rotation_buffer: 1.0_f64.to_radians(),
            speed_modifier: 0.05,
            path_correction: false,
        }
    }
}

/// Distance and rotation errors for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RouteProgress {
    /// Straight-line distance to the current waypoint.
    pub distance_to_target: f64,
    /// Absolute heading difference to the current waypoint (not wrapped).
    pub rotation_to_target: f64,
    /// Distance to the current waypoint plus every remaining leg.
    pub distance_to_end: f64,
    /// Distance from the previous waypoint; zero on the first leg.
    pub distance_from_last: f64,
    /// Completed legs plus `distance_from_last`.
    pub distance_from_start: f64,
}

impl RouteProgress {
    /// Measure the route from `pose`.
    pub fn measure(pose: &Pose2D, route: &QueueSnapshot) -> Self {
        let target = route.current();
        let waypoints = &route.waypoints;

        let distance_to_target = distance(pose.x, pose.y, target.x(), target.y());
        let rotation_to_target = (target.heading() - pose.theta).abs();

        let remaining: f64 = (route.index + 1..waypoints.len())
            .map(|i| waypoints[i].distance_to(&waypoints[i - 1]))
            .sum();

        let distance_from_last = route
            .previous()
            .map(|last| distance(pose.x, pose.y, last.x(), last.y()))
            .unwrap_or(0.0);

        let completed: f64 = (1..route.index)
            .map(|i| waypoints[i].distance_to(&waypoints[i - 1]))
            .sum();

        Self {
            distance_to_target,
            rotation_to_target,
            distance_to_end: distance_to_target + remaining,
            distance_from_last,
            distance_from_start: completed + distance_from_last,
        }
    }
}

/// Robot position relative to the line through the current leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCorrection {
    /// Foot of the perpendicular from the robot onto the leg line.
    pub foot_x: f64,
    pub foot_y: f64,
    /// Distance from the robot to the leg line.
    pub off_path: f64,
    /// Drive heading (robot frame) that pulls back onto the line while
    /// heading for the target.
    pub heading: f64,
}

impl PathCorrection {
    /// Project `pose` onto the line `last → target`.
    ///
    /// Returns `None` for a zero-length leg or a non-finite pose.
    pub fn compute(pose: &Pose2D, last: &Waypoint, target: &Waypoint) -> Option<Self> {
        let leg_x = target.x() - last.x();
        let leg_y = target.y() - last.y();
        let leg_sq = leg_x * leg_x + leg_y * leg_y;
        if !leg_sq.is_finite() || leg_sq < MIN_LEG_LENGTH * MIN_LEG_LENGTH {
            return None;
        }

        let t = ((pose.x - last.x()) * leg_x + (pose.y - last.y()) * leg_y) / leg_sq;
        let foot_x = last.x() + t * leg_x;
        let foot_y = last.y() + t * leg_y;

        let correction_x = (foot_x - pose.x) * CORRECTION_OVERPOWER + (target.x() - pose.x);
        let correction_y = (foot_y - pose.y) * CORRECTION_OVERPOWER + (target.y() - pose.y);
        let heading = correction_x.atan2(correction_y) - pose.theta;

        let correction = Self {
            foot_x,
            foot_y,
            off_path: distance(pose.x, pose.y, foot_x, foot_y),
            heading,
        };
        (correction.off_path.is_finite() && heading.is_finite()).then_some(correction)
    }
}

/// What the navigation thread should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickAction {
    /// Intermediate waypoint reached: move the cursor on, no drive output.
    Advance,
    /// Final waypoint reached: stop and hold, collapse the route if idle.
    Hold,
    /// Keep moving.
    Drive(DriveCommand),
}

impl TickAction {
    pub fn name(&self) -> &'static str {
        match self {
            TickAction::Advance => "advance",
            TickAction::Hold => "hold",
            TickAction::Drive(_) => "drive",
        }
    }
}

/// Result of one control-law evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub pose: Pose2D,
    pub target: Waypoint,
    pub progress: RouteProgress,
    pub speed: f64,
    pub on_target: bool,
    pub on_rotation: bool,
    /// Bearing to the target in the robot frame.
    pub target_heading: f64,
    /// Heading the yaw controller is steering toward.
    pub target_yaw: f64,
    pub correction: Option<PathCorrection>,
    pub action: TickAction,
}

/// Evaluate the control law for one tick.
pub fn evaluate(
    pose: Pose2D,
    route: &QueueSnapshot,
    limits: SpeedLimits,
    tolerances: &Tolerances,
) -> Tick {
    let target = *route.current();
    let progress = RouteProgress::measure(&pose, route);

    let speed = profile_speed(
        progress.distance_from_start,
        progress.distance_to_end,
        tolerances.speed_modifier,
        limits,
    );

    let scale = arrival_scale(speed, limits);
    let on_target = progress.distance_to_target <= tolerances.distance_buffer * scale;
    let on_rotation = progress.rotation_to_target <= tolerances.rotation_buffer * scale;

    let target_heading = (target.x() - pose.x).atan2(target.y() - pose.y) - pose.theta;

    let (target_yaw, correction) = match route.previous() {
        Some(last) => (
            blended_yaw(last.heading(), target.heading(), &progress),
            PathCorrection::compute(&pose, last, &target),
        ),
        None => (target.heading(), None),
    };

    let mut tick = Tick {
        pose,
        target,
        progress,
        speed,
        on_target,
        on_rotation,
        target_heading,
        target_yaw,
        correction,
        action: TickAction::Hold,
    };

    if on_target && on_rotation {
        if !route.at_last() {
            tick.action = TickAction::Advance;
        }
        return tick;
    }

    let drive_heading = match correction {
        Some(c) if tolerances.path_correction => c.heading,
        _ => target_heading,
    };

    let (lateral, axial) = drive_heading.sin_cos();
    let yaw = yaw_effort(target_yaw, pose.theta, limits);

    let command = DriveCommand::new(
        if on_target { 0.0 } else { axial },
        if on_target { 0.0 } else { lateral },
        if on_rotation { 0.0 } else { yaw },
        speed,
    );

    if !command.is_finite() {
        log::warn!(
            "Non-finite drive command {:?} at pose {:?}, replacing with zeros",
            command,
            pose
        );
    }
    tick.action = TickAction::Drive(command.sanitized());
    tick
}

/// Yaw target between the previous and current waypoint headings.
///
/// Interpolates by `distance_from_last / distance_to_target` and stays
/// between the two headings whichever is larger.
fn blended_yaw(last_heading: f64, target_heading: f64, progress: &RouteProgress) -> f64 {
    let ratio = if progress.distance_to_target > MIN_LEG_LENGTH {
        progress.distance_from_last / progress.distance_to_target
    } else {
        1.0
    };
    let ratio = if ratio.is_finite() { ratio } else { 1.0 };

    let lo = last_heading.min(target_heading);
    let hi = last_heading.max(target_heading);
    clip(
        last_heading + (target_heading - last_heading) * ratio,
        lo,
        hi,
    )
}

/// Rotation effort toward `target_yaw`.
///
/// Proportional up to [`YAW_SATURATION_ERROR`], with magnitude kept inside
/// the speed limits so small errors still move the robot. Zero error gives
/// zero effort.
pub fn yaw_effort(target_yaw: f64, heading: f64, limits: SpeedLimits) -> f64 {
    let error = (target_yaw - heading) / YAW_SATURATION_ERROR;
    if error.is_nan() {
        return 0.0;
    }

    let raw = clip(error, -1.0, 1.0);
    let sign = signum_or_zero(raw);
    if sign == 0.0 {
        return 0.0;
    }
    sign * clip(raw.abs(), limits.min(), limits.max())
}
