//! Pose, waypoint and drive command types.
//!
//! Frame convention used throughout the crate:
//! - `y` is the robot's forward (axial) axis at heading zero
//! - `x` is the robot's right (lateral) axis at heading zero
//! - heading grows clockwise, so a bearing of `atan2(dx, dy)` and a heading
//!   share the same zero and direction

use crate::core::math::{clip, finite_or};

/// Robot pose in the plane.
///
/// Position in linear units (whatever the odometry geometry is expressed
/// in) and heading in radians. Heading is left unwrapped: the
/// control law compares absolute heading values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    /// Lateral position
    pub x: f64,
    /// Axial position
    pub y: f64,
    /// Heading in radians, clockwise positive, unwrapped
    pub theta: f64,
}

impl Pose2D {
    /// Create a new pose.
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    /// Pose at the origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Straight-line distance to another pose (heading ignored).
    #[inline]
    pub fn distance(&self, other: &Pose2D) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A target pose the robot should reach.
///
/// Immutable once constructed; the queue hands out copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    x: f64,
    y: f64,
    heading: f64,
}

impl Waypoint {
    /// Create a waypoint with heading in radians.
    #[inline]
    pub fn new(x: f64, y: f64, heading_rad: f64) -> Self {
        Self {
            x,
            y,
            heading: heading_rad,
        }
    }

    /// Create a waypoint with heading in degrees (caller-facing unit).
    #[inline]
    pub fn from_degrees(x: f64, y: f64, heading_deg: f64) -> Self {
        Self::new(x, y, heading_deg.to_radians())
    }

    /// Waypoint located at a pose.
    #[inline]
    pub fn at_pose(pose: Pose2D) -> Self {
        Self::new(pose.x, pose.y, pose.theta)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Target heading in radians.
    #[inline]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Straight-line distance to another waypoint.
    #[inline]
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// The waypoint expressed as a pose.
    #[inline]
    pub fn as_pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.heading)
    }
}

/// A single motion request for the drivetrain.
///
/// `axial`/`lateral` form a unit direction in the robot frame that the
/// driver scales by `speed`; `yaw` is an absolute rotation effort.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    /// Forward component, [-1, 1]
    pub axial: f64,
    /// Rightward component, [-1, 1]
    pub lateral: f64,
    /// Clockwise rotation effort, [-1, 1]
    pub yaw: f64,
    /// Translation speed scale, [0, 1]
    pub speed: f64,
}

impl DriveCommand {
    /// Create a new drive command.
    pub fn new(axial: f64, lateral: f64, yaw: f64, speed: f64) -> Self {
        Self {
            axial,
            lateral,
            yaw,
            speed,
        }
    }

    /// Whether every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.axial.is_finite()
            && self.lateral.is_finite()
            && self.yaw.is_finite()
            && self.speed.is_finite()
    }

    /// Copy with non-finite components zeroed and every component clipped
    /// into its documented range.
    pub fn sanitized(&self) -> Self {
        Self {
            axial: clip(finite_or(self.axial, 0.0), -1.0, 1.0),
            lateral: clip(finite_or(self.lateral, 0.0), -1.0, 1.0),
            yaw: clip(finite_or(self.yaw, 0.0), -1.0, 1.0),
            speed: clip(finite_or(self.speed, 0.0), 0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_pose_heading_not_wrapped() {
        let pose = Pose2D::new(0.0, 0.0, 7.0);
        assert_relative_eq!(pose.theta, 7.0);
    }

    #[test]
    fn test_waypoint_from_degrees() {
        let wp = Waypoint::from_degrees(1.0, 2.0, 90.0);
        assert_relative_eq!(wp.heading(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(wp.x(), 1.0);
        assert_relative_eq!(wp.y(), 2.0);
    }

    #[test]
    fn test_waypoint_distance() {
        let a = Waypoint::new(0.0, 0.0, 0.0);
        let b = Waypoint::new(6.0, 8.0, 1.0);
        assert_relative_eq!(a.distance_to(&b), 10.0);
    }

    #[test]
    fn test_sanitized_zeroes_non_finite() {
        let cmd = DriveCommand::new(f64::NAN, f64::INFINITY, 0.5, 0.3);
        assert!(!cmd.is_finite());

        let clean = cmd.sanitized();
        assert!(clean.is_finite());
        assert_eq!(clean.axial, 0.0);
        assert_eq!(clean.lateral, 0.0);
        assert_relative_eq!(clean.yaw, 0.5);
        assert_relative_eq!(clean.speed, 0.3);
    }

    #[test]
    fn test_sanitized_clips_ranges() {
        let clean = DriveCommand::new(2.0, -2.0, -1.5, 1.5).sanitized();
        assert_eq!(clean.axial, 1.0);
        assert_eq!(clean.lateral, -1.0);
        assert_eq!(clean.yaw, -1.0);
        assert_eq!(clean.speed, 1.0);
    }
}
