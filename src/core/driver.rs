//! Driver capability: the motion output the navigator calls into.

use crate::core::types::DriveCommand;

/// Drivetrain abstraction consumed by the navigation loop.
///
/// Implementations turn a direction/yaw/speed request into motor output for
/// their specific drivetrain. The loop calls exactly one of the two methods
/// per tick, from the navigation thread only.
pub trait Driver: Send {
    /// Move along `command.axial`/`command.lateral` scaled by
    /// `command.speed`, rotating with `command.yaw`.
    ///
    /// Components arrive already sanitized: finite and inside their ranges.
    fn set_heading(&mut self, command: DriveCommand);

    /// Stop all motion and actively hold position.
    fn stop_and_hold(&mut self);
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn set_heading(&mut self, command: DriveCommand) {
        (**self).set_heading(command)
    }

    fn stop_and_hold(&mut self) {
        (**self).stop_and_hold()
    }
}
