//! Caller-facing navigator handle.
//!
//! [`Navigator::spawn`] takes the two capabilities, seeds the route with
//! the current pose and starts the loop thread. Route and speed calls can
//! come from any thread; they take the relevant lock briefly and return.
//!
//! Headings cross this API in degrees and are stored in radians.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::Driver;
use crate::core::types::{Pose2D, Waypoint};
use crate::error::{MargaError, Result};
use crate::navigation::{NavigatorConfig, SpeedLimits, WaypointQueue};
use crate::sensors::Odometer;
use crate::state::{NavigationStatus, SharedState, SharedStateHandle};
use crate::threads::NavigationThread;

/// Re-check interval while blocked in [`Navigator::wait_while_busy`].
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Waypoint-following controller running on its own thread.
pub struct Navigator {
    shared_state: SharedStateHandle,
    thread: Option<NavigationThread>,
}

impl Navigator {
    /// Start navigating with the given capabilities.
    ///
    /// The route starts as a single resting waypoint at the odometer's
    /// current pose, so the robot holds still until fed.
    ///
    /// # Errors
    /// Returns [`MargaError::Thread`] if the loop thread cannot be spawned.
    pub fn spawn<O, D>(config: NavigatorConfig, odometer: O, driver: D) -> Result<Self>
    where
        O: Odometer + 'static,
        D: Driver + 'static,
    {
        let mut odometer: Box<dyn Odometer> = Box::new(odometer);
        let seed = Waypoint::at_pose(odometer.pose());
        let limits = config.speed_limits();

        log::info!(
            "Navigator: speed [{:.2}, {:.2}], distance buffer {:.2}, rotation buffer {:.2}°, modifier {:.3}",
            limits.min(),
            limits.max(),
            config.distance_buffer,
            config.rotation_buffer_deg,
            config.speed_modifier
        );

        let shared_state = Arc::new(SharedState::new(
            WaypointQueue::new(seed),
            limits,
            odometer,
        ));
        let thread = NavigationThread::spawn(config, Arc::clone(&shared_state), Box::new(driver))?;

        Ok(Self {
            shared_state,
            thread: Some(thread),
        })
    }

    /// Append a waypoint to the route.
    pub fn add_waypoint(&self, x: f64, y: f64, heading_deg: f64) {
        self.shared_state
            .lock_queue()
            .add(Waypoint::from_degrees(x, y, heading_deg));
        self.shared_state.notify_route_changed();
    }

    /// Redirect to a waypoint immediately, ahead of the current target.
    pub fn inject_waypoint(&self, x: f64, y: f64, heading_deg: f64) {
        self.shared_state
            .lock_queue()
            .inject(Waypoint::from_degrees(x, y, heading_deg));
        self.shared_state.notify_route_changed();
    }

    /// Abandon the current waypoint.
    pub fn skip_waypoint(&self) {
        self.shared_state.lock_queue().skip();
        self.shared_state.notify_route_changed();
    }

    /// Drop the rest of the route, keeping the current target.
    pub fn clear_waypoints(&self) {
        self.shared_state.lock_queue().clear();
        self.shared_state.notify_route_changed();
    }

    /// Declare the robot's current pose to be `(x, y, heading_deg)`.
    ///
    /// When idle the resting waypoint moves with it, so the robot does not
    /// drive back to where the old frame put it.
    pub fn reset_position(&self, x: f64, y: f64, heading_deg: f64) {
        let reanchored = self
            .shared_state
            .rebase(Pose2D::new(x, y, heading_deg.to_radians()));
        log::info!(
            "Navigator: position reset to ({:.2}, {:.2}, {:.1}°){}",
            x,
            y,
            heading_deg,
            if reanchored { ", resting waypoint moved" } else { "" }
        );
    }

    /// Set the minimum effort, clipped into `[0, max]`. Returns the stored
    /// value.
    pub fn set_min_speed(&self, value: f64) -> f64 {
        self.shared_state.lock_speed_limits().set_min(value)
    }

    /// Set the maximum effort, clipped into `[min, 1]`. Returns the stored
    /// value.
    pub fn set_max_speed(&self, value: f64) -> f64 {
        self.shared_state.lock_speed_limits().set_max(value)
    }

    pub fn speed_limits(&self) -> SpeedLimits {
        self.shared_state.speed_limits()
    }

    /// More than the single resting waypoint is queued.
    pub fn is_busy(&self) -> bool {
        self.shared_state.lock_queue().is_busy()
    }

    /// Whether the loop thread is still running.
    pub fn is_running(&self) -> bool {
        self.shared_state.is_running()
    }

    /// Block until the route is finished.
    ///
    /// # Errors
    /// Returns [`MargaError::Closed`] if the loop stops while the route is
    /// still busy.
    pub fn wait_while_busy(&self) -> Result<()> {
        let mut queue = self.shared_state.lock_queue();
        while queue.is_busy() {
            if !self.shared_state.is_running() {
                return Err(MargaError::Closed);
            }
            self.shared_state.wait_route_changed(&mut queue, WAIT_POLL);
        }
        Ok(())
    }

    /// Like [`Navigator::wait_while_busy`], giving up after `timeout`.
    ///
    /// Returns `Ok(true)` once idle, `Ok(false)` on timeout.
    pub fn wait_while_busy_timeout(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared_state.lock_queue();
        while queue.is_busy() {
            if !self.shared_state.is_running() {
                return Err(MargaError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            self.shared_state
                .wait_route_changed(&mut queue, WAIT_POLL.min(deadline - now));
        }
        Ok(true)
    }

    /// Latest tick outcome.
    pub fn status(&self) -> NavigationStatus {
        self.shared_state.status()
    }

    /// Copy of the route, start to end.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.shared_state.lock_queue().to_vec()
    }

    /// Current estimated pose, read through the shared odometer.
    pub fn pose(&self) -> Pose2D {
        self.shared_state.read_pose()
    }

    /// Stop the loop and wait for it to exit. Idempotent.
    pub fn close(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shared_state.stop();
        thread.thread().unpark();

        if let Err(e) = thread.join() {
            log::error!("Navigation thread panicked: {:?}", e);
        }
        log::info!("Navigator closed");
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.close();
    }
}
