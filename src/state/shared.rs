//! Thread-safe state shared between the navigation thread and callers.
//!
//! - Navigation thread: reads the pose, snapshots the route, publishes status
//! - Caller threads: mutate the route and speed limits, read status, wait
//!
//! The only nested locking is queue then odometer, in
//! [`SharedState::observe`] and [`SharedState::rebase`], so a tick never
//! pairs a pose from one frame with a route anchored in another. Every
//! route mutation is followed by [`SharedState::notify_route_changed`] so
//! waiters re-check promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};

use crate::core::types::{Pose2D, Waypoint};
use crate::navigation::{QueueSnapshot, RouteProgress, SpeedLimits, Tick, WaypointQueue};
use crate::sensors::Odometer;

/// Outcome of the most recent tick, for observers.
#[derive(Debug, Clone, Default)]
pub struct NavigationStatus {
    /// Pose the tick was evaluated at.
    pub pose: Pose2D,
    /// Waypoint targeted by the tick.
    pub target: Option<Waypoint>,
    /// Distance and rotation errors.
    pub progress: RouteProgress,
    /// Profiled speed.
    pub speed: f64,
    pub on_target: bool,
    pub on_rotation: bool,
    /// `advance`, `hold` or `drive`.
    pub action: &'static str,
    /// Completed ticks since the loop started.
    pub ticks: u64,
}

/// State shared by the navigator handle and its loop thread.
pub struct SharedState {
    queue: Mutex<WaypointQueue>,
    route_changed: Condvar,
    limits: Mutex<SpeedLimits>,
    odometer: Mutex<Box<dyn Odometer>>,
    status: RwLock<NavigationStatus>,
    running: AtomicBool,
    ticks: AtomicU64,
}

/// Handle type passed to threads.
pub type SharedStateHandle = Arc<SharedState>;

impl SharedState {
    pub fn new(queue: WaypointQueue, limits: SpeedLimits, odometer: Box<dyn Odometer>) -> Self {
        Self {
            queue: Mutex::new(queue),
            route_changed: Condvar::new(),
            limits: Mutex::new(limits),
            odometer: Mutex::new(odometer),
            status: RwLock::new(NavigationStatus::default()),
            running: AtomicBool::new(true),
            ticks: AtomicU64::new(0),
        }
    }

    /// Lock the route.
    pub fn lock_queue(&self) -> MutexGuard<'_, WaypointQueue> {
        self.queue.lock()
    }

    /// Wake threads blocked in [`SharedState::wait_route_changed`].
    pub fn notify_route_changed(&self) {
        self.route_changed.notify_all();
    }

    /// Release `queue`, wait for a route change or `timeout`, re-lock.
    pub fn wait_route_changed(&self, queue: &mut MutexGuard<'_, WaypointQueue>, timeout: Duration) {
        let _ = self.route_changed.wait_for(queue, timeout);
    }

    /// Current speed limits.
    pub fn speed_limits(&self) -> SpeedLimits {
        *self.limits.lock()
    }

    /// Lock the speed limits for update.
    pub fn lock_speed_limits(&self) -> MutexGuard<'_, SpeedLimits> {
        self.limits.lock()
    }

    /// One combined odometer reading.
    pub fn read_pose(&self) -> Pose2D {
        self.odometer.lock().pose()
    }

    /// Read the pose and snapshot the route as one observation.
    ///
    /// The queue lock is held across the odometer read, so a concurrent
    /// [`SharedState::rebase`] lands entirely before or after it.
    pub fn observe(&self) -> (Pose2D, QueueSnapshot) {
        let mut queue = self.queue.lock();
        let pose = self.odometer.lock().pose();
        (pose, queue.snapshot())
    }

    /// Declare the current position to be `pose`.
    ///
    /// When idle the resting waypoint moves with it. Returns whether it did.
    pub fn rebase(&self, pose: Pose2D) -> bool {
        let reanchored = {
            let mut queue = self.queue.lock();
            self.odometer.lock().reset_to(pose.x, pose.y, pose.theta);
            queue.reanchor(Waypoint::at_pose(pose))
        };
        if reanchored {
            self.notify_route_changed();
        }
        reanchored
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the loop to stop and wake any waiters.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.notify_route_changed();
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Record a completed tick.
    pub fn publish(&self, tick: &Tick) {
        let ticks = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let mut status = self.status.write();
        status.pose = tick.pose;
        status.target = Some(tick.target);
        status.progress = tick.progress;
        status.speed = tick.speed;
        status.on_target = tick.on_target;
        status.on_rotation = tick.on_rotation;
        status.action = tick.action.name();
        status.ticks = ticks;
    }

    /// Copy of the latest status.
    pub fn status(&self) -> NavigationStatus {
        self.status.read().clone()
    }
}
