//! Navigation Thread - continuous waypoint following.
//!
//! Each tick:
//! 1. Stop if cancelled
//! 2. Read the pose once and snapshot the route under the queue lock
//! 3. Release the lock
//! 4. Evaluate the control law
//! 5. Stop if cancelled meanwhile, without driving
//! 6. Apply: advance the cursor, stop and settle, or drive
//! 7. Publish status
//! 8. Optional pause (debug throttle or fixed interval), cut short by `close`

use std::thread::{self, JoinHandle, Thread};

use crate::core::Driver;
use crate::error::{MargaError, Result};
use crate::navigation::{NavigatorConfig, Tick, TickAction, Tolerances, evaluate};
use crate::state::{SharedState, SharedStateHandle};

/// Navigation thread handle.
pub struct NavigationThread {
    handle: JoinHandle<()>,
}

impl NavigationThread {
    /// Spawn the navigation thread.
    ///
    /// The driver moves into the thread; the odometer and route are reached
    /// through `shared_state`.
    pub fn spawn(
        config: NavigatorConfig,
        shared_state: SharedStateHandle,
        driver: Box<dyn Driver>,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("navigation".into())
            .spawn(move || {
                run_navigation_loop(config, shared_state, driver);
            })
            .map_err(|e| MargaError::Thread(format!("failed to spawn navigation thread: {}", e)))?;

        Ok(Self { handle })
    }

    /// Thread handle, used to cut a pause short.
    pub fn thread(&self) -> &Thread {
        self.handle.thread()
    }

    /// Wait for thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// Marks the loop stopped on every exit path, including a panic in the
/// odometer or driver, so waiters are released.
struct StopOnExit<'a>(&'a SharedState);

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Main navigation loop.
fn run_navigation_loop(
    config: NavigatorConfig,
    shared_state: SharedStateHandle,
    mut driver: Box<dyn Driver>,
) {
    let _stop_on_exit = StopOnExit(&shared_state);
    let tolerances = config.tolerances();
    let delay = config.tick_delay();

    match delay {
        Some(d) => log::info!("Navigation thread starting ({}ms between ticks)", d.as_millis()),
        None => log::info!("Navigation thread starting (free-running)"),
    }

    while shared_state.is_running() {
        if run_tick(&shared_state, &tolerances, driver.as_mut()).is_none() {
            break;
        }

        match delay {
            Some(d) => thread::park_timeout(d),
            None => thread::yield_now(),
        }
    }

    log::info!(
        "Navigation thread stopped after {} ticks",
        shared_state.tick_count()
    );
}

/// Run one tick against `state`, driving `driver`.
///
/// Returns `None` if the loop was cancelled before the tick was applied;
/// nothing is sent to the driver in that case.
pub fn run_tick(
    state: &SharedState,
    tolerances: &Tolerances,
    driver: &mut dyn Driver,
) -> Option<Tick> {
    if !state.is_running() {
        return None;
    }

    let (pose, route) = state.observe();
    let limits = state.speed_limits();

    let tick = evaluate(pose, &route, limits, tolerances);

    log::debug!(
        "Tick: pose ({:.2}, {:.2}, {:.1}°) target #{} ({:.2}, {:.2}, {:.1}°)",
        pose.x,
        pose.y,
        pose.theta.to_degrees(),
        route.index,
        tick.target.x(),
        tick.target.y(),
        tick.target.heading().to_degrees()
    );
    log::debug!(
        "Tick: to target {:.3}, rotation {:.2}°, to end {:.2}, from start {:.2}, speed {:.3}, on target {}, on rotation {}",
        tick.progress.distance_to_target,
        tick.progress.rotation_to_target.to_degrees(),
        tick.progress.distance_to_end,
        tick.progress.distance_from_start,
        tick.speed,
        tick.on_target,
        tick.on_rotation
    );
    if let Some(correction) = tick.correction {
        log::trace!(
            "Tick: path foot ({:.3}, {:.3}), off path {:.3}, correction heading {:.1}°",
            correction.foot_x,
            correction.foot_y,
            correction.off_path,
            correction.heading.to_degrees()
        );
    }

    if !state.is_running() {
        return None;
    }

    match tick.action {
        TickAction::Advance => {
            let advanced = state.lock_queue().increment_if_unchanged(route.revision);
            if advanced {
                log::info!(
                    "Waypoint {} reached at ({:.2}, {:.2}), moving on",
                    route.index,
                    pose.x,
                    pose.y
                );
                state.notify_route_changed();
            } else {
                log::debug!("Route changed during tick, not advancing");
            }
        }
        TickAction::Hold => {
            driver.stop_and_hold();
            let settled = state.lock_queue().settle(route.revision);
            if settled {
                log::info!(
                    "Route complete at ({:.2}, {:.2}, {:.1}°)",
                    pose.x,
                    pose.y,
                    pose.theta.to_degrees()
                );
                state.notify_route_changed();
            }
        }
        TickAction::Drive(command) => {
            log::debug!(
                "Drive: axial {:.3}, lateral {:.3}, yaw {:.3}, speed {:.3}",
                command.axial,
                command.lateral,
                command.yaw,
                command.speed
            );
            driver.set_heading(command);
        }
    }

    state.publish(&tick);
    Some(tick)
}
