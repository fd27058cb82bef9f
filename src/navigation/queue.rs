//! Ordered waypoint route with a traversal cursor.
//!
//! The queue is never empty: it is seeded with a resting waypoint and a
//! clear collapses it back to the waypoint currently targeted. The cursor
//! only moves forward, except on a clear, which resets it to zero.
//!
//! # Change tracking
//!
//! Two mechanisms record caller activity:
//!
//! - `updated`: set by every insertion and by [`WaypointQueue::clear`],
//!   cleared by every reading accessor. It answers "has the route been fed
//!   since it was last inspected".
//! - `revision`: bumped by every mutation. The navigation loop releases the
//!   queue lock while it computes a tick, then applies its decision through
//!   [`WaypointQueue::increment_if_unchanged`] / [`WaypointQueue::settle`],
//!   which refuse to act on a route that changed in between.

use crate::core::types::Waypoint;

/// Copy of the route taken by the navigation loop at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    /// Full route, start to end.
    pub waypoints: Vec<Waypoint>,
    /// Cursor at the time of the snapshot.
    pub index: usize,
    /// Queue revision at the time of the snapshot.
    pub revision: u64,
}

impl QueueSnapshot {
    /// Waypoint under the cursor.
    #[inline]
    pub fn current(&self) -> &Waypoint {
        &self.waypoints[self.index]
    }

    /// Waypoint before the cursor, if the cursor has moved.
    #[inline]
    pub fn previous(&self) -> Option<&Waypoint> {
        self.index.checked_sub(1).map(|i| &self.waypoints[i])
    }

    /// Whether the cursor sits on the final waypoint.
    #[inline]
    pub fn at_last(&self) -> bool {
        self.index + 1 >= self.waypoints.len()
    }
}

/// Waypoint route owned by the navigator.
#[derive(Debug, Clone)]
pub struct WaypointQueue {
    waypoints: Vec<Waypoint>,
    index: usize,
    updated: bool,
    revision: u64,
}

impl WaypointQueue {
    /// Create a queue resting on `seed`.
    pub fn new(seed: Waypoint) -> Self {
        Self {
            waypoints: vec![seed],
            index: 0,
            updated: false,
            revision: 0,
        }
    }

    /// Append a waypoint to the end of the route.
    pub fn add(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
        self.updated = true;
        self.revision += 1;
        log::debug!(
            "Queue: added ({:.2}, {:.2}, {:.1}°), size {}",
            waypoint.x(),
            waypoint.y(),
            waypoint.heading().to_degrees(),
            self.waypoints.len()
        );
    }

    /// Insert a waypoint under the cursor so it becomes the current target.
    ///
    /// The previously targeted waypoint follows it.
    pub fn inject(&mut self, waypoint: Waypoint) {
        self.waypoints.insert(self.index, waypoint);
        self.updated = true;
        self.revision += 1;
        log::debug!(
            "Queue: injected ({:.2}, {:.2}, {:.1}°) at index {}",
            waypoint.x(),
            waypoint.y(),
            waypoint.heading().to_degrees(),
            self.index
        );
    }

    /// Advance the cursor. No-op on the last waypoint.
    pub fn increment(&mut self) {
        if self.index + 1 < self.waypoints.len() {
            self.index += 1;
            self.revision += 1;
            log::debug!("Queue: incremented to index {}", self.index);
        } else {
            log::debug!("Queue: already at last waypoint, not incrementing");
        }
    }

    /// Collapse the route to the waypoint currently targeted.
    pub fn clear(&mut self) {
        let current = self.waypoints[self.index];
        self.waypoints.clear();
        self.waypoints.push(current);
        self.index = 0;
        self.updated = true;
        self.revision += 1;
        log::debug!("Queue: cleared");
    }

    /// Abandon the current waypoint: clear on the last one, otherwise move
    /// on to the next.
    pub fn skip(&mut self) {
        if self.index + 1 >= self.waypoints.len() {
            self.clear();
        } else {
            self.increment();
        }
    }

    /// Replace the sole resting waypoint. Ignored while a route is queued.
    pub(crate) fn reanchor(&mut self, waypoint: Waypoint) -> bool {
        if self.waypoints.len() != 1 {
            return false;
        }
        self.waypoints[0] = waypoint;
        self.revision += 1;
        true
    }

    /// Cursor position. Clears `updated`.
    pub fn index(&mut self) -> usize {
        self.updated = false;
        self.index
    }

    /// Number of waypoints in the route. Clears `updated`.
    pub fn size(&mut self) -> usize {
        self.updated = false;
        self.waypoints.len()
    }

    /// Waypoint under the cursor. Clears `updated`.
    pub fn current_waypoint(&mut self) -> Waypoint {
        self.updated = false;
        self.waypoints[self.index]
    }

    /// Waypoint at `index`, if any. Clears `updated`.
    pub fn waypoint(&mut self, index: usize) -> Option<Waypoint> {
        self.updated = false;
        self.waypoints.get(index).copied()
    }

    /// Copy the route for one loop tick. Clears `updated`.
    pub fn snapshot(&mut self) -> QueueSnapshot {
        self.updated = false;
        QueueSnapshot {
            waypoints: self.waypoints.clone(),
            index: self.index,
            revision: self.revision,
        }
    }

    /// Whether anything was fed since the last reading accessor.
    #[inline]
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// More than the single resting waypoint is queued.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.waypoints.len() > 1
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Route copy for observers. Does not touch `updated`.
    pub fn to_vec(&self) -> Vec<Waypoint> {
        self.waypoints.clone()
    }

    /// Advance only if the queue has not changed since `revision`.
    pub fn increment_if_unchanged(&mut self, revision: u64) -> bool {
        if self.revision != revision {
            return false;
        }
        self.increment();
        true
    }

    /// Collapse a finished route, unless it was fed or changed since
    /// `revision`. Returns whether the route was cleared.
    pub fn settle(&mut self, revision: u64) -> bool {
        if self.updated || self.revision != revision || self.waypoints.len() == 1 {
            return false;
        }
        self.clear();
        true
    }
}
