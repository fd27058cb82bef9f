//! Background threads.
//!
//! - `NavigationThread`: runs the waypoint-following loop until closed

mod navigation_thread;

pub use navigation_thread::{NavigationThread, run_tick};
