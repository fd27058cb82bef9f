//! State shared between the navigation thread and the caller-facing API.

mod shared;

pub use shared::{NavigationStatus, SharedState, SharedStateHandle};
