//! Scheduling infrastructure for background tracking work
//!
//! The tracking scheduler drives the two periodic jobs of the agent:
//! - idle checks against the project registry
//! - flush cycles that ship drained activity
//!
//! Lifecycle is explicit (start/stop), the spawned task's join handle is
//! kept, and cancellation goes through a `CancellationToken`.

pub mod error;
pub mod tracking_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use tracking_scheduler::{SchedulerConfig, TrackingScheduler};
