//! Port interfaces for activity tracking
//!
//! These traits define the boundaries between the registry and whatever
//! drives or observes it.

use chrono::{DateTime, Utc};
use codetrail_domain::{ActivityEvent, ActivityState};
use uuid::Uuid;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Receives registry changes after the project lock is released.
///
/// All methods default to no-ops.
pub trait TrackingObserver: Send + Sync {
    fn project_started(&self, _project_id: Uuid, _name: &str, _at: DateTime<Utc>) {}

    fn project_stopped(&self, _project_id: Uuid, _name: &str, _at: DateTime<Utc>) {}

    fn event_recorded(&self, _event: &ActivityEvent) {}

    /// `previous` is closed; `current` is the new live state.
    fn state_changed(&self, _previous: &ActivityState, _current: &ActivityState) {}
}
