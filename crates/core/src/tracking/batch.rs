//! Records drained from a project for one flush cycle

use chrono::{DateTime, Utc};
use codetrail_domain::{ActivityEvent, ActivityState};
use uuid::Uuid;

/// Closed states and events of one project, owned by the outbound batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityBatch {
    pub batch_id: Uuid,
    pub project_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub states: Vec<ActivityState>,
    pub events: Vec<ActivityEvent>,
}

impl ActivityBatch {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.events.is_empty()
    }
}
