//! Fine-grained activity events

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::activity::{ActivityKind, CodeContext};
use super::state::clamped_span;

/// A point-in-time or short-span occurrence attached to a code location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    project_id: Uuid,
    kind: ActivityKind,
    context: CodeContext,
    created_at: DateTime<Utc>,
    duration: Duration,
}

impl ActivityEvent {
    pub fn new(
        project_id: Uuid,
        kind: ActivityKind,
        context: CodeContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self { project_id, kind, context, created_at: now, duration: Duration::zero() }
    }

    /// Instantaneous marker with no duration semantics.
    pub fn is_marker(&self) -> bool {
        self.kind == ActivityKind::Event
    }

    /// Repeated triggers accumulate into one span.
    pub fn can_span(&self) -> bool {
        matches!(self.kind, ActivityKind::DocumentEdit | ActivityKind::DocumentFocus)
    }

    /// Same kind in an equivalent code context.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.kind == other.kind && self.context.is_equivalent(&other.context)
    }

    /// Fresh event with the same project, kind and context starting at `now`.
    pub fn recreate(&self, now: DateTime<Utc>) -> Self {
        Self::new(self.project_id, self.kind, self.context.clone(), now)
    }

    pub fn close_duration(&mut self, at: DateTime<Utc>) {
        self.duration = clamped_span(self.created_at, at, self.kind);
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn context(&self) -> &CodeContext {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.created_at + self.duration
    }
}
