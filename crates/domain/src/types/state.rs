//! Activity states
//!
//! A state is a contiguous span of one activity kind in one project. The
//! idle and null sentinels are variants of the same type rather than
//! subtypes, so every lifecycle method works on any state.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::activity::ActivityKind;
use crate::errors::CodetrailError;

/// Variant-specific data of an [`ActivityState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVariant {
    Regular,
    /// Developer away; `last_activity_at` moves with qualifying input while
    /// the span stays open.
    Idle { last_activity_at: DateTime<Utc> },
    /// Placeholder asserting no tracked activity in this project.
    Null,
}

/// A span of one activity kind within one project.
///
/// Equality is project + kind, so two spans of the same activity compare
/// equal regardless of when they started.
#[derive(Debug, Clone)]
pub struct ActivityState {
    project_id: Uuid,
    kind: ActivityKind,
    created_at: DateTime<Utc>,
    duration: Duration,
    variant: StateVariant,
}

impl ActivityState {
    fn open(project_id: Uuid, kind: ActivityKind, now: DateTime<Utc>, variant: StateVariant) -> Self {
        Self { project_id, kind, created_at: now, duration: Duration::zero(), variant }
    }

    pub fn create_debug_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::Debugging, now, StateVariant::Regular)
    }

    /// Coding state.
    pub fn create_design_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::Coding, now, StateVariant::Regular)
    }

    pub fn create_build_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::Building, now, StateVariant::Regular)
    }

    pub fn create_system_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::System, now, StateVariant::Regular)
    }

    /// Idle state whose last activity is its own start.
    pub fn create_idle_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::Idle, now, StateVariant::Idle { last_activity_at: now })
    }

    pub fn create_null_state(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::open(project_id, ActivityKind::None, now, StateVariant::Null)
    }

    /// Dispatch to the constructor for `kind`.
    ///
    /// # Errors
    /// Returns `CodetrailError::UnsupportedKind` for event-only kinds.
    pub fn for_kind(
        kind: ActivityKind,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, CodetrailError> {
        match kind {
            ActivityKind::Coding => Ok(Self::create_design_state(project_id, now)),
            ActivityKind::Debugging => Ok(Self::create_debug_state(project_id, now)),
            ActivityKind::Building => Ok(Self::create_build_state(project_id, now)),
            ActivityKind::System => Ok(Self::create_system_state(project_id, now)),
            ActivityKind::Idle => Ok(Self::create_idle_state(project_id, now)),
            ActivityKind::None => Ok(Self::create_null_state(project_id, now)),
            ActivityKind::Event | ActivityKind::DocumentEdit | ActivityKind::DocumentFocus => {
                Err(CodetrailError::UnsupportedKind(format!("{kind} is not a state kind")))
            }
        }
    }

    /// Fresh open state of the same project, kind and variant starting at `now`.
    pub fn recreate(&self, now: DateTime<Utc>) -> Self {
        let variant = match self.variant {
            StateVariant::Idle { .. } => StateVariant::Idle { last_activity_at: now },
            other => other,
        };
        Self::open(self.project_id, self.kind, now, variant)
    }

    /// Terminate the span at `at`.
    ///
    /// A close instant before the start (clock skew) yields a zero duration.
    pub fn close_duration(&mut self, at: DateTime<Utc>) {
        self.duration = clamped_span(self.created_at, at, self.kind);
    }

    /// Record qualifying input on an idle state. No-op for other variants.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if let StateVariant::Idle { last_activity_at } = &mut self.variant {
            if at > *last_activity_at {
                *last_activity_at = at;
            }
        }
    }

    pub fn can_expand(&self) -> bool {
        self.kind.can_expand()
    }

    pub fn can_shrink(&self) -> bool {
        self.kind.can_shrink()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.variant, StateVariant::Null)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.variant, StateVariant::Idle { .. })
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    /// Kind reported to the remote timeline. Null placeholders are recorded
    /// there as idle time.
    pub fn wire_kind(&self) -> ActivityKind {
        match self.variant {
            StateVariant::Null => ActivityKind::Idle,
            _ => self.kind,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Authoritative only once the state is closed.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.created_at + self.duration
    }

    pub fn variant(&self) -> StateVariant {
        self.variant
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        match self.variant {
            StateVariant::Idle { last_activity_at } => Some(last_activity_at),
            _ => None,
        }
    }
}

impl PartialEq for ActivityState {
    fn eq(&self, other: &Self) -> bool {
        self.project_id == other.project_id && self.kind == other.kind
    }
}

impl Eq for ActivityState {}

pub(crate) fn clamped_span(start: DateTime<Utc>, end: DateTime<Utc>, kind: ActivityKind) -> Duration {
    let span = end - start;
    if span < Duration::zero() {
        tracing::warn!(
            kind = %kind,
            start = %start,
            end = %end,
            "close instant precedes start, recording zero duration"
        );
        return Duration::zero();
    }
    span
}
