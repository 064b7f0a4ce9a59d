//! Per-project transition policy
//!
//! A slot owns the single live state of one project plus every record closed
//! since the last flush. All methods take `now` explicitly; the slot never
//! reads a clock.

use std::mem;

use chrono::{DateTime, Duration, Utc};
use codetrail_domain::{ActivityEvent, ActivityKind, ActivityState};
use uuid::Uuid;

use super::batch::ActivityBatch;
use super::errors::TrackingError;

/// What happened to the live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same kind, kept open and growing.
    Extended,
    /// Same kind, closed and opened fresh.
    Reopened,
    /// Different kind took over.
    Replaced,
}

/// Timer-driven change produced by [`ProjectSlot::check_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleChange {
    WentIdle { at: DateTime<Utc> },
    Resumed { at: DateTime<Utc> },
}

#[derive(Debug)]
pub(crate) struct ProjectSlot {
    project_id: Uuid,
    live: ActivityState,
    closed_states: Vec<ActivityState>,
    current_event: Option<ActivityEvent>,
    closed_events: Vec<ActivityEvent>,
    last_input_at: DateTime<Utc>,
    window_start: DateTime<Utc>,
    retired: bool,
}

impl ProjectSlot {
    /// A freshly tracked project starts with a null state.
    pub(crate) fn new(project_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            project_id,
            live: ActivityState::create_null_state(project_id, now),
            closed_states: Vec::new(),
            current_event: None,
            closed_events: Vec::new(),
            last_input_at: now,
            window_start: now,
            retired: false,
        }
    }

    pub(crate) fn live(&self) -> &ActivityState {
        &self.live
    }

    pub(crate) fn current_event(&self) -> Option<&ActivityEvent> {
        self.current_event.as_ref()
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired
    }

    /// Most recently closed state not yet drained.
    pub(crate) fn last_closed(&self) -> Option<&ActivityState> {
        self.closed_states.last()
    }

    fn close_live(&mut self, at: DateTime<Utc>) {
        let mut closed = self.live.clone();
        closed.close_duration(at);
        self.closed_states.push(closed);
    }

    fn replace_live(&mut self, next: ActivityState, at: DateTime<Utc>) {
        self.close_live(at);
        self.live = next;
    }

    fn close_event(&mut self, at: DateTime<Utc>) {
        if let Some(mut event) = self.current_event.take() {
            event.close_duration(at);
            self.closed_events.push(event);
        }
    }

    /// Move the live state to `kind`.
    pub(crate) fn transition(
        &mut self,
        kind: ActivityKind,
        now: DateTime<Utc>,
    ) -> Result<Transition, TrackingError> {
        if self.live.kind() == kind {
            if self.live.can_expand() {
                return Ok(Transition::Extended);
            }
            let next = self.live.recreate(now);
            self.replace_live(next, now);
            return Ok(Transition::Reopened);
        }

        let next = ActivityState::for_kind(kind, self.project_id, now)
            .map_err(|_| TrackingError::UnsupportedKind(kind))?;
        self.replace_live(next, now);
        Ok(Transition::Replaced)
    }

    /// Keyboard input. Idle spans only record it; build and debug spans
    /// absorb it; anything else becomes coding.
    pub(crate) fn record_input(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Transition>, TrackingError> {
        if now > self.last_input_at {
            self.last_input_at = now;
        }
        if self.live.is_idle() {
            self.live.touch(now);
            return Ok(None);
        }
        match self.live.kind() {
            ActivityKind::Debugging | ActivityKind::Building => Ok(None),
            _ => self.transition(ActivityKind::Coding, now).map(Some),
        }
    }

    /// Append an event, coalescing equivalent spannable triggers into the
    /// current span.
    pub(crate) fn record_event(&mut self, event: ActivityEvent, now: DateTime<Utc>) {
        if event.is_marker() {
            self.closed_events.push(event);
            return;
        }
        match self.current_event.take() {
            Some(current) if current.can_span() && current.is_equivalent(&event) => {
                self.current_event = Some(current);
            }
            Some(mut current) => {
                current.close_duration(now);
                self.closed_events.push(current);
                self.current_event = Some(event);
            }
            None => self.current_event = Some(event),
        }
    }

    /// Leave `kind` for coding if it is the live state. Returns whether the
    /// state changed.
    pub(crate) fn finish(&mut self, kind: ActivityKind, now: DateTime<Utc>) -> bool {
        if self.live.kind() != kind {
            return false;
        }
        let next = ActivityState::create_design_state(self.project_id, now);
        self.replace_live(next, now);
        true
    }

    /// Another project took over: materialize a null placeholder here.
    pub(crate) fn park(&mut self, now: DateTime<Utc>) {
        self.close_event(now);
        let next = ActivityState::create_null_state(self.project_id, now);
        self.replace_live(next, now);
    }

    /// Close an idle span that saw input, resuming coding at the last input.
    fn settle_idle(&mut self) -> Option<IdleChange> {
        let last_activity_at = self.live.last_activity_at()?;
        if last_activity_at <= self.live.created_at() {
            return None;
        }
        let next = ActivityState::create_design_state(self.project_id, last_activity_at);
        self.replace_live(next, last_activity_at);
        Some(IdleChange::Resumed { at: last_activity_at })
    }

    /// Periodic idle evaluation.
    pub(crate) fn check_idle(&mut self, now: DateTime<Utc>, timeout: Duration) -> Option<IdleChange> {
        let resumed = self.settle_idle();

        if self.live.kind() != ActivityKind::Coding || now - self.last_input_at <= timeout {
            return resumed;
        }

        let deadline = self.last_input_at + timeout;
        let at = if self.live.can_shrink() { deadline.max(self.live.created_at()) } else { now };
        self.close_event(at);
        let next = ActivityState::create_idle_state(self.project_id, at);
        self.replace_live(next, at);
        Some(IdleChange::WentIdle { at })
    }

    /// Close everything at `now`, re-open the same state and span, and hand
    /// over the closed records.
    pub(crate) fn drain(&mut self, now: DateTime<Utc>) -> Option<ActivityBatch> {
        self.settle_idle();
        let next = self.live.recreate(now);
        self.replace_live(next, now);

        if let Some(mut event) = self.current_event.take() {
            let next = event.recreate(now);
            event.close_duration(now);
            self.closed_events.push(event);
            self.current_event = Some(next);
        }
        self.take_batch(now)
    }

    /// Final close before the project leaves the registry.
    pub(crate) fn retire(&mut self, now: DateTime<Utc>) -> Option<ActivityBatch> {
        self.settle_idle();
        self.close_event(now);
        self.close_live(now);
        self.retired = true;
        self.take_batch(now)
    }

    fn take_batch(&mut self, now: DateTime<Utc>) -> Option<ActivityBatch> {
        let states: Vec<_> = mem::take(&mut self.closed_states)
            .into_iter()
            .filter(|state| state.duration() > Duration::zero())
            .collect();
        let events = mem::take(&mut self.closed_events);
        let started_at = mem::replace(&mut self.window_start, now);

        if states.is_empty() && events.is_empty() {
            return None;
        }
        Some(ActivityBatch {
            batch_id: Uuid::now_v7(),
            project_id: self.project_id,
            started_at,
            ended_at: now,
            states,
            events,
        })
    }

    #[cfg(test)]
    pub(crate) fn closed_states(&self) -> &[ActivityState] {
        &self.closed_states
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use codetrail_domain::CodeContext;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn secs(n: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(n)
    }

    fn edit(project: Uuid, file: &str, at: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent::new(
            project,
            ActivityKind::DocumentEdit,
            CodeContext::in_file("shop", file),
            at,
        )
    }

    #[test]
    fn coding_expands_in_place() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        assert_eq!(slot.transition(ActivityKind::Coding, t0()).unwrap(), Transition::Replaced);
        assert_eq!(slot.transition(ActivityKind::Coding, secs(10)).unwrap(), Transition::Extended);
        assert_eq!(slot.live().created_at(), t0());
    }

    #[test]
    fn non_expanding_kinds_reopen() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.transition(ActivityKind::Building, t0()).unwrap();
        assert_eq!(slot.transition(ActivityKind::Building, secs(5)).unwrap(), Transition::Reopened);
        assert_eq!(slot.live().created_at(), secs(5));
        let last = slot.closed_states().last().unwrap();
        assert_eq!(last.kind(), ActivityKind::Building);
        assert_eq!(last.duration(), Duration::seconds(5));
    }

    #[test]
    fn kind_change_closes_previous_state_first() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.transition(ActivityKind::Coding, t0()).unwrap();
        slot.transition(ActivityKind::Debugging, secs(30)).unwrap();

        let closed = slot.closed_states().last().unwrap();
        assert_eq!(closed.kind(), ActivityKind::Coding);
        assert_eq!(closed.end(), secs(30));
        assert_eq!(slot.live().kind(), ActivityKind::Debugging);
        assert_eq!(slot.live().created_at(), secs(30));
    }

    #[test]
    fn input_during_build_keeps_build() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.transition(ActivityKind::Building, t0()).unwrap();
        assert_eq!(slot.record_input(secs(3)).unwrap(), None);
        assert_eq!(slot.live().kind(), ActivityKind::Building);
    }

    #[test]
    fn equivalent_edits_coalesce() {
        let project = Uuid::new_v4();
        let mut slot = ProjectSlot::new(project, t0());
        slot.record_event(edit(project, "a.rs", t0()), t0());
        slot.record_event(edit(project, "a.rs", secs(1)), secs(1));
        slot.record_event(edit(project, "a.rs", secs(2)), secs(2));
        assert_eq!(slot.current_event().unwrap().created_at(), t0());

        slot.record_event(edit(project, "b.rs", secs(5)), secs(5));
        let batch = slot.drain(secs(6)).unwrap();
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.events[0].duration(), Duration::seconds(5));
        assert_eq!(batch.events[1].duration(), Duration::seconds(1));
    }

    #[test]
    fn markers_never_coalesce() {
        let project = Uuid::new_v4();
        let mut slot = ProjectSlot::new(project, t0());
        let marker = ActivityEvent::new(
            project,
            ActivityKind::Event,
            CodeContext::for_project("shop"),
            secs(1),
        );
        slot.record_event(marker.clone(), secs(1));
        slot.record_event(marker, secs(1));
        assert!(slot.current_event().is_none());
        let batch = slot.drain(secs(2)).unwrap();
        assert_eq!(batch.events.len(), 2);
        assert!(batch.events.iter().all(|e| e.duration() == Duration::zero()));
    }

    #[test]
    fn idle_after_timeout_closes_coding_at_deadline() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.record_input(t0()).unwrap();

        assert_eq!(slot.check_idle(secs(60), Duration::seconds(60)), None);
        assert_eq!(
            slot.check_idle(secs(90), Duration::seconds(60)),
            Some(IdleChange::WentIdle { at: secs(60) })
        );

        let coding = slot.closed_states().last().unwrap();
        assert_eq!(coding.kind(), ActivityKind::Coding);
        assert_eq!(coding.duration(), Duration::seconds(60));
        assert!(slot.live().is_idle());
        assert_eq!(slot.live().created_at(), secs(60));
        assert_eq!(slot.live().last_activity_at(), Some(secs(60)));
    }

    #[test]
    fn input_while_idle_resumes_coding_on_next_check() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.record_input(t0()).unwrap();
        slot.check_idle(secs(90), Duration::seconds(60));

        assert_eq!(slot.record_input(secs(100)).unwrap(), None);
        assert!(slot.live().is_idle());
        assert_eq!(slot.live().last_activity_at(), Some(secs(100)));

        assert_eq!(
            slot.check_idle(secs(105), Duration::seconds(60)),
            Some(IdleChange::Resumed { at: secs(100) })
        );
        let idle = slot.closed_states().last().unwrap();
        assert_eq!(idle.kind(), ActivityKind::Idle);
        assert_eq!(idle.duration(), Duration::seconds(40));
        assert_eq!(slot.live().kind(), ActivityKind::Coding);
        assert_eq!(slot.live().created_at(), secs(100));
    }

    #[test]
    fn drain_reopens_and_drops_zero_length_states() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.record_input(t0()).unwrap();
        let batch = slot.drain(secs(20)).unwrap();

        assert_eq!(batch.started_at, t0());
        assert_eq!(batch.ended_at, secs(20));
        assert_eq!(batch.states.len(), 1);
        assert_eq!(batch.states[0].kind(), ActivityKind::Coding);
        assert_eq!(batch.states[0].duration(), Duration::seconds(20));

        assert_eq!(slot.live().kind(), ActivityKind::Coding);
        assert_eq!(slot.live().created_at(), secs(20));
        assert!(slot.drain(secs(20)).is_none());
    }

    #[test]
    fn retire_closes_live_state() {
        let mut slot = ProjectSlot::new(Uuid::new_v4(), t0());
        slot.transition(ActivityKind::Debugging, t0()).unwrap();
        let batch = slot.retire(secs(7)).unwrap();
        assert!(slot.is_retired());
        assert_eq!(batch.states.len(), 1);
        assert_eq!(batch.states[0].duration(), Duration::seconds(7));
    }
}
