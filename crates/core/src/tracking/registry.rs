//! Project tracking registry
//!
//! Maps tracked projects to their live state. The project map sits behind a
//! single `RwLock`; every project's records sit behind their own `Mutex`, so
//! notifications for unrelated projects never block each other.
//!
//! Lock discipline: the map lock is never held while a slot lock is taken,
//! and at most one slot lock is held at a time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use codetrail_domain::{ActivityEvent, ActivityKind, ActivityState, CodeContext};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::batch::ActivityBatch;
use super::errors::TrackingError;
use super::ports::TrackingObserver;
use super::project_map::ProjectMap;
use super::slot::{IdleChange, ProjectSlot, Transition};

type SlotHandle = Arc<Mutex<ProjectSlot>>;

#[derive(Default)]
struct Tracked {
    names: ProjectMap,
    slots: HashMap<Uuid, SlotHandle>,
}

/// Outcome of a state-affecting call, reported to observers once locks are
/// released.
struct StateChange {
    previous: ActivityState,
    current: ActivityState,
}

/// Registry of tracked projects and their single live state.
pub struct ProjectRegistry {
    tracked: RwLock<Tracked>,
    retired: Mutex<Vec<ActivityBatch>>,
    idle_timeout: RwLock<Duration>,
    observers: RwLock<Vec<Arc<dyn TrackingObserver>>>,
}

impl ProjectRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            tracked: RwLock::new(Tracked::default()),
            retired: Mutex::new(Vec::new()),
            idle_timeout: RwLock::new(idle_timeout),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn TrackingObserver>) {
        self.observers.write().push(observer);
    }

    pub fn idle_timeout(&self) -> Duration {
        *self.idle_timeout.read()
    }

    /// Replace the idle timeout, e.g. after the server pushed new timings.
    pub fn set_idle_timeout(&self, timeout: Duration) {
        *self.idle_timeout.write() = timeout;
    }

    /// Begin tracking a project with a null live state.
    ///
    /// # Errors
    /// `AlreadyTracked` when the id, or the display name under another id, is
    /// already registered.
    pub fn start_tracking(
        &self,
        project_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        {
            let mut tracked = self.tracked.write();
            if tracked.slots.contains_key(&project_id) {
                return Err(TrackingError::AlreadyTracked(project_id));
            }
            if let Some(existing) = tracked.names.id_of(name) {
                return Err(TrackingError::AlreadyTracked(existing));
            }
            tracked.names.insert(project_id, name);
            tracked.slots.insert(project_id, Arc::new(Mutex::new(ProjectSlot::new(project_id, now))));
        }

        info!(project_id = %project_id, name, "Started tracking project");
        for observer in self.observers() {
            observer.project_started(project_id, name, now);
        }
        Ok(())
    }

    /// Stop tracking a project.
    ///
    /// The live state is closed before the project leaves the map; its last
    /// records are handed to the next [`drain`](Self::drain).
    ///
    /// # Errors
    /// `ProjectNotTracked` for unknown projects.
    pub fn stop_tracking(&self, project_id: Uuid, now: DateTime<Utc>) -> Result<(), TrackingError> {
        let slot = self.slot(project_id)?;
        let batch = {
            let mut slot = slot.lock();
            if slot.is_retired() {
                return Err(TrackingError::ProjectNotTracked(project_id));
            }
            slot.retire(now)
        };

        let name = {
            let mut tracked = self.tracked.write();
            tracked.slots.remove(&project_id);
            tracked.names.remove(&project_id).unwrap_or_default()
        };

        if let Some(batch) = batch {
            self.retired.lock().push(batch);
        }

        info!(project_id = %project_id, name = %name, "Stopped tracking project");
        for observer in self.observers() {
            observer.project_stopped(project_id, &name, now);
        }
        Ok(())
    }

    /// Stop every tracked project; used on shutdown.
    pub fn stop_all(&self, now: DateTime<Utc>) {
        let ids: Vec<Uuid> = self.tracked.read().names.ids().collect();
        for project_id in ids {
            if let Err(err) = self.stop_tracking(project_id, now) {
                debug!(project_id = %project_id, error = %err, "Project already stopped");
            }
        }
    }

    /// Apply one host observation to a project.
    ///
    /// Editor input moves the project to coding (or refreshes an idle span),
    /// build/debug/system kinds transition the live state, and `Event` records
    /// a marker. Whenever the live state is replaced, every other project gets
    /// a null placeholder at the same instant.
    ///
    /// # Errors
    /// `ProjectNotTracked` for unknown projects and `UnsupportedKind` for
    /// `Idle`/`None`, which only the registry itself may produce. Neither
    /// mutates any state.
    pub fn record_event(
        &self,
        project_id: Uuid,
        kind: ActivityKind,
        context: CodeContext,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        if matches!(kind, ActivityKind::Idle | ActivityKind::None) {
            return Err(TrackingError::UnsupportedKind(kind));
        }
        let slot = self.slot(project_id)?;

        let (transition, event, change) = {
            let mut slot = slot.lock();
            if slot.is_retired() {
                return Err(TrackingError::ProjectNotTracked(project_id));
            }

            let transition = match kind {
                ActivityKind::Event => None,
                k if k.is_qualifying_input() => slot.record_input(now)?,
                k => Some(slot.transition(k, now)?),
            };

            let event = kind.is_event_only().then(|| {
                let event = ActivityEvent::new(project_id, kind, context, now);
                slot.record_event(event.clone(), now);
                event
            });

            let change = match transition {
                Some(Transition::Replaced | Transition::Reopened) => {
                    Self::change_of(&slot)
                }
                _ => None,
            };
            (transition, event, change)
        };

        debug!(project_id = %project_id, kind = %kind, ?transition, "Recorded activity");

        if transition == Some(Transition::Replaced) {
            self.park_others(project_id, now);
        }
        self.publish(event.as_ref(), change);
        Ok(())
    }

    /// End a build, debug or system span, returning the project to coding.
    ///
    /// A no-op when `kind` is not the live state.
    ///
    /// # Errors
    /// `ProjectNotTracked` for unknown projects.
    pub fn finish(
        &self,
        project_id: Uuid,
        kind: ActivityKind,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        let slot = self.slot(project_id)?;
        let change = {
            let mut slot = slot.lock();
            if slot.is_retired() {
                return Err(TrackingError::ProjectNotTracked(project_id));
            }
            if slot.finish(kind, now) {
                Self::change_of(&slot)
            } else {
                None
            }
        };

        if change.is_some() {
            self.park_others(project_id, now);
        }
        self.publish(None, change);
        Ok(())
    }

    /// Timer-driven idle evaluation across all projects.
    pub fn check_idle(&self, now: DateTime<Utc>) -> Vec<(Uuid, IdleChange)> {
        let timeout = self.idle_timeout();
        let mut changes = Vec::new();

        for (project_id, slot) in self.slots() {
            let (idle_change, change) = {
                let mut slot = slot.lock();
                if slot.is_retired() {
                    continue;
                }
                let idle_change = slot.check_idle(now, timeout);
                let change = idle_change.and_then(|_| Self::change_of(&slot));
                (idle_change, change)
            };

            if let Some(idle_change) = idle_change {
                debug!(project_id = %project_id, ?idle_change, "Idle check changed state");
                changes.push((project_id, idle_change));
            }
            self.publish(None, change);
        }
        changes
    }

    /// Close every project's records at `now` and collect them, re-opening
    /// each live state so tracking continues seamlessly.
    pub fn drain(&self, now: DateTime<Utc>) -> Vec<ActivityBatch> {
        let mut batches = std::mem::take(&mut *self.retired.lock());

        for (_, slot) in self.slots() {
            let mut slot = slot.lock();
            if slot.is_retired() {
                continue;
            }
            if let Some(batch) = slot.drain(now) {
                batches.push(batch);
            }
        }
        batches
    }

    /// Snapshot of the tracked projects.
    pub fn tracked_projects(&self) -> ProjectMap {
        self.tracked.read().names.clone()
    }

    pub fn is_tracked(&self, project_id: Uuid) -> bool {
        self.tracked.read().slots.contains_key(&project_id)
    }

    /// Current live state of a project, for console/status display.
    ///
    /// # Errors
    /// `ProjectNotTracked` for unknown projects.
    pub fn live_state(&self, project_id: Uuid) -> Result<ActivityState, TrackingError> {
        let slot = self.slot(project_id)?;
        let slot = slot.lock();
        if slot.is_retired() {
            return Err(TrackingError::ProjectNotTracked(project_id));
        }
        Ok(slot.live().clone())
    }

    /// The event span currently accumulating for a project, if any.
    ///
    /// # Errors
    /// `ProjectNotTracked` for unknown projects.
    pub fn current_event(&self, project_id: Uuid) -> Result<Option<ActivityEvent>, TrackingError> {
        let slot = self.slot(project_id)?;
        let slot = slot.lock();
        if slot.is_retired() {
            return Err(TrackingError::ProjectNotTracked(project_id));
        }
        Ok(slot.current_event().cloned())
    }

    pub(crate) fn name_of(&self, project_id: Uuid) -> Option<String> {
        self.tracked.read().names.name_of(&project_id).map(str::to_string)
    }

    fn slot(&self, project_id: Uuid) -> Result<SlotHandle, TrackingError> {
        self.tracked
            .read()
            .slots
            .get(&project_id)
            .cloned()
            .ok_or(TrackingError::ProjectNotTracked(project_id))
    }

    fn slots(&self) -> Vec<(Uuid, SlotHandle)> {
        self.tracked.read().slots.iter().map(|(id, slot)| (*id, Arc::clone(slot))).collect()
    }

    fn observers(&self) -> Vec<Arc<dyn TrackingObserver>> {
        self.observers.read().clone()
    }

    fn change_of(slot: &ProjectSlot) -> Option<StateChange> {
        slot.last_closed()
            .map(|previous| StateChange { previous: previous.clone(), current: slot.live().clone() })
    }

    /// Give every project except `active` a null placeholder at `now`.
    fn park_others(&self, active: Uuid, now: DateTime<Utc>) {
        for (project_id, slot) in self.slots() {
            if project_id == active {
                continue;
            }
            let change = {
                let mut slot = slot.lock();
                if slot.is_retired() {
                    continue;
                }
                slot.park(now);
                Self::change_of(&slot)
            };
            self.publish(None, change);
        }
    }

    fn publish(&self, event: Option<&ActivityEvent>, change: Option<StateChange>) {
        if event.is_none() && change.is_none() {
            return;
        }
        for observer in self.observers() {
            if let Some(event) = event {
                observer.event_recorded(event);
            }
            if let Some(change) = &change {
                observer.state_changed(&change.previous, &change.current);
            }
        }
    }
}

impl std::fmt::Debug for ProjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("projects", &self.tracked.read().names.len())
            .field("idle_timeout", &self.idle_timeout())
            .finish_non_exhaustive()
    }
}
