//! Mock port implementations

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use codetrail_core::{
    ActivityArchive, ActivityBatch, ActivityEncoder, ActivityForwarder, ArchivedActivity,
    CredentialStore, Delivery, TokenVerifier, TrackingObserver,
};
use codetrail_domain::utils::{format_duration, TimestampFormat};
use codetrail_domain::{
    ActivityEntryInfo, ActivityEvent, ActivityInfo, ActivityState, CodeContextInfo,
    CodetrailError, Credentials, Result as DomainResult,
};
use parking_lot::Mutex;
use uuid::Uuid;

/// Minimal encoder using the canonical formats.
#[derive(Default)]
pub struct PlainEncoder {
    format: TimestampFormat,
}

impl ActivityEncoder for PlainEncoder {
    fn encode(&self, batch: &ActivityBatch) -> ActivityInfo {
        let states = batch
            .states
            .iter()
            .map(|s| ActivityEntryInfo {
                parent_id: batch.batch_id,
                start: self.format.format(&s.created_at()),
                end: self.format.format(&s.end()),
                kind: s.kind(),
                duration: format_duration(s.duration()),
                context: None,
            })
            .collect();
        let events = batch
            .events
            .iter()
            .map(|e| ActivityEntryInfo {
                parent_id: batch.batch_id,
                start: self.format.format(&e.created_at()),
                end: self.format.format(&e.end()),
                kind: e.kind(),
                duration: format_duration(e.duration()),
                context: Some(CodeContextInfo::from(e.context())),
            })
            .collect();
        ActivityInfo {
            instance: "test".into(),
            project_id: batch.project_id,
            batch_id: batch.batch_id,
            start_time: self.format.format(&batch.started_at),
            end_time: self.format.format(&batch.ended_at),
            states,
            events,
        }
    }
}

/// Forwarder answering from a script, `Accepted` once the script runs out.
#[derive(Default)]
pub struct ScriptedForwarder {
    script: Mutex<VecDeque<Delivery>>,
    posted: Mutex<Vec<ActivityInfo>>,
}

impl ScriptedForwarder {
    pub fn answering(deliveries: impl IntoIterator<Item = Delivery>) -> Self {
        Self { script: Mutex::new(deliveries.into_iter().collect()), posted: Mutex::default() }
    }

    pub fn posted(&self) -> Vec<ActivityInfo> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl ActivityForwarder for ScriptedForwarder {
    async fn forward(&self, activity: &ActivityInfo) -> Delivery {
        self.posted.lock().push(activity.clone());
        self.script.lock().pop_front().unwrap_or(Delivery::Accepted)
    }
}

#[derive(Default)]
pub struct MemoryArchive {
    history: Mutex<Vec<ActivityInfo>>,
    cache: Mutex<Vec<ArchivedActivity>>,
    fail_writes: bool,
}

impl MemoryArchive {
    pub fn failing() -> Self {
        Self { fail_writes: true, ..Self::default() }
    }

    pub fn with_cached(activities: impl IntoIterator<Item = ActivityInfo>) -> Self {
        let archive = Self::default();
        for activity in activities {
            archive.save_cache(&activity).unwrap();
        }
        archive
    }

    pub fn history(&self) -> Vec<ActivityInfo> {
        self.history.lock().clone()
    }

    pub fn cache(&self) -> Vec<ActivityInfo> {
        self.cache.lock().iter().map(|e| e.activity.clone()).collect()
    }

    fn check(&self) -> DomainResult<()> {
        if self.fail_writes {
            return Err(CodetrailError::Io("disk full".into()));
        }
        Ok(())
    }
}

impl ActivityArchive for MemoryArchive {
    fn save_history(&self, activity: &ActivityInfo) -> DomainResult<()> {
        self.check()?;
        self.history.lock().push(activity.clone());
        Ok(())
    }

    fn save_cache(&self, activity: &ActivityInfo) -> DomainResult<()> {
        self.check()?;
        self.cache.lock().push(ArchivedActivity {
            key: activity.batch_id.to_string(),
            activity: activity.clone(),
        });
        Ok(())
    }

    fn cached(&self) -> DomainResult<Vec<ArchivedActivity>> {
        Ok(self.cache.lock().clone())
    }

    fn remove_cached(&self, key: &str) -> DomainResult<()> {
        self.cache.lock().retain(|entry| entry.key != key);
        Ok(())
    }
}

/// Verifier with a fixed verdict.
pub struct FixedVerifier {
    verdict: DomainResult<()>,
    pub checked: Mutex<Vec<Credentials>>,
}

impl FixedVerifier {
    pub fn accepting() -> Self {
        Self { verdict: Ok(()), checked: Mutex::default() }
    }

    pub fn failing(err: CodetrailError) -> Self {
        Self { verdict: Err(err), checked: Mutex::default() }
    }
}

#[async_trait]
impl TokenVerifier for FixedVerifier {
    async fn verify(&self, credentials: &Credentials) -> DomainResult<()> {
        self.checked.lock().push(credentials.clone());
        self.verdict.clone()
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn holding(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())) }
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_token(&self) -> DomainResult<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save_token(&self, user_token: &str) -> DomainResult<()> {
        *self.token.lock() = Some(user_token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> DomainResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Observer recording every callback.
#[derive(Default)]
pub struct RecordingObserver {
    pub started: Mutex<Vec<Uuid>>,
    pub stopped: Mutex<Vec<Uuid>>,
    pub events: Mutex<Vec<ActivityEvent>>,
    pub changes: Mutex<Vec<(ActivityState, ActivityState)>>,
}

impl RecordingObserver {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl TrackingObserver for RecordingObserver {
    fn project_started(&self, project_id: Uuid, _name: &str, _at: chrono::DateTime<chrono::Utc>) {
        self.started.lock().push(project_id);
    }

    fn project_stopped(&self, project_id: Uuid, _name: &str, _at: chrono::DateTime<chrono::Utc>) {
        self.stopped.lock().push(project_id);
    }

    fn event_recorded(&self, event: &ActivityEvent) {
        self.events.lock().push(event.clone());
    }

    fn state_changed(&self, previous: &ActivityState, current: &ActivityState) {
        self.changes.lock().push((previous.clone(), current.clone()));
    }
}
