//! Tracking console
//!
//! A [`TrackingObserver`] that writes a human-readable line for every
//! registry change under the `codetrail::console` target. The most recent
//! line is kept for status displays.

use chrono::{DateTime, Utc};
use codetrail_core::TrackingObserver;
use codetrail_domain::constants::CONSOLE_TARGET;
use codetrail_domain::utils::time_format::format_signed_duration;
use codetrail_domain::{ActivityEvent, ActivityState, TimestampFormat};
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TrackingConsole {
    timestamps: TimestampFormat,
    last_line: Mutex<Option<String>>,
}

impl TrackingConsole {
    pub fn new(timestamps: TimestampFormat) -> Self {
        Self { timestamps, last_line: Mutex::new(None) }
    }

    pub fn last_line(&self) -> Option<String> {
        self.last_line.lock().clone()
    }

    fn emit(&self, line: String) {
        info!(target: CONSOLE_TARGET, "{line}");
        *self.last_line.lock() = Some(line);
    }
}

impl TrackingObserver for TrackingConsole {
    fn project_started(&self, project_id: Uuid, name: &str, at: DateTime<Utc>) {
        self.emit(format!("[{}] started tracking {name} ({project_id})", self.timestamps.format(&at)));
    }

    fn project_stopped(&self, project_id: Uuid, name: &str, at: DateTime<Utc>) {
        self.emit(format!("[{}] stopped tracking {name} ({project_id})", self.timestamps.format(&at)));
    }

    fn event_recorded(&self, event: &ActivityEvent) {
        let context = event.context();
        let location = context.file.as_deref().unwrap_or(&context.project);
        self.emit(format!(
            "[{}] event {} {location} {}",
            self.timestamps.format(&event.created_at()),
            event.kind(),
            format_signed_duration(event.duration()),
        ));
    }

    fn state_changed(&self, previous: &ActivityState, current: &ActivityState) {
        self.emit(format!(
            "[{}] state {} {} -> {}",
            self.timestamps.format(&current.created_at()),
            previous.kind(),
            format_signed_duration(previous.duration()),
            current.kind(),
        ));
    }
}
