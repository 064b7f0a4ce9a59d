//! Host notification dispatch
//!
//! Translates IDE lifecycle callbacks into registry calls.

use chrono::{DateTime, Utc};
use codetrail_domain::{ActivityKind, CodeContext};
use uuid::Uuid;

use super::errors::TrackingError;
use super::registry::ProjectRegistry;

/// One observation delivered by the host IDE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    DocumentEdit { context: CodeContext },
    DocumentFocus { context: CodeContext },
    BuildStarted,
    BuildFinished,
    DebugStarted,
    DebugFinished,
    SystemEvent { context: CodeContext },
    Marker { context: CodeContext },
}

impl HostNotification {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DocumentEdit { .. } => "document_edit",
            Self::DocumentFocus { .. } => "document_focus",
            Self::BuildStarted => "build_started",
            Self::BuildFinished => "build_finished",
            Self::DebugStarted => "debug_started",
            Self::DebugFinished => "debug_finished",
            Self::SystemEvent { .. } => "system_event",
            Self::Marker { .. } => "marker",
        }
    }
}

impl ProjectRegistry {
    /// Dispatch a host notification for `project_id`.
    ///
    /// # Errors
    /// Same as [`ProjectRegistry::record_event`].
    pub fn notify(
        &self,
        project_id: Uuid,
        notification: HostNotification,
        now: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        let project_context = || {
            self.name_of(project_id).map(CodeContext::for_project).unwrap_or_default()
        };

        match notification {
            HostNotification::DocumentEdit { context } => {
                self.record_event(project_id, ActivityKind::DocumentEdit, context, now)
            }
            HostNotification::DocumentFocus { context } => {
                self.record_event(project_id, ActivityKind::DocumentFocus, context, now)
            }
            HostNotification::BuildStarted => {
                self.record_event(project_id, ActivityKind::Building, project_context(), now)
            }
            HostNotification::DebugStarted => {
                self.record_event(project_id, ActivityKind::Debugging, project_context(), now)
            }
            HostNotification::SystemEvent { context } => {
                self.record_event(project_id, ActivityKind::System, context, now)
            }
            HostNotification::Marker { context } => {
                self.record_event(project_id, ActivityKind::Event, context, now)
            }
            HostNotification::BuildFinished => self.finish(project_id, ActivityKind::Building, now),
            HostNotification::DebugFinished => {
                self.finish(project_id, ActivityKind::Debugging, now)
            }
        }
    }
}
