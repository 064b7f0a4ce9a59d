//! Wire data transfer objects
//!
//! Field names are PascalCase to match the remote service. Temporal fields
//! hold already-encoded strings: durations in the canonical `HH:MM:SS.mmm`
//! form and timestamps rendered by the process-wide `TimestampFormat`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::activity::{ActivityKind, CodeContext};
use crate::impl_wire_enum;

/// One flushed batch of states and events for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityInfo {
    pub instance: String,
    pub project_id: Uuid,
    pub batch_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub states: Vec<ActivityEntryInfo>,
    pub events: Vec<ActivityEntryInfo>,
}

/// A single state or event span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityEntryInfo {
    pub parent_id: Uuid,
    pub start: String,
    pub end: String,
    #[serde(rename = "Type")]
    pub kind: ActivityKind,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<CodeContextInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeContextInfo {
    pub project: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, rename = "Class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub member: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

impl From<&CodeContext> for CodeContextInfo {
    fn from(context: &CodeContext) -> Self {
        Self {
            project: context.project.clone(),
            file: context.file.clone(),
            namespace: context.namespace.clone(),
            class_name: context.class_name.clone(),
            member: context.member.clone(),
            line: context.line,
        }
    }
}

impl From<CodeContextInfo> for CodeContext {
    fn from(info: CodeContextInfo) -> Self {
        Self {
            project: info.project,
            file: info.file,
            namespace: info.namespace,
            class_name: info.class_name,
            member: info.member,
            line: info.line,
        }
    }
}

/// Registration of a tracked project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionContextInfo {
    #[serde(rename = "SolutionId")]
    pub solution_id: Uuid,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CreationTime")]
    pub creation_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    Info,
    Warning,
    Error,
}

impl_wire_enum!(HealthLevel {
    Info => 0, "info",
    Warning => 1, "warning",
    Error => 2, "error",
});

/// Best-effort fault report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthInfo {
    pub message: String,
    pub source: String,
    pub level: HealthLevel,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub creation_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProfileInfo {
    pub identity: String,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_uri: Option<String>,
}

/// Tracking timings pushed by the server; absent values keep local config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfigurationInfo {
    #[serde(rename = "IdleCheckInterval")]
    pub idle_check_interval_secs: Option<u64>,
    #[serde(rename = "IdleMaxPeriod")]
    pub idle_max_period_secs: Option<u64>,
    #[serde(rename = "FlushInterval")]
    pub flush_interval_secs: Option<u64>,
}

/// Minimum client version accepted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
}
