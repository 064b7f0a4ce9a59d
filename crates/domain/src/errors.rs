//! Error types used throughout the agent

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Codetrail
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CodetrailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Project not tracked: {0}")]
    ProjectNotTracked(String),

    #[error("Unsupported activity kind: {0}")]
    UnsupportedKind(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Fatal and startup-only: the remote service no longer accepts this
    /// client version.
    #[error("Incompatible version: {0}")]
    IncompatibleVersion(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Codetrail operations
pub type Result<T> = std::result::Result<T, CodetrailError>;

/// Malformed wire data.
///
/// Decoding never substitutes a default value; callers always learn which
/// token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("unknown {0} id {1}")]
    UnknownId(&'static str, i64),
}

impl From<DecodeError> for CodetrailError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value.to_string())
    }
}
