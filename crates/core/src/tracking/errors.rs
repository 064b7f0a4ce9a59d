//! Registry-level errors

use codetrail_domain::{ActivityKind, CodetrailError};
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by the project registry.
///
/// None of these mutate state: a rejected call leaves every project as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("project {0} is not tracked")]
    ProjectNotTracked(Uuid),

    #[error("project {0} is already tracked")]
    AlreadyTracked(Uuid),

    #[error("activity kind '{0}' cannot be recorded directly")]
    UnsupportedKind(ActivityKind),
}

impl From<TrackingError> for CodetrailError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::ProjectNotTracked(_) => Self::ProjectNotTracked(err.to_string()),
            TrackingError::UnsupportedKind(_) => Self::UnsupportedKind(err.to_string()),
            TrackingError::AlreadyTracked(_) => Self::Internal(err.to_string()),
        }
    }
}
