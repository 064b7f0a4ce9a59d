//! Failure classification for API envelopes
//!
//! Maps an [`ApiStatus`] onto a category with retry metadata, and from there
//! onto a flush [`Delivery`] or a domain error.

use codetrail_core::Delivery;
use codetrail_domain::CodetrailError;

use super::response::{ApiResponse, ApiStatus};

/// Categories of API failures for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403)
    Authentication,
    /// Rate limiting (429) and request timeout (408) - retry next cycle
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (other 4xx, local preparation failures) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
}

impl ApiErrorCategory {
    /// Category of a failed status, `None` for 2xx.
    pub fn of(status: ApiStatus) -> Option<Self> {
        match status {
            ApiStatus::Http(code) if (200..300).contains(&code) => None,
            ApiStatus::Http(401 | 403) => Some(Self::Authentication),
            ApiStatus::Http(408 | 429) => Some(Self::RateLimit),
            ApiStatus::Http(500..=599) => Some(Self::Server),
            ApiStatus::Http(_) | ApiStatus::ClientError => Some(Self::Client),
            ApiStatus::ConnectionProblems => Some(Self::Network),
        }
    }

    /// Whether sending the same payload again later could succeed.
    pub fn should_retry(self) -> bool {
        matches!(self, Self::RateLimit | Self::Server | Self::Network)
    }
}

impl<T> ApiResponse<T> {
    /// What the flush cycle should do with the batch that produced this
    /// response.
    pub fn delivery(&self) -> Delivery {
        match ApiErrorCategory::of(self.status) {
            None => Delivery::Accepted,
            Some(category) if category.should_retry() => {
                Delivery::Retry(format!("{}: {}", self.status, self.reason))
            }
            Some(_) => Delivery::Discard(format!("{}: {}", self.status, self.reason)),
        }
    }

    /// Turn a failed envelope into a domain error; success yields the payload.
    ///
    /// # Errors
    /// `Auth` for 401/403, `Network` for retryable failures, `Internal`
    /// otherwise.
    pub fn into_result(self) -> Result<Option<T>, CodetrailError> {
        let message = format!("{}: {}", self.status, self.reason);
        match ApiErrorCategory::of(self.status) {
            None => Ok(self.payload),
            Some(ApiErrorCategory::Authentication) => Err(CodetrailError::Auth(message)),
            Some(category) if category.should_retry() => Err(CodetrailError::Network(message)),
            Some(_) => Err(CodetrailError::Internal(message)),
        }
    }
}
