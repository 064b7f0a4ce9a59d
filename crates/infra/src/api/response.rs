//! Uniform outcome of every transport call

use std::fmt;

/// Status carried by an [`ApiResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// The server answered with this HTTP status.
    Http(u16),
    /// The request could not be prepared, or the answer could not be read.
    ClientError,
    /// The server could not be reached: connect failure, TLS, timeout.
    ConnectionProblems,
}

impl ApiStatus {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Http(code) if (200..300).contains(&code))
    }

    /// Raw HTTP status, when the server answered at all.
    pub fn code(self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(code),
            Self::ClientError | Self::ConnectionProblems => None,
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "HTTP {code}"),
            Self::ClientError => f.write_str("client error"),
            Self::ConnectionProblems => f.write_str("connection problems"),
        }
    }
}

/// Envelope returned by [`super::ApiClient`] instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    /// `reason` response header, or a default, or the local failure message.
    pub reason: String,
    pub payload: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: ApiStatus, reason: impl Into<String>, payload: Option<T>) -> Self {
        Self { status, reason: reason.into(), payload }
    }

    pub fn client_error(reason: impl Into<String>) -> Self {
        Self::new(ApiStatus::ClientError, reason, None)
    }

    pub fn connection_problems(reason: impl Into<String>) -> Self {
        Self::new(ApiStatus::ConnectionProblems, reason, None)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.code()
    }

    /// Same status and reason, payload converted.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse { status: self.status, reason: self.reason, payload: self.payload.map(f) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_2xx_counts_as_success() {
        assert!(ApiStatus::Http(200).is_success());
        assert!(ApiStatus::Http(204).is_success());
        assert!(!ApiStatus::Http(304).is_success());
        assert!(!ApiStatus::Http(503).is_success());
        assert!(!ApiStatus::ConnectionProblems.is_success());
    }

    #[test]
    fn synthetic_statuses_have_no_code() {
        let response: ApiResponse<()> = ApiResponse::connection_problems("timed out");
        assert_eq!(response.status_code(), None);
        assert_eq!(response.reason, "timed out");
        assert!(response.payload.is_none());
    }
}
