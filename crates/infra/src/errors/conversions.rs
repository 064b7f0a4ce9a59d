//! Conversions from external infrastructure errors into domain errors.

use codetrail_domain::CodetrailError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use std::io::Error as IoError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CodetrailError);

impl From<InfraError> for CodetrailError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CodetrailError> for InfraError {
    fn from(value: CodetrailError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCodetrailError {
    fn into_codetrail(self) -> CodetrailError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CodetrailError */
/* -------------------------------------------------------------------------- */

impl IntoCodetrailError for HttpError {
    fn into_codetrail(self) -> CodetrailError {
        if self.is_timeout() {
            return CodetrailError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CodetrailError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return CodetrailError::Decode(format!("HTTP body could not be decoded: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CodetrailError::Auth(message),
                _ => CodetrailError::Network(message),
            };
        }

        if self.is_builder() {
            return CodetrailError::Internal(self.to_string());
        }

        // Request and body failures after connecting (reset, early close)
        CodetrailError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_codetrail())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CodetrailError */
/* -------------------------------------------------------------------------- */

impl IntoCodetrailError for IoError {
    fn into_codetrail(self) -> CodetrailError {
        CodetrailError::Io(format!("{:?}: {self}", self.kind()))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_codetrail())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml → CodetrailError */
/* -------------------------------------------------------------------------- */

impl IntoCodetrailError for JsonError {
    fn into_codetrail(self) -> CodetrailError {
        if self.is_io() {
            return CodetrailError::Io(self.to_string());
        }
        CodetrailError::Decode(format!("invalid JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_codetrail())
    }
}

impl IntoCodetrailError for TomlError {
    fn into_codetrail(self) -> CodetrailError {
        CodetrailError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_codetrail())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
