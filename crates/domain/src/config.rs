//! Configuration structures
//!
//! Every section has a `Default` that reproduces the reference behaviour, and
//! every field is optional in config files (`#[serde(default)]`).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_CLIENT_KIND, DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_IDLE_CHECK_INTERVAL_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, MAX_TIMER_INTERVAL_SECS,
};
use crate::utils::time_format::DEFAULT_TIMESTAMP_PATTERN;

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api: ApiConfig,
    pub tracking: TrackingConfig,
    pub storage: StorageConfig,
    pub client: ClientConfig,
}

/// Remote service connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Value of the client-kind header, also used as health record source.
    pub client_kind: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Accept any server certificate. Only for networks with TLS-intercepting
    /// appliances; every client built with this set logs a warning.
    pub accept_invalid_certs: bool,
    /// Proxy for every call, e.g. `http://proxy.corp:3128`. Unset connects
    /// directly and ignores proxy environment variables.
    pub proxy_url: Option<String>,
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            client_kind: DEFAULT_CLIENT_KIND.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            accept_invalid_certs: false,
            proxy_url: None,
        }
    }
}

/// Idle detection and flush timings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub idle_timeout_secs: u64,
    pub idle_check_interval_secs: u64,
    pub flush_interval_secs: u64,
    pub console_enabled: bool,
}

impl TrackingConfig {
    /// Idle timeout as a signed span. Values past the representable range
    /// saturate at [`chrono::TimeDelta::MAX`], which disables idle detection.
    pub fn idle_timeout(&self) -> chrono::Duration {
        i64::try_from(self.idle_timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }

    pub fn idle_check_interval(&self) -> Duration {
        Duration::from_secs(self.idle_check_interval_secs.clamp(1, MAX_TIMER_INTERVAL_SECS))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.clamp(1, MAX_TIMER_INTERVAL_SECS))
    }

    /// Apply timings pushed by the server after login.
    pub fn apply_remote(&mut self, remote: &crate::types::UserConfigurationInfo) {
        if let Some(secs) = remote.idle_check_interval_secs {
            self.idle_check_interval_secs = secs;
        }
        if let Some(secs) = remote.idle_max_period_secs {
            self.idle_timeout_secs = secs;
        }
        if let Some(secs) = remote.flush_interval_secs {
            self.flush_interval_secs = secs;
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            idle_check_interval_secs: DEFAULT_IDLE_CHECK_INTERVAL_SECS,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            console_enabled: false,
        }
    }
}

/// Local history/cache layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; `~/.codealike` when unset.
    pub base_dir: Option<PathBuf>,
    pub client_id: String,
    pub instance_id: String,
    /// Keep a history copy of every batch the server accepted.
    pub track_sent: bool,
}

impl StorageConfig {
    /// Storage rooted at `base_dir` with the default ids.
    pub fn at(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: Some(base_dir.into()), ..Self::default() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            client_id: DEFAULT_CLIENT_KIND.to_string(),
            instance_id: "default".to_string(),
            track_sent: true,
        }
    }
}

/// Identity of this client build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `Major.Minor.Build.Revision`
    pub version: String,
    pub timestamp_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: "0.0.0.0".to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}
