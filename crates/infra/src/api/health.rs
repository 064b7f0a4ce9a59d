//! Best-effort health reporting
//!
//! A report is one `PUT /health`. Its outcome is logged and otherwise
//! dropped; nothing here returns an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use codetrail_domain::constants::HEALTH_STARTUP_MESSAGE;
use codetrail_domain::{CodetrailError, HealthInfo, HealthLevel, TimestampFormat};
use tracing::{error, info, warn};

use super::client::ApiClient;

pub struct HealthReporter {
    client: Arc<ApiClient>,
    timestamps: TimestampFormat,
    fatal_reported: AtomicBool,
}

impl HealthReporter {
    pub fn new(client: Arc<ApiClient>, timestamps: TimestampFormat) -> Self {
        Self { client, timestamps, fatal_reported: AtomicBool::new(false) }
    }

    /// Send one health record. Returns whether the server accepted it.
    pub async fn report(
        &self,
        level: HealthLevel,
        message: &str,
        fault: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let health = HealthInfo {
            message: message.to_string(),
            source: self.client.config().client_kind.clone(),
            level,
            identity: self.client.credentials().map(|c| c.identity().to_string()),
            error: fault.map(str::to_string),
            creation_time: self.timestamps.format(&now),
        };

        let response = self.client.log_health(&health).await;
        if response.is_success() {
            info!(level = %level, "Health report sent");
            true
        } else {
            warn!(status = %response.status, reason = %response.reason, "Health report failed");
            false
        }
    }

    /// Report a fault that stops the agent from starting.
    ///
    /// Only the first call sends anything; later calls are logged and skipped.
    pub async fn report_startup_failure(&self, fault: &CodetrailError, now: DateTime<Utc>) -> bool {
        error!(error = %fault, "Agent could not start");
        if self.fatal_reported.swap(true, Ordering::SeqCst) {
            warn!("Startup failure already reported, skipping health report");
            return false;
        }
        self.report(HealthLevel::Error, HEALTH_STARTUP_MESSAGE, Some(&fault.to_string()), now)
            .await
    }
}

impl std::fmt::Debug for HealthReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthReporter")
            .field("fatal_reported", &self.fatal_reported.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
