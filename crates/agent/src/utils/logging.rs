use std::time::Duration;

use codetrail_domain::CodetrailError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "codetrail=info";

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
/// `json` switches the fmt layer to one JSON object per line. Returns `false`
/// when a subscriber was already installed, which is not an error: hosts and
/// tests may initialise logging before the agent does.
pub fn init_logging(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed =
        if json { builder.json().try_init().is_ok() } else { builder.try_init().is_ok() };
    if installed {
        info!(json, "Logging initialised");
    }
    installed
}

/// Load a `.env` file from the working directory or its parents, if any.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Could not load .env file"),
    }
}

/// Log the outcome of a host command with structured fields.
///
/// `command` should be a stable identifier such as `"tracking::start"`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `CodetrailError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &CodetrailError) -> &'static str {
    match error {
        CodetrailError::Config(_) => "config",
        CodetrailError::Io(_) => "io",
        CodetrailError::Decode(_) => "decode",
        CodetrailError::ProjectNotTracked(_) => "project_not_tracked",
        CodetrailError::UnsupportedKind(_) => "unsupported_kind",
        CodetrailError::Network(_) => "network",
        CodetrailError::Auth(_) => "auth",
        CodetrailError::IncompatibleVersion(_) => "incompatible_version",
        CodetrailError::Internal(_) => "internal",
    }
}
