//! Configuration loader
//!
//! Loads agent configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CODETRAIL_API_URL` is not set, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every section has defaults, so a file only needs the values it changes.
//!
//! ## Environment Variables
//! - `CODETRAIL_API_URL`: API base URL (required for env loading)
//! - `CODETRAIL_CLIENT_KIND`: Client-kind header value
//! - `CODETRAIL_CONNECT_TIMEOUT_MS` / `CODETRAIL_REQUEST_TIMEOUT_MS`
//! - `CODETRAIL_ACCEPT_INVALID_CERTS`: Skip TLS validation (true/false)
//! - `CODETRAIL_IDLE_TIMEOUT_SECS`, `CODETRAIL_IDLE_CHECK_INTERVAL_SECS`,
//!   `CODETRAIL_FLUSH_INTERVAL_SECS`
//! - `CODETRAIL_CONSOLE`: Enable the tracking console (true/false)
//! - `CODETRAIL_BASE_DIR`, `CODETRAIL_CLIENT_ID`, `CODETRAIL_INSTANCE_ID`,
//!   `CODETRAIL_TRACK_SENT`
//! - `CODETRAIL_CLIENT_VERSION`, `CODETRAIL_TIMESTAMP_FORMAT`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` and `./codetrail.{json,toml}` (current working
//!    directory)
//! 2. `../config.{json,toml}` (parent directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use codetrail_domain::{AgentConfig, CodetrailError, Result};

/// Load configuration with automatic fallback strategy
///
/// Environment first, then a probed file.
///
/// # Errors
/// Returns `CodetrailError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<AgentConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Like [`load`], but an absent configuration means defaults.
///
/// # Errors
/// Only when a source exists and is invalid.
pub fn load_or_default() -> Result<AgentConfig> {
    if std::env::var_os("CODETRAIL_API_URL").is_some() {
        return load_from_env();
    }
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration found, using defaults");
            Ok(AgentConfig::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `CODETRAIL_API_URL` must be present; every other variable is optional
/// and falls back to the default.
///
/// # Errors
/// Returns `CodetrailError::Config` if the URL is missing or a value does not
/// parse.
pub fn load_from_env() -> Result<AgentConfig> {
    let mut config = AgentConfig::default();

    config.api.base_url = env_var("CODETRAIL_API_URL")?;
    if let Ok(kind) = std::env::var("CODETRAIL_CLIENT_KIND") {
        config.api.client_kind = kind;
    }
    config.api.connect_timeout_ms =
        env_parse("CODETRAIL_CONNECT_TIMEOUT_MS", config.api.connect_timeout_ms)?;
    config.api.request_timeout_ms =
        env_parse("CODETRAIL_REQUEST_TIMEOUT_MS", config.api.request_timeout_ms)?;
    config.api.accept_invalid_certs =
        env_bool("CODETRAIL_ACCEPT_INVALID_CERTS", config.api.accept_invalid_certs);
    if let Ok(proxy) = std::env::var("CODETRAIL_PROXY_URL") {
        config.api.proxy_url = Some(proxy).filter(|url| !url.is_empty());
    }

    config.tracking.idle_timeout_secs =
        env_parse("CODETRAIL_IDLE_TIMEOUT_SECS", config.tracking.idle_timeout_secs)?;
    config.tracking.idle_check_interval_secs =
        env_parse("CODETRAIL_IDLE_CHECK_INTERVAL_SECS", config.tracking.idle_check_interval_secs)?;
    config.tracking.flush_interval_secs =
        env_parse("CODETRAIL_FLUSH_INTERVAL_SECS", config.tracking.flush_interval_secs)?;
    config.tracking.console_enabled = env_bool("CODETRAIL_CONSOLE", config.tracking.console_enabled);

    if let Some(dir) = std::env::var_os("CODETRAIL_BASE_DIR") {
        config.storage.base_dir = Some(PathBuf::from(dir));
    }
    if let Ok(client_id) = std::env::var("CODETRAIL_CLIENT_ID") {
        config.storage.client_id = client_id;
    }
    if let Ok(instance_id) = std::env::var("CODETRAIL_INSTANCE_ID") {
        config.storage.instance_id = instance_id;
    }
    config.storage.track_sent = env_bool("CODETRAIL_TRACK_SENT", config.storage.track_sent);

    if let Ok(version) = std::env::var("CODETRAIL_CLIENT_VERSION") {
        config.client.version = version;
    }
    if let Ok(pattern) = std::env::var("CODETRAIL_TIMESTAMP_FORMAT") {
        config.client.timestamp_format = pattern;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CodetrailError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<AgentConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CodetrailError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CodetrailError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CodetrailError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<AgentConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CodetrailError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CodetrailError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CodetrailError::Config(format!("Unsupported config format: {}", extension))),
    }
}

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "codetrail.json", "codetrail.toml"];

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CodetrailError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CodetrailError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
