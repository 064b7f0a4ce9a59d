//! Agent constants
//!
//! Defaults shared by the configuration structs, the transport and the
//! on-disk layout.

// Remote service
pub const DEFAULT_API_URL: &str = "https://codealike.com/api/v2";
pub const DEFAULT_CLIENT_KIND: &str = "intellij";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

// Identity headers attached to every request
pub const HEADER_CLIENT_KIND: &str = "X-Eauth-Client";
pub const HEADER_API_IDENTITY: &str = "X-Api-Identity";
pub const HEADER_API_TOKEN: &str = "X-Api-Token";
/// Response header carrying the server's human-readable outcome.
pub const HEADER_REASON: &str = "reason";

pub const DEFAULT_SUCCESS_REASON: &str = "OK";
pub const DEFAULT_FAILURE_REASON: &str = "Error";

// Tracking timings
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_IDLE_CHECK_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 300;
/// Timer intervals are capped so that scheduling deadlines stay representable.
pub const MAX_TIMER_INTERVAL_SECS: u64 = 86_400;

// Local storage
pub const DEFAULT_BASE_DIR_NAME: &str = ".codealike";
pub const USER_SETTINGS_FILE: &str = "user.json";
pub const HISTORY_DIR: &str = "history";
pub const CACHE_DIR: &str = "cache";
/// Timestamp portion of history/cache file names.
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Separator between identity and token in a stored user token.
pub const TOKEN_SEPARATOR: char = '/';

/// Message of the health record sent when startup fails.
pub const HEALTH_STARTUP_MESSAGE: &str = "Plugin could not start.";

/// Tracing target for the tracking console.
pub const CONSOLE_TARGET: &str = "codetrail::console";
