//! # Codetrail Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client and the envelope-returning API client
//! - Wire serialization of drained batches
//! - Health reporting and the tracking scheduler
//! - Configuration loading and local user-settings/history/cache files
//! - The tracking console
//!
//! ## Architecture
//! - Implements traits defined in `codetrail-core`
//! - Contains all "impure" code (network, file system, timers)

pub mod api;
pub mod config;
pub mod console;
pub mod errors;
pub mod http;
pub mod scheduling;
pub mod serialization;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig, ApiForwarder, ApiResponse, ApiStatus, HealthReporter};
pub use console::TrackingConsole;
pub use errors::InfraError;
pub use http::HttpClient;
pub use scheduling::{SchedulerConfig, TrackingScheduler};
pub use serialization::WireCodec;
pub use storage::{ActivityFiles, AgentPaths, UserSettings, UserSettingsStore};
