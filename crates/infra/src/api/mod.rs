//! Remote collection service API
//!
//! This module provides the envelope-returning API client, the failure
//! taxonomy used to decide what happens to a batch, the core port
//! implementations backed by the client, and health reporting.
//!
//! # Architecture
//!
//! - Uses [`crate::http::HttpClient`] (no direct reqwest calls elsewhere)
//! - Single attempt per call; retry is the flush cycle's job
//! - Transport failures become [`ApiResponse`] values, never errors

pub mod client;
pub mod errors;
pub mod forwarder;
pub mod health;
pub mod response;

pub use client::{ApiClient, ApiClientConfig};
pub use errors::ApiErrorCategory;
pub use forwarder::ApiForwarder;
pub use health::HealthReporter;
pub use response::{ApiResponse, ApiStatus};
