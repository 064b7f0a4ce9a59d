//! # Codetrail Domain
//!
//! Activity model and wire types for the Codetrail IDE agent.
//!
//! This crate contains:
//! - Activity kinds, states (with idle/null sentinel variants) and events
//! - Wire DTOs and canonical duration/timestamp encodings
//! - Configuration structures and defaults
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other Codetrail crates
//! - No I/O: everything here is pure data and formatting

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::TimestampFormat;
