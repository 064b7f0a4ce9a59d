//! # Codetrail Core
//!
//! Activity bookkeeping for the Codetrail agent, free of I/O.
//!
//! This crate contains:
//! - The project registry and per-project transition policy
//! - The flush cycle that drains the registry into outbound batches
//! - The identity service
//! - Port interfaces (traits) for everything that talks to the outside
//!
//! ## Architecture Principles
//! - Only depends on `codetrail-domain`
//! - No file, HTTP or platform code
//! - All external dependencies via traits

pub mod sync;
pub mod tracking;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use sync::ports::{
    ActivityArchive, ActivityEncoder, ActivityForwarder, ArchivedActivity, Delivery,
};
pub use sync::{FlushReport, FlushService};
pub use tracking::{
    ActivityBatch, Clock, HostNotification, IdleChange, ProjectMap, ProjectRegistry, SystemClock,
    TrackingError, TrackingObserver, Transition,
};
pub use user::{CredentialStore, IdentityChange, IdentityService, TokenVerifier};
