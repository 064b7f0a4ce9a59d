//! Activity tracking: the per-project state machine and its registry

pub mod batch;
pub mod errors;
pub mod notifications;
pub mod ports;
pub mod project_map;
pub mod registry;
pub mod slot;

pub use batch::ActivityBatch;
pub use errors::TrackingError;
pub use notifications::HostNotification;
pub use ports::{Clock, SystemClock, TrackingObserver};
pub use project_map::ProjectMap;
pub use registry::ProjectRegistry;
pub use slot::{IdleChange, Transition};
