//! Domain types and models

pub mod activity;
pub mod credentials;
pub mod dto;
pub mod event;
pub mod state;
pub mod version;

pub use activity::{ActivityKind, CodeContext};
pub use credentials::Credentials;
pub use dto::{
    ActivityEntryInfo, ActivityInfo, CodeContextInfo, HealthInfo, HealthLevel, ProfileInfo,
    SolutionContextInfo, UserConfigurationInfo, VersionInfo,
};
pub use event::ActivityEvent;
pub use state::{ActivityState, StateVariant};
pub use version::ClientVersion;
