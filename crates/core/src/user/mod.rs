//! User identity and login state

pub mod identity;
pub mod ports;

pub use identity::{IdentityChange, IdentityService};
pub use ports::{CredentialStore, TokenVerifier};
