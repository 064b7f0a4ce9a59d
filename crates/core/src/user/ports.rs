//! Port interfaces for user identity

use async_trait::async_trait;
use codetrail_domain::{Credentials, Result};

/// Checks credentials against the remote service.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    /// `CodetrailError::Auth` when the server rejects the token,
    /// `CodetrailError::Network` when it cannot be reached.
    async fn verify(&self, credentials: &Credentials) -> Result<()>;
}

/// Persists the user token between sessions.
pub trait CredentialStore: Send + Sync {
    fn load_token(&self) -> Result<Option<String>>;

    fn save_token(&self, user_token: &str) -> Result<()>;

    fn clear_token(&self) -> Result<()>;
}
