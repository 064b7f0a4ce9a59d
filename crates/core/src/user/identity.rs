//! Identity service
//!
//! Owns the logged-in credentials and tells interested parties (transport
//! headers, project reload) when they change.

use std::sync::Arc;

use codetrail_domain::{CodetrailError, Credentials, Result};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::ports::{CredentialStore, TokenVerifier};

/// Login state transition delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    LoggedIn(Credentials),
    LoggedOut,
}

type Listener = Arc<dyn Fn(&IdentityChange) + Send + Sync>;

pub struct IdentityService {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn CredentialStore>,
    current: RwLock<Option<Credentials>>,
    listeners: RwLock<Vec<Listener>>,
}

impl IdentityService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn CredentialStore>) -> Self {
        Self { verifier, store, current: RwLock::new(None), listeners: RwLock::new(Vec::new()) }
    }

    /// Register a callback fired on every login and logout.
    pub fn on_change(&self, listener: impl Fn(&IdentityChange) + Send + Sync + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.current.read().clone()
    }

    pub fn identity(&self) -> Option<String> {
        self.current.read().as_ref().map(|c| c.identity().to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Verify a `identity/token` user token, persist it and notify listeners.
    ///
    /// # Errors
    /// `Auth` for malformed or rejected tokens, `Network` when the server is
    /// unreachable, `Io` when the token cannot be stored.
    pub async fn login(&self, user_token: &str) -> Result<()> {
        let credentials = Credentials::parse(user_token)?;
        self.verifier.verify(&credentials).await?;
        self.store.save_token(&credentials.user_token())?;

        info!(identity = %credentials.identity(), "Logged in");
        *self.current.write() = Some(credentials.clone());
        self.fire(&IdentityChange::LoggedIn(credentials));
        Ok(())
    }

    /// Forget the stored token and notify listeners.
    ///
    /// # Errors
    /// `Io` when the stored token cannot be removed.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear_token()?;
        let previous = self.current.write().take();
        if let Some(previous) = previous {
            info!(identity = %previous.identity(), "Logged out");
            self.fire(&IdentityChange::LoggedOut);
        }
        Ok(())
    }

    /// Log in with the token saved by a previous session.
    ///
    /// Returns whether a login happened. A rejected or unverifiable token is
    /// logged and leaves the service logged out.
    ///
    /// # Errors
    /// Only when the settings store itself cannot be read.
    pub async fn try_login_with_stored_credentials(&self) -> Result<bool> {
        let Some(token) = self.store.load_token()? else {
            return Ok(false);
        };

        match self.login(&token).await {
            Ok(()) => Ok(true),
            Err(CodetrailError::Io(message)) => Err(CodetrailError::Io(message)),
            Err(err) => {
                warn!(error = %err, "Stored credentials could not be used");
                Ok(false)
            }
        }
    }

    fn fire(&self, change: &IdentityChange) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener(change);
        }
    }
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}
