//! Stored API credentials

use std::fmt;

use crate::constants::TOKEN_SEPARATOR;
use crate::errors::CodetrailError;

/// Identity plus secret token, parsed from the `identity/token` user token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identity: String,
    token: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self { identity: identity.into(), token: token.into() }
    }

    /// Split a user token at the first `/`.
    ///
    /// # Errors
    /// Returns `CodetrailError::Auth` when either half is missing.
    pub fn parse(user_token: &str) -> Result<Self, CodetrailError> {
        match user_token.trim().split_once(TOKEN_SEPARATOR) {
            Some((identity, token)) if !identity.is_empty() && !token.is_empty() => {
                Ok(Self::new(identity, token))
            }
            _ => Err(CodetrailError::Auth("user token must be '<identity>/<token>'".into())),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The `identity/token` form persisted in user settings.
    pub fn user_token(&self) -> String {
        format!("{}{TOKEN_SEPARATOR}{}", self.identity, self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity_and_token() {
        let creds = Credentials::parse("jdoe/abc/def").unwrap();
        assert_eq!(creds.identity(), "jdoe");
        assert_eq!(creds.token(), "abc/def");
        assert_eq!(creds.user_token(), "jdoe/abc/def");
    }

    #[test]
    fn rejects_incomplete_tokens() {
        for raw in ["", "jdoe", "jdoe/", "/abc"] {
            assert!(matches!(Credentials::parse(raw), Err(CodetrailError::Auth(_))), "{raw:?}");
        }
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", Credentials::new("jdoe", "secret"));
        assert!(rendered.contains("jdoe"));
        assert!(!rendered.contains("secret"));
    }
}
