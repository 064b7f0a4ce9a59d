//! `user.json`: API endpoint and user token

use std::path::{Path, PathBuf};

use codetrail_core::CredentialStore;
use codetrail_domain::constants::DEFAULT_API_URL;
use codetrail_domain::{CodetrailError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{io_error, write_atomically};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl UserSettings {
    pub fn api_url_or_default(&self) -> &str {
        self.api_url.as_deref().filter(|url| !url.is_empty()).unwrap_or(DEFAULT_API_URL)
    }
}

/// File-backed settings. Read-modify-write cycles are serialized.
#[derive(Debug)]
pub struct UserSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UserSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields defaults.
    ///
    /// # Errors
    /// `Io` when the file exists but cannot be read, `Decode` when it is not
    /// valid JSON.
    pub fn load(&self) -> Result<UserSettings> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No user settings yet");
                return Ok(UserSettings::default());
            }
            Err(err) => return Err(io_error(&self.path, err)),
        };
        serde_json::from_str(&contents).map_err(|err| {
            CodetrailError::Decode(format!("{}: {err}", self.path.display()))
        })
    }

    /// # Errors
    /// `Io` when the file cannot be written.
    pub fn save(&self, settings: &UserSettings) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write(settings)
    }

    fn write(&self, settings: &UserSettings) -> Result<()> {
        let json = serde_json::to_vec_pretty(settings)
            .map_err(|err| CodetrailError::Internal(format!("user settings: {err}")))?;
        write_atomically(&self.path, &json)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut settings = self.load()?;
        apply(&mut settings);
        self.write(&settings)
    }
}

impl CredentialStore for UserSettingsStore {
    fn load_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.user_token.filter(|token| !token.is_empty()))
    }

    fn save_token(&self, user_token: &str) -> Result<()> {
        self.update(|settings| settings.user_token = Some(user_token.to_string()))
    }

    fn clear_token(&self) -> Result<()> {
        self.update(|settings| settings.user_token = None)
    }
}
