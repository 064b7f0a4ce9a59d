//! Directory layout under the agent base directory

use std::path::{Path, PathBuf};

use codetrail_domain::constants::{
    CACHE_DIR, DEFAULT_BASE_DIR_NAME, HISTORY_DIR, USER_SETTINGS_FILE,
};
use codetrail_domain::{CodetrailError, Result, StorageConfig};
use tracing::debug;

use super::io_error;

/// `<base>/`, `<base>/<client_id>/<instance_id>/`, `<base>/history/` and
/// `<base>/cache/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPaths {
    root: PathBuf,
    instance: PathBuf,
    history: PathBuf,
    cache: PathBuf,
}

impl AgentPaths {
    pub fn new(root: impl Into<PathBuf>, client_id: &str, instance_id: &str) -> Self {
        let root = root.into();
        Self {
            instance: root.join(client_id).join(instance_id),
            history: root.join(HISTORY_DIR),
            cache: root.join(CACHE_DIR),
            root,
        }
    }

    /// Layout for `config`; the root defaults to `~/.codealike`.
    ///
    /// # Errors
    /// `Config` when no base dir is configured and the home directory is
    /// unknown.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let root = match &config.base_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_BASE_DIR_NAME))
                .ok_or_else(|| {
                    CodetrailError::Config("cannot resolve home directory for storage".into())
                })?,
        };
        Ok(Self::new(root, &config.client_id, &config.instance_id))
    }

    /// Create every directory of the layout.
    ///
    /// # Errors
    /// `Io` for the first directory that cannot be created.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.instance, &self.history, &self.cache] {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        debug!(root = %self.root.display(), "Storage directories ready");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instance_dir(&self) -> &Path {
        &self.instance
    }

    pub fn history_dir(&self) -> &Path {
        &self.history
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache
    }

    pub fn user_settings_file(&self) -> PathBuf {
        self.root.join(USER_SETTINGS_FILE)
    }
}
