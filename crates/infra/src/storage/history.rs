//! History and cache files
//!
//! One JSON `ActivityInfo` document per file, named
//! `<client_id>-<YYYYMMDDhhmmss>-<batch id>.json`. Cached documents
//! that no longer decode are renamed to `*.invalid` and skipped.

use std::path::{Path, PathBuf};

use chrono::Utc;
use codetrail_core::{ActivityArchive, ArchivedActivity};
use codetrail_domain::constants::FILE_STAMP_FORMAT;
use codetrail_domain::{ActivityInfo, CodetrailError, Result};
use tracing::{debug, warn};

use super::paths::AgentPaths;
use super::{io_error, write_atomically};
use crate::serialization::WireCodec;

const DOCUMENT_EXTENSION: &str = "json";
const QUARANTINE_EXTENSION: &str = "invalid";

/// File-backed [`ActivityArchive`].
#[derive(Debug, Clone)]
pub struct ActivityFiles {
    history_dir: PathBuf,
    cache_dir: PathBuf,
    client_id: String,
    codec: WireCodec,
}

impl ActivityFiles {
    pub fn new(paths: &AgentPaths, client_id: impl Into<String>, codec: WireCodec) -> Self {
        Self {
            history_dir: paths.history_dir().to_path_buf(),
            cache_dir: paths.cache_dir().to_path_buf(),
            client_id: client_id.into(),
            codec,
        }
    }

    fn file_name(&self, activity: &ActivityInfo) -> String {
        format!(
            "{}-{}-{}.{DOCUMENT_EXTENSION}",
            self.client_id,
            Utc::now().format(FILE_STAMP_FORMAT),
            activity.batch_id.simple()
        )
    }

    fn write_document(&self, dir: &Path, activity: &ActivityInfo) -> Result<PathBuf> {
        let path = dir.join(self.file_name(activity));
        let json = serde_json::to_vec_pretty(activity)
            .map_err(|err| CodetrailError::Internal(format!("activity document: {err}")))?;
        write_atomically(&path, &json)?;
        debug!(path = %path.display(), batch_id = %activity.batch_id, "Wrote activity document");
        Ok(path)
    }

    fn read_cached(&self, path: &Path) -> Result<ActivityInfo> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let activity: ActivityInfo = serde_json::from_str(&contents)
            .map_err(|err| CodetrailError::Decode(format!("{}: {err}", path.display())))?;
        self.codec.validate(&activity)?;
        Ok(activity)
    }

    fn quarantine(&self, path: &Path) -> Result<()> {
        let target = path.with_extension(QUARANTINE_EXTENSION);
        std::fs::rename(path, &target).map_err(|e| io_error(path, e))
    }
}

impl ActivityArchive for ActivityFiles {
    fn save_history(&self, activity: &ActivityInfo) -> Result<()> {
        self.write_document(&self.history_dir, activity).map(|_| ())
    }

    fn save_cache(&self, activity: &ActivityInfo) -> Result<()> {
        self.write_document(&self.cache_dir, activity).map(|_| ())
    }

    fn cached(&self) -> Result<Vec<ArchivedActivity>> {
        let entries = std::fs::read_dir(&self.cache_dir).map_err(|e| io_error(&self.cache_dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.cache_dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION) {
                paths.push(path);
            }
        }
        // Names carry the write stamp, so lexical order is oldest first.
        paths.sort();

        let mut cached = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(key) = path.file_name().and_then(|name| name.to_str()).map(str::to_string)
            else {
                continue;
            };
            match self.read_cached(&path) {
                Ok(activity) => cached.push(ArchivedActivity { key, activity }),
                Err(CodetrailError::Decode(reason)) => {
                    warn!(key = %key, reason = %reason, "Cached activity is malformed, quarantining");
                    self.quarantine(&path)?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(cached)
    }

    fn remove_cached(&self, key: &str) -> Result<()> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CodetrailError::Internal(format!("invalid cache key '{key}'")));
        }
        let path = self.cache_dir.join(key);
        std::fs::remove_file(&path).map_err(|e| io_error(&path, e))
    }
}
