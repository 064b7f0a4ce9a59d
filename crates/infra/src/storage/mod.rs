//! Local files: user settings, sent-batch history and unsent-batch cache
//!
//! Every read and write returns a `Result`; nothing here swallows an I/O
//! failure.

pub mod history;
pub mod paths;
pub mod settings;

use std::path::Path;

use codetrail_domain::CodetrailError;

pub use history::ActivityFiles;
pub use paths::AgentPaths;
pub use settings::{UserSettings, UserSettingsStore};

use crate::errors::InfraError;

fn io_error(path: &Path, err: std::io::Error) -> CodetrailError {
    match CodetrailError::from(InfraError::from(err)) {
        CodetrailError::Io(message) => CodetrailError::Io(format!("{}: {message}", path.display())),
        other => other,
    }
}

/// Write through a sibling temp file so readers never see a partial document.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), CodetrailError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(|e| io_error(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}
