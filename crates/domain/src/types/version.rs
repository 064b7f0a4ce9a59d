//! Four-part client versions (`Major.Minor.Build.Revision`)

use std::fmt;
use std::str::FromStr;

use crate::errors::CodetrailError;

/// Missing trailing components count as zero, so `1.2` equals `1.2.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClientVersion([u32; 4]);

impl ClientVersion {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self([major, minor, build, revision])
    }
}

impl FromStr for ClientVersion {
    type Err = CodetrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodetrailError::Config(format!("invalid client version '{s}'"));
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let mut parts = [0_u32; 4];
        for (index, part) in trimmed.split('.').enumerate() {
            let slot = parts.get_mut(index).ok_or_else(invalid)?;
            *slot = part.parse().map_err(|_| invalid())?;
        }
        Ok(Self(parts))
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, build, revision] = self.0;
        write!(f, "{major}.{minor}.{build}.{revision}")
    }
}
