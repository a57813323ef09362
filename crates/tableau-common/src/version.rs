//! Format versions for persisted files and the sync protocol.
//!
//! Versions are written as `"<major>.<minor>"` strings. A reader accepts any
//! data with its own major version; minor bumps only add optional fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TableauError, TableauResult};

/// A `major.minor` format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    /// Incompatible layout changes
    pub major: u16,
    /// Additive changes
    pub minor: u16,
}

impl SchemaVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Constructor/display sync protocol.
    pub const SYNC_PROTOCOL: Self = Self::new(1, 0);

    /// Persisted application state.
    pub const APP_STATE: Self = Self::new(1, 0);

    /// Hex overlay `.meta` sidecar.
    pub const OVERLAY_META: Self = Self::new(1, 0);

    /// Whether a reader at this version understands `data`.
    #[must_use]
    pub const fn can_read(&self, data: &Self) -> bool {
        self.major == data.major
    }

    /// Like [`can_read`](Self::can_read), as an error for `?` chains.
    pub fn ensure_readable(&self, data: &Self) -> TableauResult<()> {
        if self.can_read(data) {
            Ok(())
        } else {
            Err(TableauError::VersionMismatch {
                expected: self.to_string(),
                actual: data.to_string(),
            })
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("expected <major>.<minor>, got {s:?}"))?;
        let part = |p: &str| {
            p.parse::<u16>()
                .map_err(|e| format!("bad version component {p:?}: {e}"))
        };
        Ok(Self::new(part(major)?, part(minor)?))
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}
