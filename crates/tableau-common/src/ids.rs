//! ID types for entities, scenes, and chapters.
//!
//! All ids are string newtypes serialized transparently, matching the file
//! names the persistence layer uses.

use serde::{Deserialize, Serialize};

/// Icon image file extension used by entity tokens.
const ICON_EXTENSION: &str = ".png";

/// Identity of a placed entity: its token image file name (`<stem>.png`).
///
/// Unique within a combat scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconId(String);

impl IconId {
    /// Creates an icon id from a file name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the raw file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without the `.png` extension, or `None` when the id is not a
    /// png file name.
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.0
            .trim()
            .strip_suffix(ICON_EXTENSION)
            .filter(|stem| !stem.is_empty())
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IconId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a combat scene: its battlemap image file name.
///
/// The empty id means "no combat active".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattlemapId(String);

impl BattlemapId {
    /// No active battlemap.
    #[must_use]
    pub const fn none() -> Self {
        Self(String::new())
    }

    /// Creates a battlemap id from a file name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the raw file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id denotes "no combat active".
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for BattlemapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BattlemapId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a chapter (a campaign session file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    /// Creates a chapter id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the raw chapter name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system friendly form: lower-cased, spaces replaced by `_`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0.trim().to_lowercase().replace(' ', "_")
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChapterId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
