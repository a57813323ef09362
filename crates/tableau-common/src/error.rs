//! Error types for Tableau.

use thiserror::Error;

/// Top-level error type for Tableau operations.
#[derive(Debug, Error)]
pub enum TableauError {
    /// Grid geometry precondition errors
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Persistence collaborator errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cross-surface channel errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Grid overlay rendering errors
    #[error("Overlay error: {0}")]
    Overlay(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Grid geometry precondition violations.
///
/// Callers must reject these before computing a grid; every spacing formula
/// divides by a value derived from the hex size.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Hex size is zero, negative, or not finite
    #[error("Hex size must be positive, got {0}")]
    NonPositiveHexSize(f64),

    /// Container has no area
    #[error("Container must have a positive size, got {width}x{height}")]
    EmptyContainer {
        /// Container width
        width: f64,
        /// Container height
        height: f64,
    },
}

/// Persistence collaborator errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Chapter file missing
    #[error("Chapter '{0}' not found")]
    ChapterNotFound(String),

    /// An operation needs an open chapter
    #[error("No chapter is open")]
    NoChapterOpen,

    /// Chapter already exists
    #[error("Chapter '{0}' already exists")]
    ChapterExists(String),

    /// Battlemap missing from the chapter
    #[error("Battlemap '{battlemap}' not found in chapter '{chapter}'")]
    BattlemapNotFound {
        /// Battlemap id
        battlemap: String,
        /// Chapter id
        chapter: String,
    },

    /// Entity missing
    #[error("Entity '{0}' not found")]
    EntityNotFound(String),

    /// Entity already placed in the scene
    #[error("Entity '{0}' already exists")]
    DuplicateEntity(String),

    /// Icon name is not `<id>.png`
    #[error("Invalid icon name '{0}', expected '<id>.png'")]
    InvalidIcon(String),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cross-surface channel errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Channel is at capacity; the message was dropped
    #[error("Sync channel is full")]
    Full,

    /// The other surface has gone away
    #[error("Sync peer disconnected")]
    Disconnected,
}

/// Result type alias for Tableau operations.
pub type TableauResult<T> = Result<T, TableauError>;
