//! Error types for the Grimorium core library.

use thiserror::Error;

/// All errors that can occur within the Grimorium core library.
#[derive(Debug, Error)]
pub enum GrimoriumError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A region ID was referenced that does not exist in the current forest or store.
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// A drop would make a region a child of itself or of one of its descendants.
    #[error("Move rejected, would create a cycle: {0}")]
    CycleRejected(String),

    /// The backing store refused a reparent or reorder request.
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// A persistence request failed after the optimistic update was applied.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The opened file is not a valid Grimorium database.
    #[error("Invalid workspace: {0}")]
    InvalidWorkspace(String),

    /// A stored value could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`GrimoriumError`].
pub type Result<T> = std::result::Result<T, GrimoriumError>;

impl GrimoriumError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::RegionNotFound(_) => "Region no longer exists".to_string(),
            Self::CycleRejected(_) => "A region cannot be moved inside itself".to_string(),
            Self::InvalidMove(msg) => msg.clone(),
            Self::Persistence(msg) => format!("Could not save the new hierarchy: {msg}"),
            Self::InvalidWorkspace(_) => "Could not open the world database".to_string(),
            Self::InvalidData(msg) => format!("Data format error: {msg}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }

    /// True for rejections that are expected while a drag is moving fast
    /// (stale ids, illegal targets). These are ignored rather than reported.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RegionNotFound(_) | Self::CycleRejected(_))
    }
}
