//! How a region deletion treats the regions beneath it.
//!
//! Deletion is never part of a drag: the host asks the store to delete,
//! then reloads the hierarchy editor so the canonical forest replaces the
//! local snapshot.
//!
//! ```rust
//! use grimorium_core::DeleteStrategy;
//!
//! let json = serde_json::to_string(&DeleteStrategy::PromoteChildren).unwrap();
//! assert_eq!(json, r#""PromoteChildren""#);
//! ```

use serde::{Deserialize, Serialize};

/// Determines what happens to the children of a deleted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeleteStrategy {
    /// Delete the region and every region beneath it.
    DeleteAll,

    /// Delete only the region; its direct children move up to its former
    /// parent, after the existing siblings and in their current order.
    PromoteChildren,
}

/// The outcome of [`SqliteRegionStore::delete_region`](crate::SqliteRegionStore::delete_region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Number of regions permanently removed.
    pub deleted_count: usize,

    /// IDs of every region that was removed or re-parented.
    pub affected_ids: Vec<String>,
}
