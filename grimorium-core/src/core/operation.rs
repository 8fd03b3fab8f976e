//! Hierarchy mutations recorded in the operation log.

use serde::{Deserialize, Serialize};

/// A single hierarchy change recorded by the store.
///
/// Every variant carries a stable `operation_id` and a wall-clock
/// `timestamp` so the log can be inspected or replayed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// A region was attached to a new parent (or to the top level).
    MoveRegion {
        /// Stable UUID for this operation.
        operation_id: String,
        /// Unix timestamp (seconds) when the operation was created.
        timestamp: i64,
        /// ID of the region that was moved.
        region_id: String,
        /// New parent region ID, or `None` for the top level.
        new_parent_id: Option<String>,
        /// Sibling position the region received under its new parent.
        new_order_index: i32,
    },
    /// The complete sibling order under one parent was replaced.
    ReorderRegions {
        /// Stable UUID for this operation.
        operation_id: String,
        /// Unix timestamp (seconds) when the operation was created.
        timestamp: i64,
        /// Parent whose children were reordered, or `None` for the top level.
        parent_id: Option<String>,
        /// Sibling IDs in their new order.
        ordered_ids: Vec<String>,
    },
}

impl Operation {
    #[must_use]
    pub fn operation_id(&self) -> &str {
        match self {
            Self::MoveRegion { operation_id, .. } | Self::ReorderRegions { operation_id, .. } => {
                operation_id
            }
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::MoveRegion { timestamp, .. } | Self::ReorderRegions { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Name stored in the `operation_type` column.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MoveRegion { .. } => "MoveRegion",
            Self::ReorderRegions { .. } => "ReorderRegions",
        }
    }
}
