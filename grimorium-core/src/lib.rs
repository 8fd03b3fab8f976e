//! Core library for Grimorium's region hierarchy: nested places (city,
//! country, planet, ...) that writers rearrange by dragging.
//!
//! The primary entry point is [`HierarchyEditor`], which owns the local
//! forest snapshot for one book, turns pointer input into drop intents and
//! applies moves optimistically while a [`RegionStore`] persists them in the
//! background. [`SqliteRegionStore`] is the bundled store.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    delete::{DeleteResult, DeleteStrategy},
    drag::{ActiveDrag, DragSession, DragState},
    drop_zone::{DropIntent, DropTarget, DropZone, Rect, DEFAULT_GAP_SIZE},
    editor::HierarchyEditor,
    error::{GrimoriumError, Result},
    events::HierarchyEvent,
    expansion::ExpansionState,
    frame::FrameCoalescer,
    operation::Operation,
    operation_log::{OperationLog, OperationSummary, PurgeStrategy},
    reconcile::{plan_move, MovePlan, PersistRequest, PersistenceDispatcher},
    region::{Region, RegionNode, RegionScale},
    settings::{
        load_settings, load_settings_from, save_settings_to, settings_file_path, HierarchySettings,
    },
    storage::Storage,
    store::{RegionStore, SqliteRegionStore},
    tree::SiblingPosition,
};
