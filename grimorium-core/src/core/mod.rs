//! Internal domain modules for the Grimorium core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod delete;
pub mod drag;
pub mod drop_zone;
pub mod editor;
pub mod error;
pub mod events;
pub mod expansion;
pub mod frame;
pub mod operation;
pub mod operation_log;
pub mod reconcile;
pub mod region;
pub mod settings;
pub mod storage;
pub mod store;
pub mod tree;

#[doc(inline)]
pub use delete::{DeleteResult, DeleteStrategy};
#[doc(inline)]
pub use drag::{ActiveDrag, DragSession, DragState};
#[doc(inline)]
pub use drop_zone::{DropIntent, DropTarget, DropZone, Rect, DEFAULT_GAP_SIZE};
#[doc(inline)]
pub use editor::HierarchyEditor;
#[doc(inline)]
pub use error::{GrimoriumError, Result};
#[doc(inline)]
pub use events::HierarchyEvent;
#[doc(inline)]
pub use expansion::ExpansionState;
#[doc(inline)]
pub use frame::FrameCoalescer;
#[doc(inline)]
pub use operation::Operation;
#[doc(inline)]
pub use operation_log::{OperationLog, OperationSummary, PurgeStrategy};
#[doc(inline)]
pub use reconcile::{plan_move, MovePlan, PersistRequest, PersistenceDispatcher};
#[doc(inline)]
pub use region::{Region, RegionNode, RegionScale};
#[doc(inline)]
pub use settings::HierarchySettings;
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use store::{RegionStore, SqliteRegionStore};
