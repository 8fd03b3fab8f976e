//! The hierarchy editing session: one forest snapshot, one drag, one store.

use crate::core::drag::{DragSession, DragState};
use crate::core::drop_zone::{DropIntent, DropTarget, Rect};
use crate::core::events::{emit, HierarchyEvent};
use crate::core::expansion::ExpansionState;
use crate::core::frame::FrameCoalescer;
use crate::core::reconcile::{plan_move, MovePlan, PersistenceDispatcher};
use crate::core::tree::find_by_id;
use crate::{GrimoriumError, HierarchySettings, RegionNode, RegionStore, Result};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Owns everything a region hierarchy view needs while it is open.
///
/// The host forwards pointer input, calls [`on_frame`](Self::on_frame) from
/// its frame callback and renders [`forest`](Self::forest). Drops are
/// applied to the local snapshot immediately; the store catches up in the
/// background and failures arrive as [`HierarchyEvent::PersistenceError`].
pub struct HierarchyEditor<S> {
    book_id: String,
    forest: Vec<RegionNode>,
    expansion: ExpansionState,
    drag: DragSession,
    frames: FrameCoalescer<f32>,
    layout: Vec<DropTarget>,
    settings: HierarchySettings,
    dispatcher: PersistenceDispatcher<S>,
    events: UnboundedSender<HierarchyEvent>,
}

impl<S: RegionStore + 'static> HierarchyEditor<S> {
    /// Creates an editor for `book_id` with an empty snapshot; call
    /// [`reload`](Self::reload) to fetch the forest.
    pub fn new(
        book_id: impl Into<String>,
        store: Arc<Mutex<S>>,
        runtime: Handle,
        settings: HierarchySettings,
    ) -> (Self, UnboundedReceiver<HierarchyEvent>) {
        let (events, receiver) = unbounded_channel();
        let editor = Self {
            book_id: book_id.into(),
            forest: Vec::new(),
            expansion: ExpansionState::new(),
            drag: DragSession::new(),
            frames: FrameCoalescer::new(),
            layout: Vec::new(),
            settings,
            dispatcher: PersistenceDispatcher::new(store, runtime, events.clone()),
            events,
        };
        (editor, receiver)
    }

    /// Replaces the local snapshot with the store's canonical forest.
    ///
    /// Any drag in progress is cancelled, since its ids may no longer
    /// exist, and expansion starts over.
    ///
    /// # Errors
    ///
    /// Returns whatever [`RegionStore::load_forest`] returns; the current
    /// snapshot is kept in that case.
    pub fn reload(&mut self) -> Result<()> {
        let forest = {
            let store = self
                .dispatcher
                .store()
                .lock()
                .map_err(|_| GrimoriumError::Persistence("region store lock poisoned".to_string()))?;
            store.load_forest(&self.book_id)?
        };

        if self.drag.is_dragging() {
            log::info!("reload of book {} cancels the drag in progress", self.book_id);
        }
        self.drag.cancel();
        self.frames.clear();

        if self.settings.expand_on_load {
            self.expansion.reset_for(&forest);
        } else {
            self.expansion.clear();
        }
        self.forest = forest;
        log::info!("loaded region hierarchy for book {}", self.book_id);
        Ok(())
    }

    #[must_use]
    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// The snapshot to render. Includes optimistic moves not yet persisted.
    #[must_use]
    pub fn forest(&self) -> &[RegionNode] {
        &self.forest
    }

    #[must_use]
    pub fn settings(&self) -> &HierarchySettings {
        &self.settings
    }

    #[must_use]
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn toggle_expanded(&mut self, region_id: &str) -> bool {
        self.expansion.toggle(region_id)
    }

    #[must_use]
    pub fn is_expanded(&self, region_id: &str) -> bool {
        self.expansion.is_expanded(region_id)
    }

    /// Registers where the host drew each drop target this frame.
    pub fn set_layout(&mut self, layout: Vec<DropTarget>) {
        self.layout = layout;
    }

    #[must_use]
    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// What releasing now would do, if anything.
    #[must_use]
    pub fn current_intent(&self) -> Option<&DropIntent> {
        self.drag.active().and_then(|drag| drag.intent.as_ref())
    }

    /// Starts dragging `region_id`. Returns false for an id not in the snapshot.
    pub fn pointer_down(&mut self, region_id: &str) -> bool {
        if find_by_id(&self.forest, region_id).is_none() {
            log::debug!("ignoring drag start on unknown region {region_id}");
            return false;
        }
        self.frames.clear();
        self.drag.begin(region_id);
        true
    }

    /// Records the dragged element's current rectangle for the next frame.
    pub fn pointer_move(&mut self, dragged_rect: Rect) {
        if self.drag.is_dragging() {
            self.frames.request(dragged_rect.center_y());
        }
    }

    /// Reclassifies the drag using the latest pointer sample, at most once per call.
    pub fn on_frame(&mut self) {
        if let Some(center_y) = self.frames.take_for_frame() {
            self.reclassify(center_y);
        }
    }

    fn reclassify(&mut self, center_y: f32) {
        self.drag
            .update(&self.forest, &self.layout, center_y, self.settings.gap_size);
    }

    /// Ends the drag and applies it.
    ///
    /// Returns the handle of the background persistence task when the drop
    /// moved something. Invalid drops (stale ids, cycles) and drops that
    /// change nothing return `None` and leave the snapshot as it was.
    pub fn pointer_up(&mut self) -> Option<JoinHandle<Result<()>>> {
        if let Some(center_y) = self.frames.flush() {
            self.reclassify(center_y);
        }
        let (dragged_id, intent) = self.drag.finish()?;

        let plan = match plan_move(&self.forest, &dragged_id, &intent) {
            Ok(plan) => plan,
            Err(e) => {
                log::debug!("drop of {dragged_id} ignored: {e}");
                return None;
            }
        };
        if plan.is_noop() {
            return None;
        }

        let parent_changed = plan.parent_changed();
        let MovePlan {
            forest,
            region_id,
            new_parent_id,
            sibling_ids,
            requests,
            ..
        } = plan;

        self.forest = forest;
        if let Some(parent_id) = &new_parent_id {
            self.expansion.expand(parent_id);
        }
        log::info!("region {region_id} moved under {new_parent_id:?}");

        if parent_changed {
            emit(
                &self.events,
                HierarchyEvent::MoveApplied {
                    region_id,
                    new_parent_id: new_parent_id.clone(),
                },
            );
        }
        emit(
            &self.events,
            HierarchyEvent::ReorderApplied {
                ordered_ids: sibling_ids,
                parent_id: new_parent_id,
            },
        );

        Some(self.dispatcher.dispatch(requests))
    }

    /// Abandons the drag in progress (Escape, or a cancel from the host).
    pub fn cancel(&mut self) {
        self.drag.cancel();
        self.frames.clear();
    }
}
