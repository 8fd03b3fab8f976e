//! State machine for a single drag gesture.

use crate::core::drop_zone::{hit_test, resolve_intent, DropIntent, DropTarget};
use crate::RegionNode;

/// A drag that has started and not yet been released or cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub dragged_id: String,
    /// Region row currently under the dragged element, if any.
    pub hover_target_id: Option<String>,
    /// What releasing right now would do.
    pub intent: Option<DropIntent>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Tracks the in-progress drag for one hierarchy editor.
#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Starts dragging `dragged_id`. An unfinished drag is discarded.
    pub fn begin(&mut self, dragged_id: impl Into<String>) {
        let dragged_id = dragged_id.into();
        if let DragState::Dragging(previous) = &self.state {
            log::debug!(
                "drag of {} replaced by a new drag of {dragged_id}",
                previous.dragged_id
            );
        }
        self.state = DragState::Dragging(ActiveDrag {
            dragged_id,
            hover_target_id: None,
            intent: None,
        });
    }

    /// Recomputes the hovered row and drop intent for a dragged centre at
    /// `center_y`. Nothing happens while idle.
    pub fn update(&mut self, forest: &[RegionNode], layout: &[DropTarget], center_y: f32, gap: f32) {
        let DragState::Dragging(drag) = &mut self.state else {
            return;
        };
        match hit_test(layout, &drag.dragged_id, center_y, gap) {
            Some(target) => {
                drag.hover_target_id = target.region_id().map(str::to_string);
                drag.intent = resolve_intent(forest, &drag.dragged_id, target, center_y, gap);
            }
            None => {
                drag.hover_target_id = None;
                drag.intent = None;
            }
        }
    }

    /// Ends the drag. Returns the dragged id and intent when a release
    /// should move something.
    pub fn finish(&mut self) -> Option<(String, DropIntent)> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(ActiveDrag {
                dragged_id,
                intent: Some(intent),
                ..
            }) => Some((dragged_id, intent)),
            _ => None,
        }
    }

    /// Abandons the drag without producing a move.
    pub fn cancel(&mut self) {
        if let DragState::Dragging(drag) = std::mem::take(&mut self.state) {
            log::debug!("drag of {} cancelled", drag.dragged_id);
        }
    }
}
