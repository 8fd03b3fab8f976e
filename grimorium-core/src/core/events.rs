//! Notifications the hierarchy editor sends to its host.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Something the host UI may want to react to (toasts, confirmations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HierarchyEvent {
    /// A region changed parent in the local snapshot.
    MoveApplied {
        region_id: String,
        new_parent_id: Option<String>,
    },
    /// A sibling list changed order in the local snapshot.
    ReorderApplied {
        ordered_ids: Vec<String>,
        parent_id: Option<String>,
    },
    /// The store rejected a request; the local snapshot is ahead of it until reload.
    PersistenceError { message: String },
}

/// Sends `event`, tolerating a host that stopped listening.
pub(crate) fn emit(sender: &UnboundedSender<HierarchyEvent>, event: HierarchyEvent) {
    if sender.send(event).is_err() {
        log::debug!("hierarchy event dropped: receiver closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_for_the_host() {
        let event = HierarchyEvent::MoveApplied {
            region_id: "a".to_string(),
            new_parent_id: Some("b".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"moveApplied\""));
        assert!(json.contains("\"regionId\":\"a\""));
        assert!(json.contains("\"newParentId\":\"b\""));
    }
}
