//! Optimistic application of drops and the persistence requests behind them.
//!
//! A release is applied to a fresh copy of the local forest right away; the
//! matching reparent/reorder requests go to the store on a blocking task.
//! Nothing is rolled back when the store refuses: the failure is reported
//! and the next reload brings the canonical forest back.

use crate::core::drop_zone::{DropIntent, DropZone};
use crate::core::events::{emit, HierarchyEvent};
use crate::core::tree::{
    append_root, insert_as_child, insert_as_sibling, is_ancestor, locate, sibling_ids, take,
    SiblingPosition,
};
use crate::{GrimoriumError, RegionNode, RegionStore, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// One authoritative mutation for the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PersistRequest {
    Reparent {
        region_id: String,
        new_parent_id: Option<String>,
    },
    Reorder {
        sibling_ids: Vec<String>,
        parent_id: Option<String>,
    },
}

/// The result of applying a drop to the local forest.
#[derive(Debug, Clone)]
pub struct MovePlan {
    /// The forest after the move. Built from a copy; the input is untouched.
    pub forest: Vec<RegionNode>,
    pub region_id: String,
    pub old_parent_id: Option<String>,
    pub new_parent_id: Option<String>,
    /// Complete sibling order of the moved region's new container.
    pub sibling_ids: Vec<String>,
    /// Requests to send, in order. Empty when the drop changed nothing.
    pub requests: Vec<PersistRequest>,
}

impl MovePlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.requests.is_empty()
    }

    #[must_use]
    pub fn parent_changed(&self) -> bool {
        self.old_parent_id != self.new_parent_id
    }
}

/// Moves `dragged_id` according to `intent` in a copy of `forest`.
///
/// # Errors
///
/// Returns [`GrimoriumError::RegionNotFound`] if the dragged region or the
/// target is not in `forest`, and [`GrimoriumError::CycleRejected`] if the
/// target is the dragged region or lies beneath it. `forest` is unchanged
/// in every case.
pub fn plan_move(forest: &[RegionNode], dragged_id: &str, intent: &DropIntent) -> Result<MovePlan> {
    let (old_parent_id, _) = locate(forest, dragged_id)
        .ok_or_else(|| GrimoriumError::RegionNotFound(dragged_id.to_string()))?;
    let old_siblings = sibling_ids(forest, old_parent_id.as_deref()).unwrap_or_default();
    let (rest, moved) = take(forest, dragged_id)
        .ok_or_else(|| GrimoriumError::RegionNotFound(dragged_id.to_string()))?;

    let new_forest = match intent {
        DropIntent::Root => append_root(&rest, moved),
        DropIntent::Zone(zone) => {
            if is_ancestor(&moved, zone.target_id()) {
                return Err(GrimoriumError::CycleRejected(format!(
                    "{dragged_id} onto {}",
                    zone.target_id()
                )));
            }
            match zone {
                DropZone::Inside(target) => insert_as_child(&rest, target, moved)?,
                DropZone::Before(target) => {
                    insert_as_sibling(&rest, target, moved, SiblingPosition::Before)?
                }
                DropZone::After(target) => {
                    insert_as_sibling(&rest, target, moved, SiblingPosition::After)?
                }
            }
        }
    };

    let (new_parent_id, _) = locate(&new_forest, dragged_id)
        .ok_or_else(|| GrimoriumError::RegionNotFound(dragged_id.to_string()))?;
    let siblings = sibling_ids(&new_forest, new_parent_id.as_deref()).unwrap_or_default();

    let mut requests = Vec::new();
    if new_parent_id != old_parent_id {
        requests.push(PersistRequest::Reparent {
            region_id: dragged_id.to_string(),
            new_parent_id: new_parent_id.clone(),
        });
    }
    if new_parent_id != old_parent_id || siblings != old_siblings {
        requests.push(PersistRequest::Reorder {
            sibling_ids: siblings.clone(),
            parent_id: new_parent_id.clone(),
        });
    }

    Ok(MovePlan {
        forest: new_forest,
        region_id: dragged_id.to_string(),
        old_parent_id,
        new_parent_id,
        sibling_ids: siblings,
        requests,
    })
}

/// Sends persistence requests to a shared store without blocking the caller.
pub struct PersistenceDispatcher<S> {
    store: Arc<Mutex<S>>,
    runtime: Handle,
    events: UnboundedSender<HierarchyEvent>,
}

impl<S: RegionStore + 'static> PersistenceDispatcher<S> {
    pub fn new(
        store: Arc<Mutex<S>>,
        runtime: Handle,
        events: UnboundedSender<HierarchyEvent>,
    ) -> Self {
        Self {
            store,
            runtime,
            events,
        }
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Applies `requests` in order on a blocking task.
    ///
    /// The returned handle resolves to `Err(GrimoriumError::Persistence)` if
    /// any request fails; a [`HierarchyEvent::PersistenceError`] is emitted
    /// at the same time. Concurrent dispatches are not ordered against each
    /// other.
    pub fn dispatch(&self, requests: Vec<PersistRequest>) -> JoinHandle<Result<()>> {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        self.runtime.spawn_blocking(move || {
            let result = apply_requests(&store, &requests);
            if let Err(e) = &result {
                log::warn!("hierarchy persistence failed: {e}");
                emit(
                    &events,
                    HierarchyEvent::PersistenceError {
                        message: e.user_message(),
                    },
                );
            }
            result
        })
    }
}

fn apply_requests<S: RegionStore>(store: &Mutex<S>, requests: &[PersistRequest]) -> Result<()> {
    let mut store = store
        .lock()
        .map_err(|_| GrimoriumError::Persistence("region store lock poisoned".to_string()))?;
    for request in requests {
        let outcome = match request {
            PersistRequest::Reparent {
                region_id,
                new_parent_id,
            } => store.persist_reparent(region_id, new_parent_id.as_deref()),
            PersistRequest::Reorder {
                sibling_ids,
                parent_id,
            } => store.persist_reorder(sibling_ids, parent_id.as_deref()),
        };
        outcome.map_err(|e| GrimoriumError::Persistence(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::tree::tests::{dump, node};
    use crate::core::tree::{count, find_by_id};
    use tokio::sync::mpsc::unbounded_channel;

    /// Records requests and optionally refuses them.
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub(crate) forest: Vec<RegionNode>,
        pub(crate) applied: Vec<PersistRequest>,
        pub(crate) fail: bool,
    }

    impl RegionStore for RecordingStore {
        fn load_forest(&self, _book_id: &str) -> Result<Vec<RegionNode>> {
            Ok(self.forest.clone())
        }

        fn persist_reparent(&mut self, region_id: &str, new_parent_id: Option<&str>) -> Result<()> {
            if self.fail {
                return Err(GrimoriumError::InvalidMove("store offline".to_string()));
            }
            self.applied.push(PersistRequest::Reparent {
                region_id: region_id.to_string(),
                new_parent_id: new_parent_id.map(str::to_string),
            });
            Ok(())
        }

        fn persist_reorder(&mut self, sibling_ids: &[String], parent_id: Option<&str>) -> Result<()> {
            if self.fail {
                return Err(GrimoriumError::InvalidMove("store offline".to_string()));
            }
            self.applied.push(PersistRequest::Reorder {
                sibling_ids: sibling_ids.to_vec(),
                parent_id: parent_id.map(str::to_string),
            });
            Ok(())
        }
    }

    fn inside(id: &str) -> DropIntent {
        DropIntent::Zone(DropZone::Inside(id.to_string()))
    }

    #[test]
    fn test_reparent_via_child_drop() {
        let forest = vec![node("a", vec![]), node("b", vec![])];
        let plan = plan_move(&forest, "a", &inside("b")).unwrap();
        assert_eq!(dump(&plan.forest), "b\n  a");
        assert_eq!(find_by_id(&plan.forest, "a").unwrap().parent_id.as_deref(), Some("b"));
        assert_eq!(
            plan.requests,
            vec![
                PersistRequest::Reparent {
                    region_id: "a".into(),
                    new_parent_id: Some("b".into())
                },
                PersistRequest::Reorder {
                    sibling_ids: vec!["a".into()],
                    parent_id: Some("b".into())
                },
            ]
        );
        // the rendered forest is untouched
        assert_eq!(dump(&forest), "a\nb");
    }

    #[test]
    fn test_sibling_reorder() {
        let forest = vec![node("a", vec![]), node("b", vec![]), node("c", vec![])];
        let plan = plan_move(&forest, "c", &DropIntent::Zone(DropZone::Before("a".into())))
            .unwrap();
        assert_eq!(dump(&plan.forest), "c\na\nb");
        assert!(!plan.parent_changed());
        assert_eq!(
            plan.requests,
            vec![PersistRequest::Reorder {
                sibling_ids: vec!["c".into(), "a".into(), "b".into()],
                parent_id: None
            }]
        );
    }

    #[test]
    fn test_rejected_cycle_leaves_forest_alone() {
        let forest = vec![node("a", vec![node("b", vec![])])];
        let err = plan_move(&forest, "a", &inside("b")).unwrap_err();
        assert!(matches!(err, GrimoriumError::CycleRejected(_)));
        assert_eq!(dump(&forest), "a\n  b");
    }

    #[test]
    fn test_every_zone_under_a_descendant_is_rejected() {
        let forest = vec![node("a", vec![node("b", vec![node("c", vec![])])]), node("d", vec![])];
        for zone in [
            DropZone::Inside("c".into()),
            DropZone::Before("b".into()),
            DropZone::After("c".into()),
            DropZone::Inside("a".into()),
        ] {
            let result = plan_move(&forest, "a", &DropIntent::Zone(zone));
            assert!(matches!(result, Err(GrimoriumError::CycleRejected(_))));
        }
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let forest = vec![node("a", vec![])];
        assert!(matches!(
            plan_move(&forest, "ghost", &inside("a")),
            Err(GrimoriumError::RegionNotFound(_))
        ));
        assert!(matches!(
            plan_move(&forest, "a", &inside("ghost")),
            Err(GrimoriumError::RegionNotFound(_))
        ));
    }

    #[test]
    fn test_cross_parent_sibling_drop_reparents_and_reorders() {
        let forest = vec![
            node("a", vec![node("a1", vec![]), node("a2", vec![])]),
            node("b", vec![node("b1", vec![])]),
        ];
        let plan =
            plan_move(&forest, "a2", &DropIntent::Zone(DropZone::Before("b1".into()))).unwrap();
        assert_eq!(dump(&plan.forest), "a\n  a1\nb\n  a2\n  b1");
        assert_eq!(plan.requests.len(), 2);
        assert_eq!(count(&plan.forest), count(&forest));
    }

    #[test]
    fn test_drop_into_same_place_is_a_noop() {
        let forest = vec![node("a", vec![]), node("b", vec![])];
        let plan = plan_move(&forest, "a", &DropIntent::Zone(DropZone::Before("b".into())))
            .unwrap();
        assert!(plan.is_noop());
        let plan = plan_move(&forest, "b", &DropIntent::Root).unwrap();
        assert!(plan.is_noop());
    }

    #[test]
    fn test_root_drop_promotes_region() {
        let forest = vec![node("a", vec![node("b", vec![])]), node("c", vec![])];
        let plan = plan_move(&forest, "b", &DropIntent::Root).unwrap();
        assert_eq!(dump(&plan.forest), "a\nc\nb");
        assert_eq!(plan.new_parent_id, None);
        assert!(plan.parent_changed());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_applies_requests_in_order() {
        let (tx, mut rx) = unbounded_channel();
        let store = Arc::new(Mutex::new(RecordingStore::default()));
        let dispatcher = PersistenceDispatcher::new(Arc::clone(&store), Handle::current(), tx);

        let forest = vec![node("a", vec![]), node("b", vec![])];
        let plan = plan_move(&forest, "a", &inside("b")).unwrap();
        dispatcher.dispatch(plan.requests.clone()).await.unwrap().unwrap();

        assert_eq!(store.lock().unwrap().applied, plan.requests);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_failure_is_reported() {
        let (tx, mut rx) = unbounded_channel();
        let store = Arc::new(Mutex::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        }));
        let dispatcher = PersistenceDispatcher::new(store, Handle::current(), tx);

        let result = dispatcher
            .dispatch(vec![PersistRequest::Reorder {
                sibling_ids: vec!["a".into()],
                parent_id: None,
            }])
            .await
            .unwrap();
        assert!(matches!(result, Err(GrimoriumError::Persistence(_))));
        match rx.recv().await {
            Some(HierarchyEvent::PersistenceError { message }) => {
                assert!(message.contains("store offline"), "got {message}");
            }
            other => panic!("expected a persistence error event, got {other:?}"),
        }
    }
}
