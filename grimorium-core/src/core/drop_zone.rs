//! Geometric classification of a drag position into a drop zone.
//!
//! A band of `gap` pixels above a row means "insert before it", a band
//! below means "insert after it", and the row itself means "nest inside".
//! The sibling bands are tested first so that aiming for the gap between
//! two rows never nests by accident.

use crate::core::tree::{find_by_id, is_ancestor};
use crate::RegionNode;
use serde::{Deserialize, Serialize};

/// Height in pixels of the sibling-insertion band on each edge of a row.
pub const DEFAULT_GAP_SIZE: f32 = 28.0;

/// An on-screen rectangle, in the host's pixel coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    #[must_use]
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    #[must_use]
    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    #[must_use]
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top && y <= self.bottom
    }

    /// Vertical distance from `y` to the rectangle; zero when inside.
    fn distance_y(&self, y: f32) -> f32 {
        if y < self.top {
            self.top - y
        } else if y > self.bottom {
            y - self.bottom
        } else {
            0.0
        }
    }
}

/// Where a dragged region would land relative to a target region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "zone", content = "targetId", rename_all = "camelCase")]
pub enum DropZone {
    Before(String),
    After(String),
    Inside(String),
}

impl DropZone {
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::Before(id) | Self::After(id) | Self::Inside(id) => id,
        }
    }
}

/// Something the host has laid out on screen that a drag can be released over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropTarget {
    /// A row of the hierarchy tree.
    Region { id: String, bounds: Rect },
    /// The empty area that promotes a region to the top level.
    Neutral { bounds: Rect },
}

impl DropTarget {
    #[must_use]
    pub fn bounds(&self) -> &Rect {
        match self {
            Self::Region { bounds, .. } | Self::Neutral { bounds } => bounds,
        }
    }

    #[must_use]
    pub fn region_id(&self) -> Option<&str> {
        match self {
            Self::Region { id, .. } => Some(id),
            Self::Neutral { .. } => None,
        }
    }
}

/// The move a release would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropIntent {
    Zone(DropZone),
    /// Move to the end of the top-level list.
    Root,
}

/// Classifies the dragged element's vertical centre against one target row.
///
/// Returns `None` when `center_y` is outside every band, or when the
/// target is the dragged region itself.
#[must_use]
pub fn classify(
    dragged_id: &str,
    center_y: f32,
    target_id: &str,
    bounds: &Rect,
    gap: f32,
) -> Option<DropZone> {
    if dragged_id == target_id {
        return None;
    }
    if center_y >= bounds.top - gap && center_y < bounds.top {
        return Some(DropZone::Before(target_id.to_string()));
    }
    if center_y > bounds.bottom && center_y <= bounds.bottom + gap {
        return Some(DropZone::After(target_id.to_string()));
    }
    if bounds.contains_y(center_y) {
        return Some(DropZone::Inside(target_id.to_string()));
    }
    None
}

/// Drops `zone` if applying it would put the dragged region under itself.
///
/// Any zone whose target lies in the dragged subtree is rejected: nesting
/// inside a descendant is a cycle, and a sibling of a descendant still
/// lives under the dragged region. A dragged id that is no longer in the
/// forest also yields `None`.
#[must_use]
pub fn suppress_cycles(
    forest: &[RegionNode],
    dragged_id: &str,
    zone: DropZone,
) -> Option<DropZone> {
    let dragged = find_by_id(forest, dragged_id)?;
    if is_ancestor(dragged, zone.target_id()) {
        log::debug!(
            "suppressing drop of {dragged_id} relative to {}: target is inside the dragged subtree",
            zone.target_id()
        );
        return None;
    }
    Some(zone)
}

/// Finds the target under `center_y` while `dragged_id` is being dragged.
///
/// A neutral area containing the point wins. Next comes the closest region
/// whose before/after band reaches the point, so the gap between two
/// touching rows means "insert between them" rather than "nest". Only then
/// does a region row containing the point count. The dragged row itself is
/// skipped. Ties go to the earlier entry in `layout`.
#[must_use]
pub fn hit_test<'a>(
    layout: &'a [DropTarget],
    dragged_id: &str,
    center_y: f32,
    gap: f32,
) -> Option<&'a DropTarget> {
    if let Some(neutral) = layout
        .iter()
        .find(|t| matches!(t, DropTarget::Neutral { .. }) && t.bounds().contains_y(center_y))
    {
        return Some(neutral);
    }

    let mut rows = layout.iter().filter(|t| match t {
        DropTarget::Region { id, .. } => id != dragged_id,
        DropTarget::Neutral { .. } => false,
    });

    let mut best: Option<(&DropTarget, f32)> = None;
    for target in rows.clone() {
        let bounds = target.bounds();
        if bounds.contains_y(center_y) {
            continue;
        }
        let distance = bounds.distance_y(center_y);
        if distance > gap {
            continue;
        }
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((target, distance)),
        }
    }
    if let Some((target, _)) = best {
        return Some(target);
    }

    rows.find(|t| t.bounds().contains_y(center_y))
}

/// Turns a hovered target into the intent a release would carry.
#[must_use]
pub fn resolve_intent(
    forest: &[RegionNode],
    dragged_id: &str,
    target: &DropTarget,
    center_y: f32,
    gap: f32,
) -> Option<DropIntent> {
    match target {
        DropTarget::Region { id, bounds } => classify(dragged_id, center_y, id, bounds, gap)
            .and_then(|zone| suppress_cycles(forest, dragged_id, zone))
            .map(DropIntent::Zone),
        DropTarget::Neutral { .. } => {
            find_by_id(forest, dragged_id).map(|_| DropIntent::Root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::tests::node;

    fn row() -> Rect {
        Rect::new(0.0, 100.0, 300.0, 140.0)
    }

    #[test]
    fn test_zone_boundaries() {
        let gap = DEFAULT_GAP_SIZE;
        assert_eq!(classify("x", 80.0, "t", &row(), gap), Some(DropZone::Before("t".into())));
        assert_eq!(classify("x", 160.0, "t", &row(), gap), Some(DropZone::After("t".into())));
        assert_eq!(classify("x", 120.0, "t", &row(), gap), Some(DropZone::Inside("t".into())));
        assert_eq!(classify("x", 50.0, "t", &row(), gap), None);
    }

    #[test]
    fn test_band_edges() {
        let gap = DEFAULT_GAP_SIZE;
        assert_eq!(classify("x", 72.0, "t", &row(), gap), Some(DropZone::Before("t".into())));
        assert_eq!(classify("x", 100.0, "t", &row(), gap), Some(DropZone::Inside("t".into())));
        assert_eq!(classify("x", 140.0, "t", &row(), gap), Some(DropZone::Inside("t".into())));
        assert_eq!(classify("x", 168.0, "t", &row(), gap), Some(DropZone::After("t".into())));
        assert_eq!(classify("x", 168.5, "t", &row(), gap), None);
    }

    #[test]
    fn test_self_drop_is_never_classified() {
        assert_eq!(classify("t", 120.0, "t", &row(), DEFAULT_GAP_SIZE), None);
    }

    #[test]
    fn test_cycle_suppression() {
        let forest = vec![node("a", vec![node("b", vec![node("c", vec![])])]), node("d", vec![])];
        assert_eq!(suppress_cycles(&forest, "a", DropZone::Inside("c".into())), None);
        assert_eq!(suppress_cycles(&forest, "a", DropZone::After("b".into())), None);
        assert_eq!(
            suppress_cycles(&forest, "b", DropZone::Inside("d".into())),
            Some(DropZone::Inside("d".into()))
        );
        assert_eq!(suppress_cycles(&forest, "gone", DropZone::Inside("d".into())), None);
    }

    fn touching_rows() -> Vec<DropTarget> {
        vec![
            DropTarget::Region { id: "a".into(), bounds: Rect::new(0.0, 100.0, 300.0, 140.0) },
            DropTarget::Region { id: "b".into(), bounds: Rect::new(0.0, 140.0, 300.0, 180.0) },
            DropTarget::Region { id: "c".into(), bounds: Rect::new(0.0, 180.0, 300.0, 220.0) },
        ]
    }

    fn intent_at(forest: &[RegionNode], layout: &[DropTarget], dragged: &str, y: f32) -> Option<DropIntent> {
        let target = hit_test(layout, dragged, y, DEFAULT_GAP_SIZE)?;
        resolve_intent(forest, dragged, target, y, DEFAULT_GAP_SIZE)
    }

    fn zone(zone: DropZone) -> Option<DropIntent> {
        Some(DropIntent::Zone(zone))
    }

    #[test]
    fn test_gap_between_touching_rows_inserts_as_sibling() {
        let forest = vec![node("a", vec![]), node("b", vec![]), node("c", vec![])];
        let layout = touching_rows();
        assert_eq!(intent_at(&forest, &layout, "c", 105.0), zone(DropZone::Inside("a".into())));
        assert_eq!(intent_at(&forest, &layout, "c", 135.0), zone(DropZone::Before("b".into())));
        assert_eq!(intent_at(&forest, &layout, "c", 145.0), zone(DropZone::After("a".into())));
        assert_eq!(intent_at(&forest, &layout, "c", 175.0), zone(DropZone::Inside("b".into())));

        // half-pixel steps never land on the shared edge at 140
        for step in 0..=55 {
            let y = 112.5 + step as f32;
            let intent = intent_at(&forest, &layout, "c", y);
            assert!(
                matches!(
                    intent,
                    Some(DropIntent::Zone(DropZone::Before(_) | DropZone::After(_)))
                ),
                "y={y} gave {intent:?}"
            );
        }
    }

    #[test]
    fn test_hit_test_skips_the_dragged_row() {
        let layout = touching_rows();
        // c's before band would cover 175, but c is the row being dragged
        let hit = hit_test(&layout, "c", 175.0, DEFAULT_GAP_SIZE).unwrap();
        assert_eq!(hit.region_id(), Some("b"));
        let hit = hit_test(&layout, "a", 175.0, DEFAULT_GAP_SIZE).unwrap();
        assert_eq!(hit.region_id(), Some("c"));
    }

    #[test]
    fn test_hit_test_uses_nearest_band() {
        let layout = vec![
            DropTarget::Region { id: "a".into(), bounds: Rect::new(0.0, 0.0, 300.0, 40.0) },
            DropTarget::Region { id: "b".into(), bounds: Rect::new(0.0, 100.0, 300.0, 140.0) },
        ];
        assert_eq!(hit_test(&layout, "x", 90.0, DEFAULT_GAP_SIZE).unwrap().region_id(), Some("b"));
        assert_eq!(hit_test(&layout, "x", 50.0, DEFAULT_GAP_SIZE).unwrap().region_id(), Some("a"));
        assert_eq!(hit_test(&layout, "x", 20.0, DEFAULT_GAP_SIZE).unwrap().region_id(), Some("a"));
        assert!(hit_test(&layout, "x", 400.0, DEFAULT_GAP_SIZE).is_none());
    }

    #[test]
    fn test_neutral_area_beats_neighbouring_band() {
        let mut layout = touching_rows();
        layout.push(DropTarget::Neutral { bounds: Rect::new(0.0, 220.0, 300.0, 400.0) });
        let hit = hit_test(&layout, "a", 230.0, DEFAULT_GAP_SIZE).unwrap();
        assert_eq!(hit.region_id(), None);
    }

    #[test]
    fn test_neutral_target_resolves_to_root() {
        let forest = vec![node("a", vec![node("b", vec![])])];
        let neutral = DropTarget::Neutral { bounds: Rect::new(0.0, 500.0, 300.0, 600.0) };
        assert_eq!(
            resolve_intent(&forest, "b", &neutral, 550.0, DEFAULT_GAP_SIZE),
            Some(DropIntent::Root)
        );
    }
}
