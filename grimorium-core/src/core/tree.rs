//! Pure operations over a forest of [`RegionNode`]s.
//!
//! Every function borrows the forest it reads and returns a freshly built
//! one, so the snapshot a host is currently rendering is never touched.
//! Lookups that miss return `None` or [`GrimoriumError::RegionNotFound`]
//! instead of panicking: a stale id during a fast drag is expected.

use crate::{GrimoriumError, Region, RegionNode, Result};
use std::collections::{HashMap, HashSet};

/// Which side of the target a sibling insertion lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingPosition {
    Before,
    After,
}

/// Deep copy of the forest and every child list.
#[must_use]
pub fn clone_forest(forest: &[RegionNode]) -> Vec<RegionNode> {
    forest.to_vec()
}

/// Depth-first search across every tree in the forest.
#[must_use]
pub fn find_by_id<'a>(forest: &'a [RegionNode], id: &str) -> Option<&'a RegionNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_by_id(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Returns the container of `id` (`None` for the root list) and its index there.
#[must_use]
pub fn locate(forest: &[RegionNode], id: &str) -> Option<(Option<String>, usize)> {
    locate_in(forest, id, None)
}

fn locate_in(
    items: &[RegionNode],
    id: &str,
    parent_id: Option<&str>,
) -> Option<(Option<String>, usize)> {
    for (index, node) in items.iter().enumerate() {
        if node.id == id {
            return Some((parent_id.map(str::to_string), index));
        }
        if let Some(found) = locate_in(&node.children, id, Some(&node.id)) {
            return Some(found);
        }
    }
    None
}

/// Removes `id` and returns the remaining forest together with the detached
/// subtree. Descendants travel with the removed node.
#[must_use]
pub fn take(forest: &[RegionNode], id: &str) -> Option<(Vec<RegionNode>, RegionNode)> {
    let mut out = clone_forest(forest);
    let removed = detach(&mut out, id)?;
    Some((out, removed))
}

/// The forest without `id` (and its subtree). Unchanged copy if `id` is absent.
#[must_use]
pub fn remove(forest: &[RegionNode], id: &str) -> Vec<RegionNode> {
    match take(forest, id) {
        Some((out, _)) => out,
        None => clone_forest(forest),
    }
}

fn detach(items: &mut Vec<RegionNode>, id: &str) -> Option<RegionNode> {
    if let Some(index) = items.iter().position(|node| node.id == id) {
        return Some(items.remove(index));
    }
    items.iter_mut().find_map(|node| detach(&mut node.children, id))
}

fn find_mut<'a>(items: &'a mut [RegionNode], id: &str) -> Option<&'a mut RegionNode> {
    for node in items.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Appends `node` as the last child of `parent_id` and points its
/// `parent_id` there.
///
/// # Errors
///
/// Returns [`GrimoriumError::RegionNotFound`] if `parent_id` is not in the forest.
pub fn insert_as_child(
    forest: &[RegionNode],
    parent_id: &str,
    mut node: RegionNode,
) -> Result<Vec<RegionNode>> {
    let mut out = clone_forest(forest);
    let parent = find_mut(&mut out, parent_id)
        .ok_or_else(|| GrimoriumError::RegionNotFound(parent_id.to_string()))?;
    node.parent_id = Some(parent_id.to_string());
    parent.children.push(node);
    Ok(out)
}

/// Inserts `node` next to `target_id`, in whichever list holds the target.
///
/// # Errors
///
/// Returns [`GrimoriumError::RegionNotFound`] if `target_id` is not in the forest.
pub fn insert_as_sibling(
    forest: &[RegionNode],
    target_id: &str,
    mut node: RegionNode,
    position: SiblingPosition,
) -> Result<Vec<RegionNode>> {
    let (parent_id, index) = locate(forest, target_id)
        .ok_or_else(|| GrimoriumError::RegionNotFound(target_id.to_string()))?;
    let at = match position {
        SiblingPosition::Before => index,
        SiblingPosition::After => index + 1,
    };

    let mut out = clone_forest(forest);
    node.parent_id = parent_id.clone();
    match parent_id {
        None => out.insert(at, node),
        Some(pid) => {
            let parent = find_mut(&mut out, &pid)
                .ok_or_else(|| GrimoriumError::RegionNotFound(pid.clone()))?;
            parent.children.insert(at, node);
        }
    }
    Ok(out)
}

/// Appends `node` at the end of the root list.
#[must_use]
pub fn append_root(forest: &[RegionNode], mut node: RegionNode) -> Vec<RegionNode> {
    let mut out = clone_forest(forest);
    node.parent_id = None;
    out.push(node);
    out
}

/// True if `node_id` is `candidate` itself or anywhere below it.
#[must_use]
pub fn is_ancestor(candidate: &RegionNode, node_id: &str) -> bool {
    candidate.id == node_id
        || candidate
            .children
            .iter()
            .any(|child| is_ancestor(child, node_id))
}

/// Ordered ids directly under `parent_id` (`None` = root list), or `None`
/// if the parent is not in the forest.
#[must_use]
pub fn sibling_ids(forest: &[RegionNode], parent_id: Option<&str>) -> Option<Vec<String>> {
    let items: &[RegionNode] = match parent_id {
        None => forest,
        Some(pid) => &find_by_id(forest, pid)?.children,
    };
    Some(items.iter().map(|node| node.id.clone()).collect())
}

/// Total number of nodes in the forest.
#[must_use]
pub fn count(forest: &[RegionNode]) -> usize {
    forest.iter().map(RegionNode::subtree_len).sum()
}

/// Every id in the forest, in depth-first display order.
#[must_use]
pub fn all_ids(forest: &[RegionNode]) -> Vec<String> {
    fn walk(items: &[RegionNode], out: &mut Vec<String>) {
        for node in items {
            out.push(node.id.clone());
            walk(&node.children, out);
        }
    }
    let mut out = Vec::new();
    walk(forest, &mut out);
    out
}

/// Assembles the tree-shaped view from flat rows.
///
/// Siblings are ordered by `order_index`, then `created_at`, then id. A row
/// whose parent is not part of `rows` becomes a root so that it stays
/// reachable; so does a row caught in a stored parent cycle.
#[must_use]
pub fn build_forest(rows: &[Region]) -> Vec<RegionNode> {
    let mut sorted: Vec<&Region> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.order_index
            .cmp(&b.order_index)
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let known: HashSet<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
    let mut by_parent: HashMap<&str, Vec<&Region>> = HashMap::new();
    let mut roots: Vec<&Region> = Vec::new();
    for region in &sorted {
        match region.parent_id.as_deref() {
            Some(pid) if pid != region.id && known.contains(pid) => {
                by_parent.entry(pid).or_default().push(*region);
            }
            _ => roots.push(*region),
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut forest: Vec<RegionNode> = roots
        .into_iter()
        .filter_map(|region| build_subtree(region, &by_parent, &mut visited))
        .map(|mut node| {
            node.parent_id = None;
            node
        })
        .collect();

    for region in &sorted {
        if visited.contains(region.id.as_str()) {
            continue;
        }
        log::warn!(
            "region {} is part of a parent cycle in storage; surfacing it as a root",
            region.id
        );
        if let Some(mut node) = build_subtree(*region, &by_parent, &mut visited) {
            node.parent_id = None;
            forest.push(node);
        }
    }

    forest
}

fn build_subtree<'a>(
    region: &'a Region,
    by_parent: &HashMap<&str, Vec<&'a Region>>,
    visited: &mut HashSet<&'a str>,
) -> Option<RegionNode> {
    if !visited.insert(region.id.as_str()) {
        return None;
    }
    let mut node = RegionNode::from(region);
    if let Some(kids) = by_parent.get(region.id.as_str()) {
        node.children = kids
            .iter()
            .filter_map(|kid| build_subtree(kid, by_parent, visited))
            .collect();
    }
    Some(node)
}
