//! Which regions are expanded in the hierarchy view.
//!
//! Expansion is per-session view state: it is not persisted and starts
//! over (everything expanded) whenever the forest is reloaded.

use crate::core::tree::all_ids;
use crate::RegionNode;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `id` and returns whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    /// Marks every node of `forest` expanded, keeping other entries.
    pub fn expand_all(&mut self, forest: &[RegionNode]) {
        self.expanded.extend(all_ids(forest));
    }

    /// Starts over for a freshly loaded forest: everything expanded,
    /// ids no longer present forgotten.
    pub fn reset_for(&mut self, forest: &[RegionNode]) {
        self.expanded = all_ids(forest).into_iter().collect();
    }

    /// Forgets everything; nothing is expanded.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::tests::node;

    #[test]
    fn test_reset_expands_everything() {
        let forest = vec![node("a", vec![node("b", vec![])])];
        let mut state = ExpansionState::new();
        state.expand("stale");
        state.reset_for(&forest);
        assert!(state.is_expanded("a"));
        assert!(state.is_expanded("b"));
        assert!(!state.is_expanded("stale"));
    }

    #[test]
    fn test_toggle() {
        let mut state = ExpansionState::new();
        assert!(state.toggle("a"));
        assert!(state.is_expanded("a"));
        assert!(!state.toggle("a"));
        assert!(!state.is_expanded("a"));
    }
}
