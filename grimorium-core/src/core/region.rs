//! Region records, in their flat stored form and their tree-shaped form.

use crate::{GrimoriumError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How large a region is within the world. Stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionScale {
    Local,
    Continental,
    Planetary,
    Galactic,
    Universal,
    Multiversal,
}

impl RegionScale {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Continental => "continental",
            Self::Planetary => "planetary",
            Self::Galactic => "galactic",
            Self::Universal => "universal",
            Self::Multiversal => "multiversal",
        }
    }
}

impl fmt::Display for RegionScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionScale {
    type Err = GrimoriumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Self::Local),
            "continental" => Ok(Self::Continental),
            "planetary" => Ok(Self::Planetary),
            "galactic" => Ok(Self::Galactic),
            "universal" => Ok(Self::Universal),
            "multiversal" => Ok(Self::Multiversal),
            other => Err(GrimoriumError::InvalidData(format!(
                "unknown region scale '{other}'"
            ))),
        }
    }
}

/// A region row as the store keeps it: the hierarchy is carried by
/// `parent_id` and `order_index` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub book_id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub scale: RegionScale,
    pub order_index: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One entry of the region forest as the hierarchy editor sees it.
///
/// Sibling order is the order of `children`; there is no separate index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNode {
    pub id: String,
    pub name: String,
    pub scale: RegionScale,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<RegionNode>,
}

impl RegionNode {
    /// Creates a childless node. Mostly useful for hosts building fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>, scale: RegionScale) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scale,
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Builder-style helper that appends `child` and points its `parent_id` here.
    #[must_use]
    pub fn with_child(mut self, mut child: RegionNode) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(RegionNode::subtree_len).sum::<usize>()
    }
}

impl From<&Region> for RegionNode {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            name: region.name.clone(),
            scale: region.scale,
            parent_id: region.parent_id.clone(),
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_round_trips_through_str() {
        for scale in [
            RegionScale::Local,
            RegionScale::Continental,
            RegionScale::Planetary,
            RegionScale::Galactic,
            RegionScale::Universal,
            RegionScale::Multiversal,
        ] {
            assert_eq!(scale.as_str().parse::<RegionScale>().unwrap(), scale);
        }
    }

    #[test]
    fn test_unknown_scale_is_rejected() {
        let err = "cosmic".parse::<RegionScale>().unwrap_err();
        assert!(matches!(err, GrimoriumError::InvalidData(_)));
    }

    #[test]
    fn test_with_child_sets_parent() {
        let node = RegionNode::new("a", "Arden", RegionScale::Continental)
            .with_child(RegionNode::new("b", "Brill", RegionScale::Local));
        assert_eq!(node.children[0].parent_id.as_deref(), Some("a"));
        assert_eq!(node.subtree_len(), 2);
    }

    #[test]
    fn test_node_serializes_camel_case() {
        let node = RegionNode::new("a", "Arden", RegionScale::Local)
            .with_child(RegionNode::new("b", "Brill", RegionScale::Local));
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"parentId\":\"a\""));
        assert!(json.contains("\"scale\":\"local\""));
    }
}
