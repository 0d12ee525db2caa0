//! Change records returned by tree mutations.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// The kind of tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeEditKind {
    /// A node was inserted.
    Insert,
    /// A node was swapped for another at the same position.
    Replace,
    /// A node and its descendants were removed.
    Remove,
}

/// A mutation applied to a [`DocumentTree`](crate::DocumentTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEdit {
    /// The kind of edit.
    pub kind: TreeEditKind,
    /// Parent of the affected position (`None` for the root level).
    pub parent: Option<NodeId>,
    /// Sibling index of the affected position.
    pub index: usize,
    /// Node occupying the position before the edit (Replace, Remove).
    pub old_node: Option<NodeId>,
    /// Node occupying the position after the edit (Insert, Replace).
    pub new_node: Option<NodeId>,
}

impl TreeEdit {
    pub(crate) fn insert(parent: Option<NodeId>, index: usize, node: NodeId) -> Self {
        Self {
            kind: TreeEditKind::Insert,
            parent,
            index,
            old_node: None,
            new_node: Some(node),
        }
    }

    pub(crate) fn replace(parent: Option<NodeId>, index: usize, old: NodeId, new: NodeId) -> Self {
        Self {
            kind: TreeEditKind::Replace,
            parent,
            index,
            old_node: Some(old),
            new_node: Some(new),
        }
    }

    pub(crate) fn remove(parent: Option<NodeId>, index: usize, node: NodeId) -> Self {
        Self {
            kind: TreeEditKind::Remove,
            parent,
            index,
            old_node: Some(node),
            new_node: None,
        }
    }
}
