//! Document tree type

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edit::TreeEdit;
use crate::error::{Error, Result};
use crate::node::{ContentNode, NodeId, REFERENCE_ATTR};

/// An ordered forest of content nodes
///
/// No two nodes in one tree share a [`NodeId`]. All operations are
/// synchronous and fail with [`Error::NotFound`] when given an id that is
/// not in the tree, leaving the tree untouched.
///
/// Serializes as its array of root nodes; deserializing rejects duplicate
/// ids like [`DocumentTree::from_nodes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ContentNode>", into = "Vec<ContentNode>")]
pub struct DocumentTree {
    roots: Vec<ContentNode>,
}

impl TryFrom<Vec<ContentNode>> for DocumentTree {
    type Error = Error;

    fn try_from(nodes: Vec<ContentNode>) -> Result<Self> {
        Self::from_nodes(nodes)
    }
}

impl From<DocumentTree> for Vec<ContentNode> {
    fn from(tree: DocumentTree) -> Self {
        tree.roots
    }
}

impl DocumentTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from root nodes, rejecting duplicate ids
    pub fn from_nodes(nodes: Vec<ContentNode>) -> Result<Self> {
        let mut tree = Self::new();
        for node in nodes {
            tree.push_root(node)?;
        }
        Ok(tree)
    }

    /// Root-level nodes in document order
    pub fn roots(&self) -> &[ContentNode] {
        &self.roots
    }

    /// Total number of nodes, descendants included
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order iterator over every node in the tree
    pub fn iter(&self) -> impl Iterator<Item = &ContentNode> {
        self.roots.iter().flat_map(ContentNode::descendants)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.locate(id).map(|path| self.node_at(&path))
    }

    /// Get a node's children
    pub fn children(&self, id: NodeId) -> Result<&[ContentNode]> {
        self.get(id)
            .map(|node| node.children.as_slice())
            .ok_or(Error::NotFound { id })
    }

    /// Id of a node's parent (`Ok(None)` for root-level nodes)
    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>> {
        let path = self.locate(id).ok_or(Error::NotFound { id })?;
        Ok(self.parent_id(&path))
    }

    /// Concatenated text of a node's subtree
    pub fn plain_text(&self, id: NodeId) -> Result<String> {
        self.get(id)
            .map(ContentNode::plain_text)
            .ok_or(Error::NotFound { id })
    }

    /// Append a node at the root level
    pub fn push_root(&mut self, node: ContentNode) -> Result<TreeEdit> {
        let index = self.roots.len();
        self.insert(None, index, node)
    }

    /// Insert a node under `parent` (or at the root level) at `index`
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        node: ContentNode,
    ) -> Result<TreeEdit> {
        let parent_path = match parent {
            Some(id) => self.locate(id).ok_or(Error::NotFound { id })?.full(),
            None => Vec::new(),
        };
        self.check_insertable(&node, None)?;

        let siblings = self.siblings_mut(&parent_path);
        if index > siblings.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: siblings.len(),
            });
        }
        let node_id = node.id;
        siblings.insert(index, node);
        tracing::debug!(%node_id, ?parent, index, "Inserted node");
        Ok(TreeEdit::insert(parent, index, node_id))
    }

    /// Remove and return a node together with its descendants
    ///
    /// Later siblings shift down by one.
    pub fn extract_subtree(&mut self, id: NodeId) -> Result<ContentNode> {
        let path = self.locate(id).ok_or(Error::NotFound { id })?;
        let node = self.siblings_mut(&path.parent).remove(path.index);
        tracing::debug!(node_id = %id, index = path.index, "Extracted subtree");
        Ok(node)
    }

    /// Swap the node `id` for `new_node` at the same position
    ///
    /// The swap is atomic: readers see either the old subtree or the new
    /// node, never a gap. Returns the replaced subtree.
    pub fn replace_node(&mut self, id: NodeId, new_node: ContentNode) -> Result<ContentNode> {
        self.replace_node_with_edit(id, new_node).map(|(old, _)| old)
    }

    /// Like [`replace_node`](Self::replace_node), also returning the edit record
    pub fn replace_node_with_edit(
        &mut self,
        id: NodeId,
        new_node: ContentNode,
    ) -> Result<(ContentNode, TreeEdit)> {
        let path = self.locate(id).ok_or(Error::NotFound { id })?;
        self.check_insertable(&new_node, Some(self.node_at(&path)))?;

        let parent = self.parent_id(&path);
        let new_id = new_node.id;
        let old = std::mem::replace(&mut self.siblings_mut(&path.parent)[path.index], new_node);
        tracing::debug!(old = %id, new = %new_id, index = path.index, "Replaced node");
        Ok((old, TreeEdit::replace(parent, path.index, id, new_id)))
    }

    /// Remove every listed node (and its descendants) in one step
    ///
    /// Fails without modifying the tree if any id is missing. Returns the
    /// removed subtrees in document order; a listed node nested under
    /// another listed node is removed with its ancestor.
    pub fn remove_nodes(
        &mut self,
        ids: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<ContentNode>> {
        let ids: HashSet<NodeId> = ids.into_iter().collect();
        if let Some(missing) = ids.iter().find(|id| !self.contains(**id)) {
            return Err(Error::NotFound { id: *missing });
        }

        let mut removed = Vec::new();
        prune(&mut self.roots, &ids, &mut removed);
        tracing::debug!(count = removed.len(), "Removed nodes");
        Ok(removed)
    }

    /// Remove a single node, returning the edit record
    pub fn remove_node(&mut self, id: NodeId) -> Result<TreeEdit> {
        let path = self.locate(id).ok_or(Error::NotFound { id })?;
        let parent = self.parent_id(&path);
        self.siblings_mut(&path.parent).remove(path.index);
        Ok(TreeEdit::remove(parent, path.index, id))
    }

    /// Every reference node in the tree with the entity id it points at
    pub fn references(&self) -> Vec<(NodeId, String)> {
        self.iter()
            .filter_map(|node| node.reference_target().map(|target| (node.id, target.to_string())))
            .collect()
    }

    /// Point every reference to `from` at `to` instead
    ///
    /// Returns the number of reference nodes changed.
    pub fn retarget_references(&mut self, from: &str, to: &str) -> usize {
        fn walk(nodes: &mut [ContentNode], from: &str, to: &str) -> usize {
            let mut changed = 0;
            for node in nodes {
                if node.reference_target() == Some(from) {
                    node.attributes
                        .insert(REFERENCE_ATTR.to_string(), Value::String(to.to_string()));
                    changed += 1;
                }
                changed += walk(&mut node.children, from, to);
            }
            changed
        }
        let changed = walk(&mut self.roots, from, to);
        if changed > 0 {
            tracing::debug!(from, to, changed, "Retargeted references");
        }
        changed
    }

    /// Remove every reference node pointing at `target`
    pub fn remove_references(&mut self, target: &str) -> Vec<ContentNode> {
        let ids: HashSet<NodeId> = self
            .references()
            .into_iter()
            .filter(|(_, t)| t == target)
            .map(|(id, _)| id)
            .collect();
        let mut removed = Vec::new();
        prune(&mut self.roots, &ids, &mut removed);
        removed
    }

    /// Position of `id`: the index path of its parent plus its sibling index
    fn locate(&self, id: NodeId) -> Option<NodePath> {
        fn walk(nodes: &[ContentNode], id: NodeId, parent: &mut Vec<usize>) -> Option<usize> {
            for (index, node) in nodes.iter().enumerate() {
                if node.id == id {
                    return Some(index);
                }
                parent.push(index);
                if let Some(found) = walk(&node.children, id, parent) {
                    return Some(found);
                }
                parent.pop();
            }
            None
        }
        let mut parent = Vec::new();
        let index = walk(&self.roots, id, &mut parent)?;
        Some(NodePath { parent, index })
    }

    fn node_at(&self, path: &NodePath) -> &ContentNode {
        &self.siblings(&path.parent)[path.index]
    }

    fn parent_id(&self, path: &NodePath) -> Option<NodeId> {
        let (last, grand) = path.parent.split_last()?;
        Some(self.siblings(grand)[*last].id)
    }

    /// Sibling list under the node at `parent_path`, or the root list
    fn siblings(&self, parent_path: &[usize]) -> &Vec<ContentNode> {
        parent_path
            .iter()
            .fold(&self.roots, |siblings, index| &siblings[*index].children)
    }

    fn siblings_mut(&mut self, parent_path: &[usize]) -> &mut Vec<ContentNode> {
        let mut siblings = &mut self.roots;
        for index in parent_path {
            siblings = &mut siblings[*index].children;
        }
        siblings
    }

    /// Reject a node whose subtree would duplicate an id already in the tree
    ///
    /// Ids inside `replacing` are about to leave the tree and may be reused.
    fn check_insertable(&self, node: &ContentNode, replacing: Option<&ContentNode>) -> Result<()> {
        let leaving: HashSet<NodeId> = replacing
            .map(|old| old.descendants().map(|n| n.id).collect())
            .unwrap_or_default();
        let mut seen: HashSet<NodeId> = self
            .iter()
            .map(|n| n.id)
            .filter(|id| !leaving.contains(id))
            .collect();
        for incoming in node.descendants() {
            if !seen.insert(incoming.id) {
                return Err(Error::DuplicateNodeId { id: incoming.id });
            }
        }
        Ok(())
    }
}

/// Location of a node; indices stay valid until the next mutation
struct NodePath {
    parent: Vec<usize>,
    index: usize,
}

impl NodePath {
    /// Index path of the node itself
    fn full(mut self) -> Vec<usize> {
        self.parent.push(self.index);
        self.parent
    }
}

fn prune(nodes: &mut Vec<ContentNode>, ids: &HashSet<NodeId>, removed: &mut Vec<ContentNode>) {
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        if ids.contains(&node.id) {
            removed.push(node);
        } else {
            prune(&mut node.children, ids, removed);
            kept.push(node);
        }
    }
    *nodes = kept;
}
