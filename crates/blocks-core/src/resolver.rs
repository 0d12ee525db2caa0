//! Reference resolution
//!
//! Resolution always reads the registry's current entity, so a committed
//! edit shows through every reference at once without touching the
//! documents that hold them. A reference still carrying a temporary id
//! resolves to the entity that id was promoted to.

use blocks_tree::{ContentNode, DocumentTree, NodeId};

use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::registry::SharedBlockRegistry;

/// Current state of a shared block, as seen through a reference
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock {
    pub id: EntityId,
    pub title: String,
    pub content: Vec<ContentNode>,
}

impl ResolvedBlock {
    pub fn plain_text(&self) -> String {
        self.content.iter().map(ContentNode::plain_text).collect()
    }
}

/// Outcome of resolving a reference node
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedBlock),
    /// The target is not in the registry (deleted, or never existed);
    /// render as "block unavailable"
    Unresolved { target: String },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn block(&self) -> Option<&ResolvedBlock> {
        match self {
            Self::Resolved(block) => Some(block),
            Self::Unresolved { .. } => None,
        }
    }
}

/// Resolves reference nodes against a registry
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    registry: &'a SharedBlockRegistry,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(registry: &'a SharedBlockRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a reference node to its entity's current content
    ///
    /// Fails only when `node` is not a reference node.
    pub fn resolve(&self, node: &ContentNode) -> Result<Resolution> {
        let target = node
            .reference_target()
            .ok_or(Error::Tree(blocks_tree::Error::NotAReference { id: node.id }))?;
        Ok(self.resolve_target(target))
    }

    fn resolve_target(&self, target: &str) -> Resolution {
        let unresolved = || Resolution::Unresolved {
            target: target.to_string(),
        };
        let Ok(id) = target.parse::<EntityId>() else {
            tracing::warn!(target, "Reference carries a malformed shared block id");
            return unresolved();
        };
        match self.registry.get(&self.registry.current_id(&id)) {
            Ok(block) => Resolution::Resolved(ResolvedBlock {
                id: block.id,
                title: block.title,
                content: block.content,
            }),
            Err(_) => {
                tracing::debug!(target, "Reference is unresolved");
                unresolved()
            }
        }
    }

    /// Every reference in a tree with its resolution, in document order
    pub fn resolve_tree(&self, tree: &DocumentTree) -> Vec<(NodeId, Resolution)> {
        tree.references()
            .into_iter()
            .map(|(node, target)| (node, self.resolve_target(&target)))
            .collect()
    }

    /// References in a tree whose target is missing
    pub fn dangling_references(&self, tree: &DocumentTree) -> Vec<NodeId> {
        self.resolve_tree(tree)
            .into_iter()
            .filter(|(_, resolution)| !resolution.is_resolved())
            .map(|(node, _)| node)
            .collect()
    }
}
