//! Conversion between regular content and shared blocks

use std::collections::BTreeSet;

use blocks_tree::{ContentNode, DocumentTree, NodeId};

use crate::entity::EntityId;
use crate::error::{Error, Result};
use crate::registry::{SaveOutcome, SharedBlockRegistry};
use crate::resolver::{ReferenceResolver, Resolution};

/// Turn the subtree at `node_id` into a new shared block
///
/// The subtree moves into a temporary entity and a reference node takes
/// its place in one swap, so the tree never shows a gap. Save the entity
/// afterwards to persist it and give it a title.
pub fn convert_to_shared(
    registry: &SharedBlockRegistry,
    tree: &mut DocumentTree,
    node_id: NodeId,
) -> Result<EntityId> {
    let node = tree
        .get(node_id)
        .ok_or(blocks_tree::Error::NotFound { id: node_id })?;
    if node.is_reference() {
        return Err(Error::AlreadyShared { node: node_id });
    }

    let id = registry.create_from_content(vec![node.clone()]);
    if let Err(err) = tree.replace_node(node_id, ContentNode::reference(id.to_string())) {
        registry.discard_temporary(&id);
        return Err(err.into());
    }
    tracing::info!(%id, node = %node_id, "Converted content to shared block");
    Ok(id)
}

/// Replace the reference node `reference_id` with an independent copy of
/// its entity's current content
///
/// Every copied node gets a fresh id, so later edits to the entity do not
/// reach the copy and vice versa. Returns the inserted nodes.
pub fn convert_to_regular(
    registry: &SharedBlockRegistry,
    tree: &mut DocumentTree,
    reference_id: NodeId,
) -> Result<Vec<ContentNode>> {
    let reference = tree
        .get(reference_id)
        .ok_or(blocks_tree::Error::NotFound { id: reference_id })?;

    let block = match ReferenceResolver::new(registry).resolve(reference)? {
        Resolution::Resolved(block) => block,
        Resolution::Unresolved { target } => {
            return Err(match target.parse() {
                Ok(id) => Error::NotFound { id },
                Err(err) => err,
            });
        }
    };

    let copies: Vec<ContentNode> = block.content.iter().map(ContentNode::fresh_copy).collect();
    let mut rest = copies.iter().cloned();
    match rest.next() {
        Some(first) => {
            let (_, edit) = tree.replace_node_with_edit(reference_id, first)?;
            for (offset, node) in rest.enumerate() {
                tree.insert(edit.parent, edit.index + 1 + offset, node)?;
            }
        }
        None => {
            tree.extract_subtree(reference_id)?;
        }
    }
    tracing::info!(id = %block.id, node = %reference_id, "Converted shared block to regular content");
    Ok(copies)
}

/// Point a document's references at an entity's permanent id after its
/// first save
///
/// Returns the number of reference nodes updated.
pub fn relink(tree: &mut DocumentTree, outcome: &SaveOutcome) -> usize {
    match outcome.promoted_from {
        Some(from) => tree.retarget_references(&from.to_string(), &outcome.id.to_string()),
        None => 0,
    }
}

/// Point every reference in a document that still carries a retired
/// temporary id at the entity's permanent id
///
/// Covers documents that picked up a reference before the save whose
/// outcome they never saw. Returns the number of reference nodes updated.
pub fn relink_all(registry: &SharedBlockRegistry, tree: &mut DocumentTree) -> usize {
    let stale: BTreeSet<(String, String)> = tree
        .references()
        .into_iter()
        .filter_map(|(_, target)| {
            let id: EntityId = target.parse().ok()?;
            let current = registry.current_id(&id);
            (current != id).then(|| (target, current.to_string()))
        })
        .collect();
    stale
        .iter()
        .map(|(from, to)| tree.retarget_references(from, to))
        .sum()
}
