//! Confirmed deletion of shared blocks
//!
//! Deleting a shared block affects every document that references it, so
//! the registry only accepts a [`ConfirmedDeletion`], which can only be
//! obtained by confirming a [`PendingDeletion`].

use blocks_tree::DocumentTree;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, SharedBlock};
use crate::error::{Error, Result};
use crate::registry::SharedBlockRegistry;

/// What happens to reference nodes when their entity is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionPolicy {
    /// Leave references in place; they resolve as unavailable
    #[default]
    LeaveDangling,
    /// Remove references from the supplied documents
    CascadeReferences,
    /// Refuse to delete while supplied documents reference the entity
    BlockWhileReferenced,
}

/// A deletion awaiting explicit confirmation
#[derive(Debug)]
#[must_use = "a pending deletion does nothing until confirmed"]
pub struct PendingDeletion {
    id: EntityId,
    title: String,
}

impl PendingDeletion {
    pub(crate) fn new(id: EntityId, title: String) -> Self {
        Self { id, title }
    }

    pub fn entity_id(&self) -> EntityId {
        self.id
    }

    /// Title of the entity, for the confirmation prompt
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Confirm the deletion
    pub fn confirm(self) -> ConfirmedDeletion {
        tracing::debug!(id = %self.id, "Deletion confirmed");
        ConfirmedDeletion { id: self.id }
    }
}

/// A deletion the caller has confirmed
#[derive(Debug)]
pub struct ConfirmedDeletion {
    id: EntityId,
}

impl ConfirmedDeletion {
    pub fn entity_id(&self) -> EntityId {
        self.id
    }
}

/// Outcome of [`delete_shared_block`]
#[derive(Debug, Clone)]
pub struct DeletionReport {
    /// The entity as it was when deleted
    pub entity: SharedBlock,
    /// Reference nodes removed from the supplied documents
    pub references_removed: usize,
    /// Reference nodes left pointing at nothing
    pub dangling: usize,
}

/// Delete a shared block, applying the configured [`DeletionPolicy`] to
/// the reference nodes in `documents`
///
/// Documents not supplied are never touched; their references to the
/// entity become unresolved.
pub async fn delete_shared_block(
    registry: &SharedBlockRegistry,
    confirmed: ConfirmedDeletion,
    documents: &mut [&mut DocumentTree],
) -> Result<DeletionReport> {
    let id = registry.current_id(&confirmed.entity_id());
    let targets: Vec<String> = registry.aliases(&id).iter().map(ToString::to_string).collect();
    let referencing = count_references(documents, &targets);
    let policy = registry.config().deletion_policy;

    if policy == DeletionPolicy::BlockWhileReferenced && referencing > 0 {
        return Err(Error::Referenced {
            id,
            count: referencing,
        });
    }

    let entity = registry.delete(confirmed).await?;

    let (references_removed, dangling) = match policy {
        DeletionPolicy::CascadeReferences => {
            let removed = documents
                .iter_mut()
                .map(|doc| {
                    targets
                        .iter()
                        .map(|target| doc.remove_references(target).len())
                        .sum::<usize>()
                })
                .sum();
            (removed, 0)
        }
        DeletionPolicy::LeaveDangling | DeletionPolicy::BlockWhileReferenced => (0, referencing),
    };
    if dangling > 0 {
        tracing::warn!(%id, dangling, "Deleted shared block is still referenced");
    }

    Ok(DeletionReport {
        entity,
        references_removed,
        dangling,
    })
}

fn count_references(documents: &[&mut DocumentTree], targets: &[String]) -> usize {
    documents
        .iter()
        .map(|doc| {
            doc.references()
                .iter()
                .filter(|(_, t)| targets.contains(t))
                .count()
        })
        .sum()
}
