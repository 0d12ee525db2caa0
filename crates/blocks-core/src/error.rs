//! Error types for blocks-core

use blocks_tree::NodeId;

use crate::entity::EntityId;
use crate::persistence::PersistError;

/// Result type for blocks-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in blocks-core operations
///
/// A reference to a missing entity is not an error when resolving; see
/// [`Resolution::Unresolved`](crate::Resolution::Unresolved).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No shared block with this id is in the registry
    #[error("Shared block not found: {id}")]
    NotFound { id: EntityId },

    /// A conflicting edit session or save holds the entity
    #[error("Busy: {reason}")]
    Busy { reason: String },

    /// The persistence round trip failed; local state is unchanged
    #[error("Failed to {operation} shared block {id}: {source}")]
    PersistenceFailure {
        operation: &'static str,
        id: EntityId,
        #[source]
        source: PersistError,
    },

    /// Loading the persisted library failed
    #[error("Failed to fetch shared blocks: {source}")]
    FetchFailure {
        #[source]
        source: PersistError,
    },

    /// Deletion refused because documents still reference the entity
    #[error("Shared block {id} is still referenced by {count} node(s)")]
    Referenced { id: EntityId, count: usize },

    /// Permanent id returned by persistence is already held by another entity
    #[error("Permanent id {id} is already held by another shared block")]
    IdConflict { id: EntityId },

    /// The node is already a reference to a shared block
    #[error("Node {node} already references a shared block")]
    AlreadyShared { node: NodeId },

    /// Edit session operation not valid in the current state
    #[error("Invalid edit session state: {0}")]
    InvalidState(String),

    #[error("Invalid shared block id: {0}")]
    InvalidEntityId(String),

    /// Document tree error from blocks-tree
    #[error(transparent)]
    Tree(#[from] blocks_tree::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn busy(reason: impl Into<String>) -> Self {
        Self::Busy {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceFailure { .. } | Self::FetchFailure { .. }
        )
    }
}
