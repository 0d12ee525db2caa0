//! Error types for blocks-tree

use crate::node::NodeId;

/// Result type for blocks-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in blocks-tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Node not found: {id}")]
    NotFound { id: NodeId },

    #[error("Node id {id} already exists in the tree")]
    DuplicateNodeId { id: NodeId },

    #[error("Index {index} out of bounds for {len} siblings")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Node {id} is not a reference node")]
    NotAReference { id: NodeId },
}
