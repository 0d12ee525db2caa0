//! Persistence collaborator
//!
//! The registry reaches durable storage only through
//! [`PersistenceService`]. Transport is the implementor's concern; the
//! registry only distinguishes success from failure.

mod file;

pub use file::FileStore;

use async_trait::async_trait;

use crate::entity::{BlockRecord, StoredBlock};

/// Errors reported by a persistence service
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The service refused or could not complete the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Record {id} not found in store")]
    Missing { id: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Durable storage for shared blocks
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Create (`record.id == None`) or update a block
    ///
    /// Returns the block's permanent id.
    async fn persist_create_or_update(&self, record: &BlockRecord) -> Result<u64, PersistError>;

    /// Delete a block by permanent id
    async fn persist_delete(&self, id: u64) -> Result<(), PersistError>;

    /// Every persisted block
    async fn load_all(&self) -> Result<Vec<StoredBlock>, PersistError>;
}
