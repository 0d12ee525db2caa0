//! Command implementations

mod delete;
mod edit;
mod list;
mod show;

pub use delete::run_delete;
pub use edit::{run_create, run_rename};
pub use list::{run_list, run_search};
pub use show::run_show;

use std::path::Path;
use std::sync::Arc;

use blocks_core::{BlocksConfig, EntityId, Error, FileStore, SharedBlock, SharedBlockRegistry};

use crate::error::{CliError, Result};

/// An opened library: a registry hydrated from the library file
pub struct Library {
    pub registry: SharedBlockRegistry,
}

impl Library {
    pub async fn open(path: &Path, config: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(config) => BlocksConfig::load(config)?,
            None => BlocksConfig::default(),
        };
        let registry = SharedBlockRegistry::new(Arc::new(FileStore::new(path)), config);
        let loaded = registry.fetch_all().await?;
        tracing::debug!(?path, loaded, "Opened library");
        Ok(Self { registry })
    }

    pub fn parse_id(&self, id: &str) -> Result<EntityId> {
        id.parse()
            .map_err(|_| CliError::user(format!("'{id}' is not a valid shared block id")))
    }

    pub fn block(&self, id: &str) -> Result<SharedBlock> {
        let id = self.parse_id(id)?;
        self.registry.get(&id).map_err(|e| match e {
            Error::NotFound { id } => CliError::user(format!("No shared block with id {id}")),
            other => other.into(),
        })
    }

    /// Display label for a block
    pub fn label<'a>(&'a self, block: &'a SharedBlock) -> &'a str {
        self.registry.config().label_for(&block.title)
    }
}
