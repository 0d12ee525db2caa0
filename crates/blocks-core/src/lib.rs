//! Shared blocks for a block-based document editor
//!
//! A shared block is a named, independently persisted fragment of content
//! that any number of documents can reference. This crate provides:
//!
//! - **Registry**: owns shared block entities, promotes temporary ids to
//!   permanent ones on first save, and serializes saves per entity
//! - **Resolver**: live lookup of a reference node's current content
//! - **Inserter catalog**: searchable entries kept in step with the registry
//! - **Conversion**: regular content to shared and back
//! - **Edit sessions**: the draft/save/cancel lifecycle of one editing surface
//! - **Deletion**: confirmed, entity-global deletion under a configurable
//!   policy for the references it leaves behind
//!
//! # Architecture
//!
//! ```text
//!        EditSurface        conversion / deletion
//!             |                     |
//!             +------ Registry -----+---- DocumentTree (blocks-tree)
//!                     |      |
//!          InserterCatalog  PersistenceService (FileStore, ...)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use blocks_core::{conversion, BlocksConfig, FileStore, SharedBlockRegistry};
//! use blocks_tree::{ContentNode, DocumentTree};
//! use std::sync::Arc;
//!
//! async fn example() -> blocks_core::Result<()> {
//!     let store = Arc::new(FileStore::new("library.json"));
//!     let registry = SharedBlockRegistry::new(store, BlocksConfig::default());
//!     let paragraph = ContentNode::paragraph("Hello there!");
//!     let node = paragraph.id;
//!     let mut doc = DocumentTree::from_nodes(vec![paragraph])?;
//!
//!     let id = conversion::convert_to_shared(&registry, &mut doc, node)?;
//!     let outcome = registry.save(&id, Some("Greeting block")).await?;
//!     conversion::relink(&mut doc, &outcome);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod conversion;
pub mod deletion;
pub mod entity;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod resolver;
pub mod session;

pub use catalog::{InserterCatalog, InserterEntry};
pub use config::BlocksConfig;
pub use deletion::{ConfirmedDeletion, DeletionPolicy, DeletionReport, PendingDeletion};
pub use entity::{BlockRecord, Draft, EntityId, SharedBlock, StoredBlock};
pub use error::{Error, Result};
pub use persistence::{FileStore, PersistError, PersistenceService};
pub use registry::{EditLease, SaveOutcome, SharedBlockRegistry};
pub use resolver::{ReferenceResolver, ResolvedBlock, Resolution};
pub use session::{EditSurface, SessionState};
