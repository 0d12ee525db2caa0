//! Document trees for the shared block editor
//!
//! A [`DocumentTree`] is an ordered forest of [`ContentNode`]s keyed by
//! [`NodeId`]. Reference nodes stand in for shared blocks by carrying the
//! shared entity's id in their `ref` attribute; everything else about shared
//! blocks lives in `blocks-core`.

pub mod edit;
pub mod error;
pub mod node;
pub mod tree;

pub use edit::{TreeEdit, TreeEditKind};
pub use error::{Error, Result};
pub use node::{ContentNode, NodeId, PARAGRAPH_KIND, REFERENCE_ATTR, REFERENCE_KIND};
pub use tree::DocumentTree;
