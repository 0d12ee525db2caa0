//! Shared block entity types

use std::fmt;
use std::str::FromStr;

use blocks_tree::ContentNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Identity of a shared block
///
/// Entities start with a locally generated temporary id and receive a
/// permanent id from persistence on their first successful save. The
/// string form (`tmp-<uuid>` or the decimal permanent id) is what
/// reference nodes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityId {
    Temporary(Uuid),
    Permanent(u64),
}

impl EntityId {
    /// Allocate a fresh temporary id
    pub fn temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The permanent id, if one has been assigned
    pub fn permanent(&self) -> Option<u64> {
        match self {
            Self::Permanent(id) => Some(*id),
            Self::Temporary(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(uuid) => write!(f, "{TEMPORARY_PREFIX}{}", uuid.simple()),
            Self::Permanent(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::InvalidEntityId(s.to_string());
        let id = match s.strip_prefix(TEMPORARY_PREFIX) {
            Some(uuid) => Uuid::parse_str(uuid)
                .map(Self::Temporary)
                .map_err(|_| invalid())?,
            None => s.parse().map(Self::Permanent).map_err(|_| invalid())?,
        };
        // Reference nodes are matched by string, so only the canonical form is accepted
        if id.to_string() != s {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A shared block as held by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedBlock {
    pub id: EntityId,
    /// Title; empty when the block is untitled
    pub title: String,
    /// Ordered content nodes
    pub content: Vec<ContentNode>,
    /// Whether local changes have not been confirmed by persistence
    pub is_dirty: bool,
    /// When the block was last changed locally
    pub updated: DateTime<Utc>,
    /// Local change counter, used to detect edits made while a save is in flight
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl SharedBlock {
    pub(crate) fn new_temporary(content: Vec<ContentNode>) -> Self {
        Self {
            id: EntityId::temporary(),
            title: String::new(),
            content,
            is_dirty: true,
            updated: Utc::now(),
            revision: 0,
        }
    }

    pub(crate) fn from_stored(stored: StoredBlock) -> Self {
        Self {
            id: EntityId::Permanent(stored.id),
            title: stored.title,
            content: stored.content,
            is_dirty: false,
            updated: Utc::now(),
            revision: 0,
        }
    }

    /// Whether the block has never been persisted
    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }

    /// Concatenated text of the block's content
    pub fn plain_text(&self) -> String {
        self.content.iter().map(ContentNode::plain_text).collect()
    }

    /// A draft initialized from the block's current title and content
    pub fn to_draft(&self) -> Draft {
        Draft {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
        self.updated = Utc::now();
    }
}

/// Uncommitted working copy of a block's title and content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub content: Vec<ContentNode>,
}

impl Draft {
    pub fn new(title: impl Into<String>, content: Vec<ContentNode>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }

    /// Concatenated text of the draft's content
    pub fn plain_text(&self) -> String {
        self.content.iter().map(ContentNode::plain_text).collect()
    }
}

/// What the registry hands to persistence on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Permanent id, or `None` when the block is being created
    pub id: Option<u64>,
    pub title: String,
    pub content: Vec<ContentNode>,
}

/// A block as persistence returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: u64,
    pub title: String,
    pub content: Vec<ContentNode>,
}
