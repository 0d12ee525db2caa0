//! Inserter catalog
//!
//! One searchable entry per shared block. The registry updates the catalog
//! in the same step as the change that caused it (creation, title change,
//! deletion), so there is never a window where the two disagree.

use crate::config::BlocksConfig;
use crate::entity::{EntityId, SharedBlock};

/// A searchable inserter item for one shared block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InserterEntry {
    /// Title, or the untitled label when the title is empty
    pub label: String,
    /// Lowercased label words plus configured keywords
    pub match_tokens: Vec<String>,
    /// Entity the entry inserts a reference to
    pub target_id: EntityId,
    /// Logical modification time; larger is more recent
    pub modified: u64,
    folded_label: String,
}

impl InserterEntry {
    fn matches(&self, folded_query: &str) -> bool {
        self.folded_label.contains(folded_query)
    }
}

/// Search index over shared blocks
///
/// Entries are kept ordered by most recently modified first, then by
/// label, so searches never need to sort.
#[derive(Debug, Clone, Default)]
pub struct InserterCatalog {
    entries: Vec<InserterEntry>,
    untitled_label: String,
    keywords: Vec<String>,
    clock: u64,
}

impl InserterCatalog {
    pub fn new(config: &BlocksConfig) -> Self {
        Self {
            entries: Vec::new(),
            untitled_label: config.untitled_label.clone(),
            keywords: config
                .catalog_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            clock: 0,
        }
    }

    /// Add or regenerate the entry for a block
    pub fn index(&mut self, block: &SharedBlock) {
        self.remove_entry(&block.id);
        self.clock += 1;

        let label = if block.title.trim().is_empty() {
            self.untitled_label.clone()
        } else {
            block.title.clone()
        };
        let folded_label = label.to_lowercase();
        let mut match_tokens: Vec<String> =
            folded_label.split_whitespace().map(str::to_string).collect();
        match_tokens.extend(self.keywords.iter().cloned());

        let entry = InserterEntry {
            label,
            match_tokens,
            target_id: block.id,
            modified: self.clock,
            folded_label,
        };
        let pos = self.entries.partition_point(|e| {
            e.modified > entry.modified || (e.modified == entry.modified && e.label < entry.label)
        });
        self.entries.insert(pos, entry);
    }

    /// Remove the entry for an entity, returning it if present
    pub fn remove(&mut self, id: &EntityId) -> Option<InserterEntry> {
        self.remove_entry(id)
    }

    fn remove_entry(&mut self, id: &EntityId) -> Option<InserterEntry> {
        let pos = self.entries.iter().position(|e| e.target_id == *id)?;
        Some(self.entries.remove(pos))
    }

    /// Entries whose label contains `query`, case-insensitively
    ///
    /// Ordered by last modification (most recent first), then label.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a InserterEntry> + 'a {
        let folded = query.to_lowercase();
        self.entries.iter().filter(move |e| e.matches(&folded))
    }

    pub fn get(&self, id: &EntityId) -> Option<&InserterEntry> {
        self.entries.iter().find(|e| e.target_id == *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
