//! Configuration for shared block behavior
//!
//! Loaded from TOML; every field has a default so an empty file (or no
//! file at all) yields the stock behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::deletion::DeletionPolicy;
use crate::error::Result;

/// Label shown for shared blocks without a title
pub const DEFAULT_UNTITLED_LABEL: &str = "Untitled shared block";

/// Shared block configuration
///
/// ```toml
/// untitled_label = "Untitled shared block"
/// deletion_policy = "leave-dangling"
/// save_retries = 0
/// catalog_keywords = ["reusable"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocksConfig {
    /// Inserter label for entities whose title is empty
    pub untitled_label: String,
    /// What happens to reference nodes when their entity is deleted
    pub deletion_policy: DeletionPolicy,
    /// Extra attempts at a failed persistence round trip before giving up
    pub save_retries: u32,
    /// Match tokens added to every inserter entry
    pub catalog_keywords: Vec<String>,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            untitled_label: DEFAULT_UNTITLED_LABEL.to_string(),
            deletion_policy: DeletionPolicy::default(),
            save_retries: 0,
            catalog_keywords: vec!["reusable".to_string()],
        }
    }
}

impl BlocksConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(?path, "Loaded shared block config");
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Label for an entity with the given title
    pub fn label_for<'a>(&'a self, title: &'a str) -> &'a str {
        if title.trim().is_empty() {
            &self.untitled_label
        } else {
            title
        }
    }
}
