//! [`TestLibrary`]: a temporary on-disk shared block library.

use std::fs;
use std::path::{Path, PathBuf};

use blocks_core::{FileStore, StoredBlock};
use blocks_tree::ContentNode;
use tempfile::TempDir;

/// A temporary directory holding a `library.json` in the file store format.
///
/// # Example
///
/// ```rust,no_run
/// use blocks_test_utils::library::TestLibrary;
///
/// let library = TestLibrary::with_blocks(&[("Greeting block", "Hello there!")]);
/// assert!(library.path().exists());
/// ```
pub struct TestLibrary {
    temp_dir: TempDir,
}

impl Default for TestLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLibrary {
    /// Create an empty temporary directory; the library file does not exist yet.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("TestLibrary: {e}")),
        }
    }

    /// Create a library holding one single-paragraph block per `(title, text)`,
    /// with ids 1, 2, ... in order.
    pub fn with_blocks(blocks: &[(&str, &str)]) -> Self {
        let library = Self::new();
        let stored: Vec<StoredBlock> = blocks
            .iter()
            .zip(1..)
            .map(|((title, text), id)| StoredBlock {
                id,
                title: title.to_string(),
                content: vec![ContentNode::paragraph(*text)],
            })
            .collect();
        library.write(&stored);
        library
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the library file.
    pub fn path(&self) -> PathBuf {
        self.root().join("library.json")
    }

    /// A file store over the library file.
    pub fn store(&self) -> FileStore {
        FileStore::new(self.path())
    }

    /// Overwrite the library file with `blocks`.
    pub fn write(&self, blocks: &[StoredBlock]) {
        let next_id = blocks.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let library = serde_json::json!({
            "version": "1",
            "next_id": next_id,
            "blocks": blocks,
        });
        let content = serde_json::to_string_pretty(&library)
            .unwrap_or_else(|e| panic!("TestLibrary: failed to serialize: {e}"));
        fs::write(self.path(), content).unwrap_or_else(|e| panic!("TestLibrary: failed to write: {e}"));
    }

    /// The raw library file as JSON.
    pub fn read_json(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.path())
            .unwrap_or_else(|e| panic!("TestLibrary: failed to read: {e}"));
        serde_json::from_str(&content).unwrap_or_else(|e| panic!("TestLibrary: invalid JSON: {e}"))
    }

    /// Titles of the blocks in the library file, in stored order.
    pub fn titles(&self) -> Vec<String> {
        self.read_json()["blocks"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b["title"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
