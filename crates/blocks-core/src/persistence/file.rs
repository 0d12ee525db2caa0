//! File-backed persistence
//!
//! Stores the whole library as one JSON document, rewritten atomically on
//! every change.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{PersistError, PersistenceService};
use crate::entity::{BlockRecord, StoredBlock};

/// On-disk library layout
#[derive(Debug, Serialize, Deserialize)]
struct Library {
    /// Format version for forward compatibility
    version: String,
    /// Next permanent id to hand out
    next_id: u64,
    #[serde(default)]
    blocks: Vec<StoredBlock>,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            next_id: 1,
            blocks: Vec::new(),
        }
    }
}

/// Persistence service backed by a JSON file
///
/// Permanent ids are allocated sequentially starting at 1 and never reused.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the library under a shared lock; a missing file is an empty library
    fn load(&self) -> Result<Library, PersistError> {
        if !self.path.exists() {
            return Ok(Library::default());
        }
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        // Read through the locked handle
        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        // A writer that created the file to lock it may not have renamed
        // the finished library over it yet
        if content.trim().is_empty() {
            return Ok(Library::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the library via temp file and rename, under an exclusive lock
    fn store(&self, library: &Library) -> Result<(), PersistError> {
        let content = serde_json::to_vec_pretty(library)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        lock_file.lock_exclusive()?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp = File::create(&temp_path)?;
        temp.write_all(&content)?;
        temp.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        // Lock released when lock_file is dropped
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for FileStore {
    async fn persist_create_or_update(&self, record: &BlockRecord) -> Result<u64, PersistError> {
        let _guard = self.write_lock.lock().await;
        let mut library = self.load()?;

        let id = match record.id {
            Some(id) => {
                let stored = library
                    .blocks
                    .iter_mut()
                    .find(|b| b.id == id)
                    .ok_or(PersistError::Missing { id })?;
                stored.title = record.title.clone();
                stored.content = record.content.clone();
                id
            }
            None => {
                let id = library.next_id;
                library.next_id += 1;
                library.blocks.push(StoredBlock {
                    id,
                    title: record.title.clone(),
                    content: record.content.clone(),
                });
                id
            }
        };

        self.store(&library)?;
        tracing::debug!(path = ?self.path, id, "Stored shared block");
        Ok(id)
    }

    async fn persist_delete(&self, id: u64) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock().await;
        let mut library = self.load()?;

        let pos = library
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(PersistError::Missing { id })?;
        library.blocks.remove(pos);

        self.store(&library)?;
        tracing::debug!(path = ?self.path, id, "Deleted shared block from store");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredBlock>, PersistError> {
        Ok(self.load()?.blocks)
    }
}
