//! In-memory persistence for registry tests.
//!
//! [`MemoryPersistence`] allocates permanent ids sequentially from 1, like
//! the file store, and lets tests:
//!
//! - fail the next N calls ([`fail_next`](MemoryPersistence::fail_next))
//! - hold calls at a gate until released ([`hold`](MemoryPersistence::hold) /
//!   [`release`](MemoryPersistence::release)), to observe in-flight saves
//! - inspect every record that was persisted, in order

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use blocks_core::{BlockRecord, PersistError, PersistenceService, StoredBlock};
use blocks_tree::ContentNode;
use tokio::sync::watch;

#[derive(Debug)]
struct Store {
    blocks: BTreeMap<u64, StoredBlock>,
    next_id: u64,
    failures: usize,
    history: Vec<BlockRecord>,
    deleted: Vec<u64>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            blocks: BTreeMap::new(),
            next_id: 1,
            failures: 0,
            history: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Persistence service holding blocks in memory.
#[derive(Debug)]
pub struct MemoryPersistence {
    store: Mutex<Store>,
    /// `true` while calls may proceed
    gate: watch::Sender<bool>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPersistence {
    /// Create an empty store with the gate open.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            store: Mutex::new(Store::default()),
            gate,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-populate a block as if it had been saved earlier; returns its id.
    pub fn seed(&self, title: &str, content: Vec<ContentNode>) -> u64 {
        let mut store = self.store();
        let id = store.next_id;
        store.next_id += 1;
        store.blocks.insert(
            id,
            StoredBlock {
                id,
                title: title.to_string(),
                content,
            },
        );
        id
    }

    /// Make the next `count` calls fail with [`PersistError::Rejected`].
    pub fn fail_next(&self, count: usize) {
        self.store().failures = count;
    }

    /// Hold every subsequent call until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held and future calls proceed.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Calls currently inside the service, held or running.
    pub fn pending_saves(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were ever inside the service at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every successfully persisted record, in order.
    pub fn history(&self) -> Vec<BlockRecord> {
        self.store().history.clone()
    }

    /// Ids passed to successful deletes, in order.
    pub fn deleted(&self) -> Vec<u64> {
        self.store().deleted.clone()
    }

    /// The block currently stored under `id`.
    pub fn stored(&self, id: u64) -> Option<StoredBlock> {
        self.store().blocks.get(&id).cloned()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.store().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Track the call as in flight, then wait at the gate.
    async fn enter(&self) -> Flight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let flight = Flight(&self.in_flight);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        flight
    }

    fn take_failure(&self) -> Result<(), PersistError> {
        let mut store = self.store();
        if store.failures > 0 {
            store.failures -= 1;
            return Err(PersistError::Rejected("scheduled failure".to_string()));
        }
        Ok(())
    }
}

struct Flight<'a>(&'a AtomicUsize);

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn persist_create_or_update(&self, record: &BlockRecord) -> Result<u64, PersistError> {
        let _flight = self.enter().await;
        self.take_failure()?;

        let mut store = self.store();
        let id = match record.id {
            Some(id) if store.blocks.contains_key(&id) => id,
            Some(id) => return Err(PersistError::Missing { id }),
            None => {
                let id = store.next_id;
                store.next_id += 1;
                id
            }
        };
        store.blocks.insert(
            id,
            StoredBlock {
                id,
                title: record.title.clone(),
                content: record.content.clone(),
            },
        );
        store.history.push(record.clone());
        Ok(id)
    }

    async fn persist_delete(&self, id: u64) -> Result<(), PersistError> {
        let _flight = self.enter().await;
        self.take_failure()?;

        let mut store = self.store();
        if store.blocks.remove(&id).is_none() {
            return Err(PersistError::Missing { id });
        }
        store.deleted.push(id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredBlock>, PersistError> {
        self.take_failure()?;
        Ok(self.store().blocks.values().cloned().collect())
    }
}
