//! Shared block registry
//!
//! The registry is the single owner of shared block entities. Every other
//! component reaches an entity through it, by id, for the length of one
//! operation.
//!
//! Saves and deletes of the same entity are serialized behind a per-entity
//! FIFO lock, so a save requested while another is in flight waits for it
//! and then persists a complete draft. Operations on different entities
//! do not wait for each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blocks_tree::ContentNode;
use chrono::Utc;

use crate::catalog::{InserterCatalog, InserterEntry};
use crate::config::BlocksConfig;
use crate::deletion::{ConfirmedDeletion, PendingDeletion};
use crate::entity::{BlockRecord, Draft, EntityId, SharedBlock};
use crate::error::{Error, Result};
use crate::persistence::{PersistError, PersistenceService};

/// Result of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The entity's id after the save
    pub id: EntityId,
    /// The temporary id this save replaced, on first save
    pub promoted_from: Option<EntityId>,
}

type EntityLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
struct State {
    entities: HashMap<EntityId, SharedBlock>,
    catalog: InserterCatalog,
    /// Per-entity save/delete serialization
    locks: HashMap<EntityId, EntityLock>,
    /// Retired temporary id -> permanent id, so operations queued behind
    /// the promoting save find their entity
    promoted: HashMap<EntityId, EntityId>,
    /// Entity -> token of the edit lease holding it
    leases: HashMap<EntityId, u64>,
    next_lease: u64,
}

impl State {
    /// Follow promotions from a possibly retired temporary id
    fn current_id(&self, id: &EntityId) -> EntityId {
        let mut current = *id;
        while let Some(next) = self.promoted.get(&current) {
            current = *next;
        }
        current
    }

    fn entity_mut(&mut self, id: &EntityId) -> Result<&mut SharedBlock> {
        self.entities.get_mut(id).ok_or(Error::NotFound { id: *id })
    }
}

struct Inner {
    config: BlocksConfig,
    persistence: Arc<dyn PersistenceService>,
    state: Mutex<State>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of shared block entities
///
/// Cloning the registry yields another handle to the same entities.
#[derive(Clone)]
pub struct SharedBlockRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SharedBlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBlockRegistry")
            .field("entities", &self.len())
            .finish_non_exhaustive()
    }
}

impl SharedBlockRegistry {
    pub fn new(persistence: Arc<dyn PersistenceService>, config: BlocksConfig) -> Self {
        let state = State {
            catalog: InserterCatalog::new(&config),
            ..State::default()
        };
        Self {
            inner: Arc::new(Inner {
                config,
                persistence,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> &BlocksConfig {
        &self.inner.config
    }

    /// Create a temporary, untitled entity holding `content`
    ///
    /// Nothing is persisted until the first save.
    pub fn create_from_content(&self, content: Vec<ContentNode>) -> EntityId {
        let block = SharedBlock::new_temporary(content);
        let id = block.id;
        let mut state = self.inner.state();
        state.catalog.index(&block);
        state.entities.insert(id, block);
        tracing::info!(%id, "Created shared block");
        id
    }

    /// Snapshot of an entity's current state
    pub fn get(&self, id: &EntityId) -> Result<SharedBlock> {
        self.inner
            .state()
            .entities
            .get(id)
            .cloned()
            .ok_or(Error::NotFound { id: *id })
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.inner.state().entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.state().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace an entity's in-memory content and mark it dirty
    pub fn update_content(&self, id: &EntityId, content: Vec<ContentNode>) -> Result<()> {
        let mut state = self.inner.state();
        let block = state.entity_mut(id)?;
        block.content = content;
        block.touch();
        tracing::debug!(%id, "Updated shared block content");
        Ok(())
    }

    /// Replace an entity's in-memory title and mark it dirty
    ///
    /// The inserter entry is regenerated immediately.
    pub fn update_title(&self, id: &EntityId, title: impl Into<String>) -> Result<()> {
        let mut state = self.inner.state();
        let block = state.entity_mut(id)?;
        block.title = title.into();
        block.touch();
        let block = block.clone();
        state.catalog.index(&block);
        tracing::debug!(%id, title = %block.title, "Updated shared block title");
        Ok(())
    }

    /// Persist an entity's current content, optionally with a new title
    ///
    /// On first save the temporary id is replaced by the permanent id from
    /// persistence; see [`SaveOutcome::promoted_from`]. On failure the
    /// registry is left exactly as it was.
    pub async fn save(&self, id: &EntityId, title: Option<&str>) -> Result<SaveOutcome> {
        let title = title.map(str::to_string);
        self.persist(id, move |block| Draft {
            title: title.unwrap_or_else(|| block.title.clone()),
            content: block.content.clone(),
        })
        .await
    }

    /// Persist a draft as the entity's new title and content
    ///
    /// The registry copy changes only after persistence confirms the save.
    pub async fn commit(&self, id: &EntityId, draft: Draft) -> Result<SaveOutcome> {
        self.persist(id, move |_| draft).await
    }

    async fn persist(
        &self,
        id: &EntityId,
        make_draft: impl FnOnce(&SharedBlock) -> Draft,
    ) -> Result<SaveOutcome> {
        let lock = self.entity_lock(id)?;
        let _serial = lock.lock().await;

        // Snapshot after acquiring the lock so a queued save sees the
        // outcome of the one before it
        let (current, draft, record, revision) = {
            let state = self.inner.state();
            let current = state.current_id(id);
            let block = state
                .entities
                .get(&current)
                .ok_or(Error::NotFound { id: *id })?;
            let draft = make_draft(block);
            let record = BlockRecord {
                id: current.permanent(),
                title: draft.title.clone(),
                content: draft.content.clone(),
            };
            (current, draft, record, block.revision)
        };

        let permanent = self
            .with_retries("save", &current, || {
                self.inner.persistence.persist_create_or_update(&record)
            })
            .await?;

        let mut state = self.inner.state();
        let new_id = if current.is_temporary() {
            EntityId::Permanent(permanent)
        } else {
            if current.permanent() != Some(permanent) {
                tracing::warn!(%current, permanent, "Persistence returned a different id on update");
            }
            current
        };
        if new_id != current && state.entities.contains_key(&new_id) {
            return Err(Error::IdConflict { id: new_id });
        }

        let mut block = state
            .entities
            .remove(&current)
            .ok_or(Error::NotFound { id: current })?;
        if block.revision == revision {
            block.title = draft.title;
            block.content = draft.content;
            block.is_dirty = false;
        } else {
            // Edited while the save was in flight; the newer local state
            // stays dirty until saved again
            tracing::debug!(id = %current, "Shared block changed during save");
        }
        block.id = new_id;
        block.updated = Utc::now();

        let promoted_from = (new_id != current).then_some(current);
        if let Some(old) = promoted_from {
            state.catalog.remove(&old);
            state.promoted.insert(old, new_id);
            if let Some(lock) = state.locks.remove(&old) {
                state.locks.insert(new_id, lock);
            }
            if let Some(token) = state.leases.remove(&old) {
                state.leases.insert(new_id, token);
            }
            tracing::info!(from = %old, to = %new_id, "Promoted shared block to permanent id");
        }
        state.catalog.index(&block);
        state.entities.insert(new_id, block);
        tracing::info!(id = %new_id, "Saved shared block");

        Ok(SaveOutcome {
            id: new_id,
            promoted_from,
        })
    }

    /// Start a deletion; it must be confirmed before it can run
    pub fn request_delete(&self, id: &EntityId) -> Result<PendingDeletion> {
        let block = self.get(id)?;
        Ok(PendingDeletion::new(block.id, block.title))
    }

    /// Delete a confirmed entity from the registry and from persistence
    ///
    /// Its inserter entry goes with it. Reference nodes pointing at it are
    /// left alone; they resolve to [`Resolution::Unresolved`](crate::Resolution::Unresolved)
    /// from now on. Temporary entities are removed without a persistence call.
    pub async fn delete(&self, confirmed: ConfirmedDeletion) -> Result<SharedBlock> {
        let id = confirmed.entity_id();
        let lock = self.entity_lock(&id)?;
        let _serial = lock.lock().await;

        let current = {
            let state = self.inner.state();
            let current = state.current_id(&id);
            if !state.entities.contains_key(&current) {
                return Err(Error::NotFound { id });
            }
            if state.leases.contains_key(&current) {
                return Err(Error::busy(format!("shared block {current} is being edited")));
            }
            current
        };

        if let Some(permanent) = current.permanent() {
            self.with_retries("delete", &current, || {
                self.inner.persistence.persist_delete(permanent)
            })
            .await?;
        }

        let mut state = self.inner.state();
        let block = state
            .entities
            .remove(&current)
            .ok_or(Error::NotFound { id: current })?;
        state.catalog.remove(&current);
        state.locks.remove(&current);
        state.promoted.retain(|_, to| *to != current);
        tracing::info!(id = %current, "Deleted shared block");
        Ok(block)
    }

    /// Drop a temporary entity that never made it into a document
    pub(crate) fn discard_temporary(&self, id: &EntityId) {
        if !id.is_temporary() {
            return;
        }
        let mut state = self.inner.state();
        state.entities.remove(id);
        state.catalog.remove(id);
        state.locks.remove(id);
    }

    /// Load every persisted block into the registry
    ///
    /// Clean local copies are replaced; dirty ones are kept so unsaved
    /// edits are never overwritten. Returns the number of blocks loaded.
    pub async fn fetch_all(&self) -> Result<usize> {
        let stored = self
            .inner
            .persistence
            .load_all()
            .await
            .map_err(|source| Error::FetchFailure { source })?;

        let mut state = self.inner.state();
        let mut loaded = 0;
        for block in stored {
            let block = SharedBlock::from_stored(block);
            if state.entities.get(&block.id).is_some_and(|b| b.is_dirty) {
                tracing::debug!(id = %block.id, "Keeping dirty local copy over fetched block");
                continue;
            }
            state.catalog.index(&block);
            state.entities.insert(block.id, block);
            loaded += 1;
        }
        tracing::info!(loaded, "Fetched shared blocks");
        Ok(loaded)
    }

    /// Inserter entries whose label contains `query`, most recent first
    pub fn search(&self, query: &str) -> Vec<InserterEntry> {
        self.inner.state().catalog.search(query).cloned().collect()
    }

    /// The inserter entry for one entity
    pub fn catalog_entry(&self, id: &EntityId) -> Option<InserterEntry> {
        self.inner.state().catalog.get(id).cloned()
    }

    /// Claim exclusive editing of an entity
    ///
    /// Fails with [`Error::Busy`] while another lease holds the entity.
    pub fn acquire_lease(&self, id: &EntityId) -> Result<EditLease> {
        let mut state = self.inner.state();
        if !state.entities.contains_key(id) {
            return Err(Error::NotFound { id: *id });
        }
        if state.leases.contains_key(id) {
            return Err(Error::busy(format!("shared block {id} is already being edited")));
        }
        state.next_lease += 1;
        let token = state.next_lease;
        state.leases.insert(*id, token);
        Ok(EditLease {
            registry: self.clone(),
            token,
        })
    }

    /// Id an entity is known by now, following temporary-id promotion
    pub(crate) fn current_id(&self, id: &EntityId) -> EntityId {
        self.inner.state().current_id(id)
    }

    /// `id` followed by every retired temporary id promoted to it
    pub(crate) fn aliases(&self, id: &EntityId) -> Vec<EntityId> {
        let state = self.inner.state();
        let mut aliases = vec![*id];
        let mut i = 0;
        while i < aliases.len() {
            let to = aliases[i];
            aliases.extend(
                state
                    .promoted
                    .iter()
                    .filter(|(_, next)| **next == to)
                    .map(|(from, _)| *from),
            );
            i += 1;
        }
        aliases
    }

    fn entity_lock(&self, id: &EntityId) -> Result<EntityLock> {
        let mut state = self.inner.state();
        let current = state.current_id(id);
        if !state.entities.contains_key(&current) {
            return Err(Error::NotFound { id: *id });
        }
        Ok(state.locks.entry(current).or_default().clone())
    }

    /// Run a persistence call, retrying up to the configured count
    async fn with_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        id: &EntityId,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, PersistError>>,
    {
        let attempts = self.inner.config.save_retries + 1;
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= attempts => {
                    tracing::warn!(%id, operation, error = %source, "Persistence failed");
                    return Err(Error::PersistenceFailure {
                        operation,
                        id: *id,
                        source,
                    });
                }
                Err(source) => {
                    tracing::warn!(%id, operation, attempt, error = %source, "Persistence failed, retrying");
                    attempt += 1;
                }
            }
        }
    }
}

/// Exclusive claim on editing one entity
///
/// Follows the entity through temporary-to-permanent promotion and is
/// released when dropped.
pub struct EditLease {
    registry: SharedBlockRegistry,
    token: u64,
}

impl EditLease {
    /// The leased entity's current id, or `None` once it is gone
    pub fn entity_id(&self) -> Option<EntityId> {
        self.registry
            .inner
            .state()
            .leases
            .iter()
            .find(|(_, token)| **token == self.token)
            .map(|(id, _)| *id)
    }
}

impl std::fmt::Debug for EditLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditLease")
            .field("token", &self.token)
            .finish()
    }
}

impl Drop for EditLease {
    fn drop(&mut self) {
        let token = self.token;
        self.registry
            .inner
            .state()
            .leases
            .retain(|_, held| *held != token);
    }
}
