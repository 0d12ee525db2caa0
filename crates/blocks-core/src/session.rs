//! Edit sessions over shared blocks
//!
//! An [`EditSurface`] moves through `Display -> Editing -> Saving ->
//! Display`, or `Editing -> Display` on cancel. Editing works on a draft
//! buffer; the registry's copy changes only when a save is confirmed by
//! persistence. A failed save returns to `Editing` with the draft intact.
//!
//! Each surface edits at most one entity at a time, and an entity can be
//! edited by at most one surface at a time (see [`EditLease`]).

use std::sync::{Mutex, MutexGuard, PoisonError};

use blocks_tree::ContentNode;

use crate::entity::{Draft, EntityId};
use crate::error::{Error, Result};
use crate::registry::{EditLease, SaveOutcome, SharedBlockRegistry};

/// Observable state of an edit surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Display,
    Editing { entity: EntityId },
    Saving { entity: EntityId },
}

#[derive(Debug)]
struct Session {
    lease: EditLease,
    entity: EntityId,
    draft: Draft,
}

impl Session {
    /// Entity id, refreshed in case a save elsewhere promoted it
    fn entity(&self) -> EntityId {
        self.lease.entity_id().unwrap_or(self.entity)
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Display,
    Editing(Session),
    Saving(Session),
}

/// Puts an in-flight save back into editing when dropped
///
/// A save future dropped mid-commit leaves the surface editing with its
/// draft and lease; a completed save has already moved the phase on.
struct RestoreEditing<'a>(&'a Mutex<Phase>);

impl Drop for RestoreEditing<'_> {
    fn drop(&mut self) {
        let mut phase = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *phase = match std::mem::take(&mut *phase) {
            Phase::Saving(session) => Phase::Editing(session),
            other => other,
        };
    }
}

/// One editing surface's draft/save/cancel state machine
#[derive(Debug)]
pub struct EditSurface {
    registry: SharedBlockRegistry,
    phase: Mutex<Phase>,
}

impl EditSurface {
    pub fn new(registry: SharedBlockRegistry) -> Self {
        Self {
            registry,
            phase: Mutex::new(Phase::Display),
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        match &*self.phase() {
            Phase::Display => SessionState::Display,
            Phase::Editing(session) => SessionState::Editing {
                entity: session.entity(),
            },
            Phase::Saving(session) => SessionState::Saving {
                entity: session.entity(),
            },
        }
    }

    /// The current draft, while editing
    pub fn draft(&self) -> Option<Draft> {
        match &*self.phase() {
            Phase::Editing(session) => Some(session.draft.clone()),
            Phase::Display | Phase::Saving(_) => None,
        }
    }

    /// Open a draft over an entity's title and content
    ///
    /// Re-entering edit mode on the entity already being edited returns the
    /// existing draft. Fails with [`Error::Busy`] while this surface is
    /// saving or editing another entity, or while another surface holds
    /// the entity.
    pub fn begin_edit(&self, id: &EntityId) -> Result<Draft> {
        let mut phase = self.phase();
        match &*phase {
            Phase::Saving(session) => {
                return Err(saving(session));
            }
            Phase::Editing(session) if session.entity() == *id => {
                return Ok(session.draft.clone());
            }
            Phase::Editing(session) => {
                return Err(Error::busy(format!(
                    "shared block {} is being edited",
                    session.entity()
                )));
            }
            Phase::Display => {}
        }

        let lease = self.registry.acquire_lease(id)?;
        let draft = self.registry.get(id)?.to_draft();
        *phase = Phase::Editing(Session {
            lease,
            entity: *id,
            draft: draft.clone(),
        });
        tracing::debug!(%id, "Editing shared block");
        Ok(draft)
    }

    /// Change the draft's title
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        self.with_draft(|draft| draft.title = title)
    }

    /// Replace the draft's content
    pub fn set_content(&self, content: Vec<ContentNode>) -> Result<()> {
        self.with_draft(|draft| draft.content = content)
    }

    /// Apply an arbitrary change to the draft
    pub fn with_draft(&self, change: impl FnOnce(&mut Draft)) -> Result<()> {
        match &mut *self.phase() {
            Phase::Editing(session) => {
                change(&mut session.draft);
                Ok(())
            }
            Phase::Saving(session) => Err(saving(session)),
            Phase::Display => Err(Error::invalid_state("not editing")),
        }
    }

    /// Discard the draft and return to display
    ///
    /// Never touches persistence. A no-op in display; refused while saving.
    pub fn cancel(&self) -> Result<()> {
        let mut phase = self.phase();
        match &*phase {
            Phase::Saving(session) => Err(saving(session)),
            Phase::Editing(session) => {
                tracing::debug!(id = %session.entity(), "Discarded shared block draft");
                *phase = Phase::Display;
                Ok(())
            }
            Phase::Display => Ok(()),
        }
    }

    /// Commit the draft through the registry
    ///
    /// On success the surface returns to display. On failure it returns to
    /// editing with the draft preserved and the error is returned. Dropping
    /// the future before the commit completes also returns to editing.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let (entity, draft) = {
            let mut phase = self.phase();
            match std::mem::take(&mut *phase) {
                Phase::Editing(session) => {
                    let entity = session.entity();
                    let draft = session.draft.clone();
                    *phase = Phase::Saving(session);
                    (entity, draft)
                }
                Phase::Saving(session) => {
                    let err = saving(&session);
                    *phase = Phase::Saving(session);
                    return Err(err);
                }
                Phase::Display => return Err(Error::invalid_state("not editing")),
            }
        };
        let restore = RestoreEditing(&self.phase);

        tracing::debug!(id = %entity, "Saving shared block draft");
        let result = self.registry.commit(&entity, draft).await;

        match result {
            Ok(outcome) => {
                // Dropping the session releases the lease
                *self.phase() = Phase::Display;
                drop(restore);
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(id = %entity, error = %err, "Shared block save failed; draft kept");
                drop(restore);
                Err(err)
            }
        }
    }
}

fn saving(session: &Session) -> Error {
    Error::busy(format!("shared block {} is being saved", session.entity()))
}
