//! The process-wide game slot.
//!
//! At most one Insider game runs at a time. A game claims the slot with
//! [`GameSlot::try_start`] and holds a [`SlotLease`] until it ends; dropping
//! the lease frees the slot, so a panicking session cannot leave it taken.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use insider_core::error::DomainError;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct GameSlot {
    current: Arc<Mutex<Option<Uuid>>>,
}

impl GameSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GameInProgress` with the running session's id
    /// if the slot is taken.
    pub fn try_start(&self, session_id: Uuid) -> Result<SlotLease, DomainError> {
        let mut current = self.lock();
        if let Some(active) = *current {
            return Err(DomainError::GameInProgress(active));
        }
        *current = Some(session_id);
        debug!(%session_id, "game slot claimed");
        Ok(SlotLease {
            slot: self.clone(),
            session_id,
            released: false,
        })
    }

    /// The session holding the slot, if any.
    #[must_use]
    pub fn current(&self) -> Option<Uuid> {
        *self.lock()
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.current().is_none()
    }

    // The slot is a plain Option, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Option<Uuid>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, session_id: Uuid) {
        let mut current = self.lock();
        if *current == Some(session_id) {
            *current = None;
            debug!(%session_id, "game slot released");
        }
    }
}

/// Proof of holding the game slot.
#[derive(Debug)]
pub struct SlotLease {
    slot: GameSlot,
    session_id: Uuid,
    released: bool,
}

impl SlotLease {
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Frees the slot.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.slot.release(self.session_id);
        }
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        self.release();
    }
}
