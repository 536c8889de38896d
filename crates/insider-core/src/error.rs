//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A game session already holds the game slot.
    #[error("an Insider game is already in progress (session {0})")]
    GameInProgress(Uuid),

    /// The roster is too small to hand out the Master and Insider roles.
    #[error("not enough players: need at least {required}, got {actual}")]
    InsufficientPlayers {
        /// Minimum roster size.
        required: usize,
        /// Roster size that was offered.
        actual: usize,
    },

    /// Every word in the pool has already been played.
    #[error("the word pool is empty")]
    EmptyPool,

    /// A validation error in domain logic, including transitions requested
    /// in the wrong phase.
    #[error("validation error: {0}")]
    Validation(String),

    /// The messaging gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An infrastructure error (poisoned lock, failed task).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

/// Errors reported by a messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// A conversation with the target could not be opened.
    #[error("could not open a dialog with {target}: {reason}")]
    DialogOpen {
        /// The channel or user that could not be reached.
        target: String,
        /// Gateway-specific failure description.
        reason: String,
    },

    /// The conversation was stopped while a call was pending or after it ended.
    #[error("conversation with {0} was stopped")]
    ConversationStopped(String),

    /// A message could not be delivered.
    #[error("message delivery failed: {0}")]
    Delivery(String),
}
