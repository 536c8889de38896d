//! Domain events for the Insider game context.

use insider_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::RoleAssignment;
use super::votes::Tally;

/// Why a session ended without an accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// The Master answered QUIT.
    MasterQuit,
    /// No private dialog could be opened with the Master.
    MasterUnreachable,
    /// The secret word could not be delivered to the Insider.
    InsiderUnreachable,
    /// The group channel stopped accepting messages.
    GatewayFailure,
}

/// Emitted when roles are handed out and the guessing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStarted {
    /// The session identifier.
    pub session_id: Uuid,
    /// The channel the game is played in.
    pub channel: String,
    /// Who plays which role.
    pub roles: RoleAssignment,
    /// The secret word.
    pub word: String,
}

/// Emitted when the Master reports that the word was guessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordGuessed {
    /// The session identifier.
    pub session_id: Uuid,
    /// Seconds the guessing took.
    pub elapsed_seconds: u64,
    /// Seconds granted for the accusation vote.
    pub accusation_seconds: u64,
}

/// Emitted when a session is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAborted {
    /// The session identifier.
    pub session_id: Uuid,
    /// Why the session ended.
    pub reason: AbortReason,
}

/// Emitted when nobody guessed the word in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessTimeExpired {
    /// The session identifier.
    pub session_id: Uuid,
    /// The word nobody guessed.
    pub word: String,
    /// The Insider, revealed with the word.
    pub insider: String,
}

/// Emitted when every vote was counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotesTabulated {
    /// The session identifier.
    pub session_id: Uuid,
    /// The counted votes.
    pub tally: Tally,
}

/// Emitted when the vote ran out of time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteTimeExpired {
    /// The session identifier.
    pub session_id: Uuid,
}

/// Event type identifier for [`GameStarted`].
pub const GAME_STARTED_EVENT_TYPE: &str = "insider.game_started";

/// Event type identifier for [`WordGuessed`].
pub const WORD_GUESSED_EVENT_TYPE: &str = "insider.word_guessed";

/// Event type identifier for [`GameAborted`].
pub const GAME_ABORTED_EVENT_TYPE: &str = "insider.game_aborted";

/// Event type identifier for [`GuessTimeExpired`].
pub const GUESS_TIME_EXPIRED_EVENT_TYPE: &str = "insider.guess_time_expired";

/// Event type identifier for [`VotesTabulated`].
pub const VOTES_TABULATED_EVENT_TYPE: &str = "insider.votes_tabulated";

/// Event type identifier for [`VoteTimeExpired`].
pub const VOTE_TIME_EXPIRED_EVENT_TYPE: &str = "insider.vote_time_expired";

/// Event payload variants for the Insider game context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InsiderEventKind {
    /// The guessing phase has started.
    GameStarted(GameStarted),
    /// The word was guessed; the accusation phase starts.
    WordGuessed(WordGuessed),
    /// The session was cancelled.
    GameAborted(GameAborted),
    /// The guessing phase ran out of time.
    GuessTimeExpired(GuessTimeExpired),
    /// All votes were counted.
    VotesTabulated(VotesTabulated),
    /// The accusation phase ran out of time.
    VoteTimeExpired(VoteTimeExpired),
}

impl InsiderEventKind {
    /// The event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameStarted(_) => GAME_STARTED_EVENT_TYPE,
            Self::WordGuessed(_) => WORD_GUESSED_EVENT_TYPE,
            Self::GameAborted(_) => GAME_ABORTED_EVENT_TYPE,
            Self::GuessTimeExpired(_) => GUESS_TIME_EXPIRED_EVENT_TYPE,
            Self::VotesTabulated(_) => VOTES_TABULATED_EVENT_TYPE,
            Self::VoteTimeExpired(_) => VOTE_TIME_EXPIRED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Insider game context.
#[derive(Debug, Clone)]
pub struct InsiderEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: InsiderEventKind,
}

impl DomainEvent for InsiderEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("InsiderEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
