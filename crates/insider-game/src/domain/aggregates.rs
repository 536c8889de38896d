//! The game session aggregate.
//!
//! Every transition checks the current phase and records one event. A
//! transition asked for in the wrong phase fails with
//! `DomainError::Validation` and changes nothing, so when a timer and the
//! Master race for the same phase only the first caller wins.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use insider_core::aggregate::AggregateRoot;
use insider_core::clock::Clock;
use insider_core::error::DomainError;
use insider_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    AbortReason, GameAborted, GameStarted, GuessTimeExpired, InsiderEvent, InsiderEventKind,
    VoteTimeExpired, VotesTabulated, WordGuessed,
};
use super::roles::RoleAssignment;
use super::votes::{Tally, tabulate};

/// Shortest accusation phase granted, even for an instant guess.
pub const MIN_ACCUSATION_SECONDS: u64 = 1;

/// Session phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Not started yet; no roles or word.
    Created,
    /// The group is guessing the word.
    GuessPhase,
    /// The word was guessed; everyone votes on the Insider.
    AccusationPhase,
    /// Ended by a timeout or a counted vote.
    Resolved,
    /// Cancelled before an accusation could resolve it.
    Aborted,
}

impl GamePhase {
    /// `Resolved` and `Aborted` accept no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Aborted)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::GuessPhase => "GuessPhase",
            Self::AccusationPhase => "AccusationPhase",
            Self::Resolved => "Resolved",
            Self::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// Nobody guessed the word in time.
    GuessTimeExpired,
    /// The session was cancelled.
    Aborted(AbortReason),
    /// Every vote came in and was counted.
    Voted(Tally),
    /// The vote ran out of time.
    VoteTimeExpired,
}

/// Result of the Master reporting a guessed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessResult {
    /// Whole seconds the guessing took.
    pub elapsed_seconds: u64,
    /// Time granted to find the Insider.
    pub accusation_budget: Duration,
}

/// The aggregate root for one Insider game.
#[derive(Debug)]
pub struct GameSession {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) phase: GamePhase,
    channel: String,
    roles: Option<RoleAssignment>,
    word: Option<String>,
    started_at: Option<DateTime<Utc>>,
    accusation_budget: Option<Duration>,
    outcome: Option<GameOutcome>,
    uncommitted_events: Vec<InsiderEvent>,
}

impl GameSession {
    /// Creates a session for `channel` in the `Created` phase.
    #[must_use]
    pub fn new(id: Uuid, channel: impl Into<String>) -> Self {
        Self {
            id,
            version: 0,
            phase: GamePhase::Created,
            channel: channel.into(),
            roles: None,
            word: None,
            started_at: None,
            accusation_budget: None,
            outcome: None,
            uncommitted_events: Vec::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    #[must_use]
    pub fn roles(&self) -> Option<&RoleAssignment> {
        self.roles.as_ref()
    }

    #[must_use]
    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    #[must_use]
    pub fn accusation_budget(&self) -> Option<Duration> {
        self.accusation_budget
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Hands out roles and the word, producing a `GameStarted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if not in `Created` phase.
    pub fn start(
        &mut self,
        roles: RoleAssignment,
        word: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(&[GamePhase::Created])?;

        self.record(
            InsiderEventKind::GameStarted(GameStarted {
                session_id: self.id,
                channel: self.channel.clone(),
                roles,
                word,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// The Master reported the word guessed, producing a `WordGuessed`
    /// event. The time the guessing took becomes the accusation budget.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if not in `GuessPhase`.
    pub fn complete_guess(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<GuessResult, DomainError> {
        self.require_phase(&[GamePhase::GuessPhase])?;

        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |started| clock.elapsed_since(started));
        let elapsed_seconds = elapsed.as_secs();
        let accusation_seconds = elapsed_seconds.max(MIN_ACCUSATION_SECONDS);

        self.record(
            InsiderEventKind::WordGuessed(WordGuessed {
                session_id: self.id,
                elapsed_seconds,
                accusation_seconds,
            }),
            correlation_id,
            clock,
        );
        Ok(GuessResult {
            elapsed_seconds,
            accusation_budget: Duration::from_secs(accusation_seconds),
        })
    }

    /// Cancels a running session, producing a `GameAborted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless in `GuessPhase` or
    /// `AccusationPhase`.
    pub fn abort(
        &mut self,
        reason: AbortReason,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(&[GamePhase::GuessPhase, GamePhase::AccusationPhase])?;

        self.record(
            InsiderEventKind::GameAborted(GameAborted {
                session_id: self.id,
                reason,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// The guess timer fired, producing a `GuessTimeExpired` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if not in `GuessPhase`.
    pub fn expire_guess_time(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(&[GamePhase::GuessPhase])?;

        let word = self.word.clone().unwrap_or_default();
        let insider = self
            .roles
            .as_ref()
            .map(|roles| roles.insider.clone())
            .unwrap_or_default();
        self.record(
            InsiderEventKind::GuessTimeExpired(GuessTimeExpired {
                session_id: self.id,
                word,
                insider,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Counts the collected votes, producing a `VotesTabulated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if not in `AccusationPhase`.
    pub fn record_votes(
        &mut self,
        votes: &[String],
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Tally, DomainError> {
        self.require_phase(&[GamePhase::AccusationPhase])?;

        let tally = tabulate(votes);
        self.record(
            InsiderEventKind::VotesTabulated(VotesTabulated {
                session_id: self.id,
                tally: tally.clone(),
            }),
            correlation_id,
            clock,
        );
        Ok(tally)
    }

    /// The vote timer fired, producing a `VoteTimeExpired` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if not in `AccusationPhase`.
    pub fn expire_vote_time(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(&[GamePhase::AccusationPhase])?;

        self.record(
            InsiderEventKind::VoteTimeExpired(VoteTimeExpired {
                session_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    fn require_phase(&self, allowed: &[GamePhase]) -> Result<(), DomainError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        let names: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        Err(DomainError::Validation(format!(
            "game session must be in {} phase, was {}",
            names.join(" or "),
            self.phase
        )))
    }

    fn record(&mut self, kind: InsiderEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = InsiderEvent {
            metadata: EventMetadata::new(
                kind.event_type(),
                self.id,
                self.version + 1,
                correlation_id,
                clock.now(),
            ),
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }
}

impl AggregateRoot for GameSession {
    type Event = InsiderEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            InsiderEventKind::GameStarted(payload) => {
                self.phase = GamePhase::GuessPhase;
                self.channel.clone_from(&payload.channel);
                self.roles = Some(payload.roles.clone());
                self.word = Some(payload.word.clone());
                self.started_at = Some(event.metadata.occurred_at);
            }
            InsiderEventKind::WordGuessed(payload) => {
                self.phase = GamePhase::AccusationPhase;
                self.accusation_budget = Some(Duration::from_secs(payload.accusation_seconds));
            }
            InsiderEventKind::GameAborted(payload) => {
                self.phase = GamePhase::Aborted;
                self.outcome = Some(GameOutcome::Aborted(payload.reason));
            }
            InsiderEventKind::GuessTimeExpired(_) => {
                self.phase = GamePhase::Resolved;
                self.outcome = Some(GameOutcome::GuessTimeExpired);
            }
            InsiderEventKind::VotesTabulated(payload) => {
                self.phase = GamePhase::Resolved;
                self.outcome = Some(GameOutcome::Voted(payload.tally.clone()));
            }
            InsiderEventKind::VoteTimeExpired(_) => {
                self.phase = GamePhase::Resolved;
                self.outcome = Some(GameOutcome::VoteTimeExpired);
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insider_core::event::DomainEvent;
    use insider_test_support::FixedClock;

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn clock_after(seconds: i64) -> FixedClock {
        FixedClock(fixed_clock().0 + chrono::Duration::seconds(seconds))
    }

    fn roles() -> RoleAssignment {
        RoleAssignment {
            master: "M".to_owned(),
            insider: "I".to_owned(),
            players: vec!["A".to_owned(), "B".to_owned()],
        }
    }

    fn started_session() -> GameSession {
        let mut session = GameSession::new(Uuid::new_v4(), "general");
        session
            .start(roles(), "anchor".to_owned(), Uuid::new_v4(), &fixed_clock())
            .unwrap();
        session
    }

    fn accusing_session() -> GameSession {
        let mut session = started_session();
        session
            .complete_guess(Uuid::new_v4(), &clock_after(42))
            .unwrap();
        session
    }

    fn assert_validation(result: Result<impl fmt::Debug, DomainError>) {
        match result {
            Err(DomainError::Validation(_)) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_start_in_created_phase_produces_game_started_event() {
        let session_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let mut session = GameSession::new(session_id, "general");

        let result = session.start(roles(), "anchor".to_owned(), correlation_id, &fixed_clock());

        assert!(result.is_ok());
        assert_eq!(session.phase(), GamePhase::GuessPhase);
        assert_eq!(session.word(), Some("anchor"));
        assert_eq!(session.roles().unwrap().master, "M");

        let events = session.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "insider.game_started");
        let meta = events[0].metadata();
        assert_eq!(meta.aggregate_id, session_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
    }

    #[test]
    fn test_start_twice_returns_validation_error() {
        let mut session = started_session();

        let result = session.start(roles(), "kettle".to_owned(), Uuid::new_v4(), &fixed_clock());

        assert_validation(result);
        assert_eq!(session.word(), Some("anchor"));
    }

    #[test]
    fn test_complete_guess_uses_elapsed_time_as_budget() {
        let mut session = started_session();

        let result = session
            .complete_guess(Uuid::new_v4(), &clock_after(95))
            .unwrap();

        assert_eq!(result.elapsed_seconds, 95);
        assert_eq!(result.accusation_budget, Duration::from_secs(95));
        assert_eq!(session.phase(), GamePhase::AccusationPhase);
        assert_eq!(session.accusation_budget(), Some(Duration::from_secs(95)));
    }

    #[test]
    fn test_complete_guess_instantly_grants_minimum_budget() {
        let mut session = started_session();

        let result = session
            .complete_guess(Uuid::new_v4(), &fixed_clock())
            .unwrap();

        assert_eq!(result.elapsed_seconds, 0);
        assert_eq!(
            result.accusation_budget,
            Duration::from_secs(MIN_ACCUSATION_SECONDS)
        );
    }

    #[test]
    fn test_guess_timeout_after_stop_is_rejected() {
        let mut session = started_session();
        session
            .complete_guess(Uuid::new_v4(), &clock_after(300))
            .unwrap();

        let result = session.expire_guess_time(Uuid::new_v4(), &clock_after(300));

        assert_validation(result);
        assert_eq!(session.phase(), GamePhase::AccusationPhase);
        assert_eq!(session.uncommitted_events().len(), 2);
    }

    #[test]
    fn test_stop_after_guess_timeout_is_rejected() {
        let mut session = started_session();
        session
            .expire_guess_time(Uuid::new_v4(), &clock_after(300))
            .unwrap();

        let result = session.complete_guess(Uuid::new_v4(), &clock_after(300));

        assert_validation(result);
        assert_eq!(session.phase(), GamePhase::Resolved);
        assert_eq!(session.outcome(), Some(&GameOutcome::GuessTimeExpired));
    }

    #[test]
    fn test_expire_guess_time_records_word_and_insider() {
        let mut session = started_session();

        session
            .expire_guess_time(Uuid::new_v4(), &clock_after(300))
            .unwrap();

        match &session.uncommitted_events()[1].kind {
            InsiderEventKind::GuessTimeExpired(payload) => {
                assert_eq!(payload.word, "anchor");
                assert_eq!(payload.insider, "I");
            }
            other => panic!("expected GuessTimeExpired, got {other:?}"),
        }
    }

    #[test]
    fn test_abort_from_guess_phase_records_reason() {
        let mut session = started_session();

        session
            .abort(AbortReason::MasterQuit, Uuid::new_v4(), &fixed_clock())
            .unwrap();

        assert_eq!(session.phase(), GamePhase::Aborted);
        assert!(session.phase().is_terminal());
        assert_eq!(
            session.outcome(),
            Some(&GameOutcome::Aborted(AbortReason::MasterQuit))
        );
    }

    #[test]
    fn test_abort_from_accusation_phase_is_allowed() {
        let mut session = accusing_session();

        let result = session.abort(AbortReason::GatewayFailure, Uuid::new_v4(), &fixed_clock());

        assert!(result.is_ok());
        assert_eq!(session.phase(), GamePhase::Aborted);
    }

    #[test]
    fn test_abort_before_start_is_rejected() {
        let mut session = GameSession::new(Uuid::new_v4(), "general");

        let result = session.abort(AbortReason::MasterQuit, Uuid::new_v4(), &fixed_clock());

        assert_validation(result);
        assert!(session.uncommitted_events().is_empty());
    }

    #[test]
    fn test_record_votes_tabulates_and_resolves() {
        let mut session = accusing_session();
        let votes = vec!["A".to_owned(), "I".to_owned(), "I".to_owned()];

        let tally = session
            .record_votes(&votes, Uuid::new_v4(), &clock_after(60))
            .unwrap();

        assert!(!tally.tied);
        assert!(tally.accused.contains("I"));
        assert_eq!(session.phase(), GamePhase::Resolved);
        assert_eq!(session.outcome(), Some(&GameOutcome::Voted(tally)));
    }

    #[test]
    fn test_votes_after_vote_timeout_are_rejected() {
        let mut session = accusing_session();
        session
            .expire_vote_time(Uuid::new_v4(), &clock_after(84))
            .unwrap();

        let result = session.record_votes(&["A".to_owned()], Uuid::new_v4(), &clock_after(84));

        assert_validation(result);
        assert_eq!(session.outcome(), Some(&GameOutcome::VoteTimeExpired));
    }

    #[test]
    fn test_record_votes_in_guess_phase_is_rejected() {
        let mut session = started_session();

        let result = session.record_votes(&[], Uuid::new_v4(), &fixed_clock());

        assert_validation(result);
    }

    #[test]
    fn test_validation_message_names_allowed_and_actual_phase() {
        let mut session = GameSession::new(Uuid::new_v4(), "general");

        let result = session.expire_vote_time(Uuid::new_v4(), &fixed_clock());

        match result {
            Err(DomainError::Validation(msg)) => assert_eq!(
                msg,
                "game session must be in AccusationPhase phase, was Created"
            ),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_numbers_follow_version() {
        let mut session = accusing_session();
        session
            .record_votes(&[], Uuid::new_v4(), &clock_after(50))
            .unwrap();

        let numbers: Vec<i64> = session
            .uncommitted_events()
            .iter()
            .map(|event| event.metadata().sequence_number)
            .collect();

        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(session.version(), 3);
    }

    #[test]
    fn test_take_uncommitted_events_drains_pending_events() {
        let mut session = started_session();

        let taken = session.take_uncommitted_events();

        assert_eq!(taken.len(), 1);
        assert!(session.uncommitted_events().is_empty());
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_apply_replays_history_into_fresh_session() {
        let mut original = accusing_session();
        let history = original.take_uncommitted_events();
        let mut replayed = GameSession::new(original.id, "other");

        for event in &history {
            replayed.apply(event);
        }

        assert_eq!(replayed.phase(), GamePhase::AccusationPhase);
        assert_eq!(replayed.channel(), "general");
        assert_eq!(replayed.accusation_budget(), Some(Duration::from_secs(42)));
        assert_eq!(replayed.version(), 2);
    }
}
