//! The Insider engine: validates a start request, claims the slot and hands
//! the started session to its actor.

use std::sync::{Arc, Mutex};

use insider_core::clock::Clock;
use insider_core::command::Command;
use insider_core::error::DomainError;
use insider_core::gateway::MessagingGateway;
use insider_core::rng::DeterministicRng;
use tracing::{info, instrument};
use uuid::Uuid;

use super::actor::{self, GameHandle, SessionContext};
use super::config::GameConfig;
use super::slot::GameSlot;
use crate::domain::aggregates::GameSession;
use crate::domain::commands::StartGame;
use crate::domain::roles::{MIN_PLAYERS, assign_roles};
use crate::domain::word_pool::WordPool;

/// Runs Insider games, one at a time.
#[derive(Clone)]
pub struct InsiderEngine {
    context: SessionContext,
    slot: GameSlot,
    words: Arc<Mutex<WordPool>>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl InsiderEngine {
    #[must_use]
    pub fn new(
        config: GameConfig,
        words: WordPool,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            context: SessionContext {
                config,
                clock,
                gateway,
            },
            slot: GameSlot::new(),
            words: Arc::new(Mutex::new(words)),
            rng,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.context.config
    }

    #[must_use]
    pub fn slot(&self) -> &GameSlot {
        &self.slot
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn MessagingGateway> {
        &self.context.gateway
    }

    /// Words left in the pool.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the pool mutex is poisoned.
    pub fn words_remaining(&self) -> Result<usize, DomainError> {
        let words = self
            .words
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("word pool mutex poisoned: {e}")))?;
        Ok(words.remaining())
    }

    /// Starts a game: checks the roster, claims the slot, assigns roles,
    /// draws the word and launches the session.
    ///
    /// The roster is checked before the slot is claimed, so a short roster
    /// never blocks the next request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InsufficientPlayers`, `GameInProgress`,
    /// `EmptyPool`, or the `Gateway` error that prevented the game from
    /// opening. The slot is free again after every error except
    /// `GameInProgress`.
    #[instrument(skip(self, command), fields(channel = %command.channel, requested_by = %command.requested_by))]
    pub async fn start_game(&self, command: &StartGame) -> Result<GameHandle, DomainError> {
        info!(
            correlation_id = %command.correlation_id(),
            command_type = command.command_type(),
            roster = command.roster.len(),
            "handling start_game command"
        );
        if command.roster.len() < MIN_PLAYERS {
            return Err(DomainError::InsufficientPlayers {
                required: MIN_PLAYERS,
                actual: command.roster.len(),
            });
        }

        let session_id = Uuid::new_v4();
        let lease = self.slot.try_start(session_id)?;

        // Lock the RNG and pool only for the synchronous draw, never across an await.
        let (roles, word) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
            let mut words = self.words.lock().map_err(|e| {
                DomainError::Infrastructure(format!("word pool mutex poisoned: {e}"))
            })?;
            let roles = assign_roles(&command.roster, &mut *rng)?;
            let word = words.draw(&mut *rng)?;
            info!(words_remaining = words.remaining(), "secret word drawn");
            (roles, word)
        };

        let mut session = GameSession::new(session_id, command.origin());
        session.start(
            roles,
            word,
            command.correlation_id(),
            self.context.clock.as_ref(),
        )?;

        actor::launch(session, lease, command.correlation_id(), self.context.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use insider_core::gateway::Address;
    use insider_test_support::{FixedClock, MockRng, ScriptedGateway};

    fn engine(words: &[&str], gateway: &ScriptedGateway) -> InsiderEngine {
        InsiderEngine::new(
            GameConfig::default(),
            WordPool::new(words.iter().copied()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
            Arc::new(Mutex::new(MockRng)),
            Arc::new(gateway.clone()),
        )
    }

    fn start(roster: &[&str]) -> StartGame {
        StartGame {
            correlation_id: Uuid::new_v4(),
            channel: "general".to_owned(),
            requested_by: "P1".to_owned(),
            roster: roster.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[tokio::test]
    async fn test_start_game_with_two_players_leaves_slot_free() {
        let gateway = ScriptedGateway::new();
        let engine = engine(&["anchor"], &gateway);

        let result = engine.start_game(&start(&["P1", "P2"])).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientPlayers { required: 3, actual: 2 })
        ));
        assert!(engine.slot().is_free());
        assert_eq!(engine.words_remaining().unwrap(), 1);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_start_game_with_empty_pool_notifies_nobody() {
        let gateway = ScriptedGateway::new();
        let engine = engine(&[], &gateway);

        let result = engine.start_game(&start(&["P1", "P2", "P3"])).await;

        assert!(matches!(result, Err(DomainError::EmptyPool)));
        assert!(engine.slot().is_free());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_start_game_claims_slot_and_draws_word() {
        let gateway = ScriptedGateway::new();
        let engine = engine(&["anchor", "kettle"], &gateway);

        let handle = engine.start_game(&start(&["P1", "P2", "P3"])).await.unwrap();

        assert_eq!(engine.slot().current(), Some(handle.session_id()));
        assert_eq!(engine.words_remaining().unwrap(), 1);
        // MockRng always picks the first candidate.
        assert_eq!(
            gateway.messages_to(&Address::User("P2".to_owned())),
            vec!["Hello! You are the Insider for this game. The word is: anchor"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_master_aborts_and_frees_slot() {
        let gateway = ScriptedGateway::new();
        gateway.make_unreachable(Address::User("P1".to_owned()));
        let engine = engine(&["anchor"], &gateway);

        let result = engine.start_game(&start(&["P1", "P2", "P3"])).await;

        assert!(matches!(result, Err(DomainError::Gateway(_))));
        assert!(engine.slot().is_free());
        assert_eq!(
            gateway
                .messages_to(&Address::Channel("general".to_owned()))
                .last()
                .map(String::as_str),
            Some("This is embarrassing, but something has gone wrong!")
        );
    }
}
