//! Inbound chat commands.
//!
//! A mention containing "play insider" starts a game with everyone mentioned
//! after it. Any other mention is echoed back in alternating case.

use insider_core::error::DomainError;
use insider_core::gateway::InboundMessage;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::actor::GameHandle;
use super::engine::InsiderEngine;
use crate::domain::commands::StartGame;
use crate::domain::text;

/// Phrase that starts a game, matched case-insensitively.
pub const TRIGGER: &str = "play insider";

/// What a mention of the bot asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionCommand {
    PlayInsider { roster: Vec<String> },
    Chatter(String),
}

/// Reads a mention of `bot_name`. A leading mention of the bot itself is
/// dropped from the text.
#[must_use]
pub fn parse_mention(text: &str, bot_name: &str) -> MentionCommand {
    let text = strip_bot_mention(text.trim(), bot_name);
    if text.to_lowercase().contains(TRIGGER) {
        MentionCommand::PlayInsider {
            roster: parse_roster(text, bot_name),
        }
    } else {
        MentionCommand::Chatter(text.to_owned())
    }
}

/// Collects mentioned users in order of first appearance. Accepts the
/// platform form `<@U123>` (optionally `<@U123|name>`) and bare `@name`.
/// A name ends at the first character that cannot be part of a user id.
/// The bot is never part of the roster.
#[must_use]
pub fn parse_roster(text: &str, bot_name: &str) -> Vec<String> {
    let mut roster: Vec<String> = Vec::new();
    for segment in text.split('@').skip(1) {
        let id = segment
            .split(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .next()
            .unwrap_or_default();
        if id.is_empty() || id == bot_name || roster.iter().any(|known| known == id) {
            continue;
        }
        roster.push(id.to_owned());
    }
    roster
}

fn strip_bot_mention<'a>(text: &'a str, bot_name: &str) -> &'a str {
    let platform = format!("<@{bot_name}>");
    let bare = format!("@{bot_name}");
    text.strip_prefix(platform.as_str())
        .or_else(|| text.strip_prefix(bare.as_str()))
        .map_or(text, str::trim_start)
}

/// Chat-facing front of the engine.
#[derive(Clone)]
pub struct InsiderBot {
    engine: InsiderEngine,
    bot_name: String,
}

impl InsiderBot {
    #[must_use]
    pub fn new(engine: InsiderEngine, bot_name: impl Into<String>) -> Self {
        Self {
            engine,
            bot_name: bot_name.into(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &InsiderEngine {
        &self.engine
    }

    #[must_use]
    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Handles a message that mentions the bot. Returns the handle of the
    /// game it started, if any.
    ///
    /// Requests the engine turns down (a game already running, too few
    /// players, no words left) are answered in the channel and are not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Gateway` if a reply cannot be delivered, or any
    /// other error that stopped a game from starting.
    #[instrument(skip(self, message), fields(channel = %message.channel, user = %message.user))]
    pub async fn handle_mention(
        &self,
        message: &InboundMessage,
    ) -> Result<Option<GameHandle>, DomainError> {
        let roster = match parse_mention(&message.text, &self.bot_name) {
            MentionCommand::Chatter(chatter) => {
                self.engine
                    .gateway()
                    .reply(message, &text::alternate_case(&chatter))
                    .await?;
                return Ok(None);
            }
            MentionCommand::PlayInsider { roster } => roster,
        };

        let command = StartGame {
            correlation_id: Uuid::new_v4(),
            channel: message.channel.clone(),
            requested_by: message.user.clone(),
            roster,
        };
        match self.engine.start_game(&command).await {
            Ok(handle) => {
                info!(session_id = %handle.session_id(), "Insider game started");
                Ok(Some(handle))
            }
            Err(error) => match rejection(&error) {
                Some(reply) => {
                    warn!(%error, "game request rejected");
                    self.engine.gateway().reply(message, reply).await?;
                    Ok(None)
                }
                None => Err(error),
            },
        }
    }

    /// Greets a channel the bot was just added to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Gateway` if the channel cannot be reached.
    pub async fn handle_channel_join(&self, channel: &str) -> Result<(), DomainError> {
        let group = self.engine.gateway().start_conversation(channel).await?;
        group.say(text::CHANNEL_GREETING).await?;
        Ok(())
    }
}

fn rejection(error: &DomainError) -> Option<&'static str> {
    match error {
        DomainError::GameInProgress(_) => Some(text::GAME_IN_PROGRESS),
        DomainError::InsufficientPlayers { .. } => Some(text::NEED_MORE_PLAYERS),
        DomainError::EmptyPool => Some(text::NO_WORDS_LEFT),
        _ => None,
    }
}
