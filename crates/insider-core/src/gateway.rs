//! Messaging gateway abstraction.
//!
//! The game engine talks to people only through these traits. A gateway
//! delivers text to channels and users and runs multi-turn dialogs; the
//! chat platform behind it is not the engine's concern.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Recipient of a message: a group channel or a single user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// A group channel, by name or platform id.
    Channel(String),
    /// A single user, reached privately.
    User(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel) => write!(f, "#{channel}"),
            Self::User(user) => write!(f, "@{user}"),
        }
    }
}

/// A message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel the message was posted in.
    pub channel: String,
    /// Author of the message.
    pub user: String,
    /// Message text with the bot mention already removed.
    pub text: String,
}

/// How a dialog ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogStatus {
    /// The dialog ran to its natural end.
    Completed,
    /// The dialog was stopped before its natural end.
    Stopped,
}

/// A resumable multi-turn dialog with one recipient.
///
/// Prompts within one conversation are strictly sequential: callers await
/// each `ask` before issuing the next.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// The recipient of this conversation.
    fn recipient(&self) -> &Address;

    /// Sends a message.
    async fn say(&self, text: &str) -> Result<(), GatewayError>;

    /// Sends a prompt and waits for the recipient's reply.
    ///
    /// Returns `GatewayError::ConversationStopped` if the conversation is
    /// stopped before a reply arrives.
    async fn ask(&self, text: &str) -> Result<String, GatewayError>;

    /// Ends the conversation. Pending and later calls fail.
    async fn stop(&self);
}

/// The chat platform as seen by the game engine.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Opens a conversation in a group channel.
    async fn start_conversation(
        &self,
        channel: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError>;

    /// Opens a private conversation with one user.
    async fn start_private_conversation(
        &self,
        user: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError>;

    /// Replies to an inbound message where it was posted.
    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), GatewayError>;
}
