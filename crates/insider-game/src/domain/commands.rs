//! Commands for the Insider game context.

use insider_core::command::Command;
use uuid::Uuid;

/// Command to start an Insider game in a channel.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The channel the game is played in.
    pub channel: String,
    /// Who asked for the game.
    pub requested_by: String,
    /// The participants, in mention order.
    pub roster: Vec<String>,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "insider.start_game"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn origin(&self) -> &str {
        &self.channel
    }
}
