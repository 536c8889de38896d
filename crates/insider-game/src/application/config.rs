//! Game timing.

use std::time::Duration;

use insider_core::error::DomainError;

/// Default guess-phase length.
pub const DEFAULT_GUESS_SECONDS: u64 = 300;
/// Default delay before the "time is running out" notice.
pub const DEFAULT_WARNING_SECONDS: u64 = 240;
/// Default wait for an answer to the reveal prompt.
pub const DEFAULT_REVEAL_SECONDS: u64 = 60;

/// Timings for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// How long the group has to guess the word.
    pub guess_duration: Duration,
    /// When the warning notice goes out, counted from the start.
    pub warning_after: Duration,
    /// How long the reveal prompt waits after a vote timeout.
    pub reveal_timeout: Duration,
}

impl GameConfig {
    /// Builds a config, rejecting a warning that would fire at or after the
    /// end of the guess phase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `guess_duration` is zero or
    /// `warning_after` is not shorter than it.
    pub fn new(guess_duration: Duration, warning_after: Duration) -> Result<Self, DomainError> {
        if guess_duration.is_zero() {
            return Err(DomainError::Validation(
                "guess duration must be positive".to_owned(),
            ));
        }
        if warning_after >= guess_duration {
            return Err(DomainError::Validation(format!(
                "warning ({}s) must come before the end of the guess phase ({}s)",
                warning_after.as_secs(),
                guess_duration.as_secs()
            )));
        }
        Ok(Self {
            guess_duration,
            warning_after,
            reveal_timeout: Duration::from_secs(DEFAULT_REVEAL_SECONDS),
        })
    }

    #[must_use]
    pub fn with_reveal_timeout(mut self, reveal_timeout: Duration) -> Self {
        self.reveal_timeout = reveal_timeout;
        self
    }

    /// Time left in the guess phase when the warning goes out.
    #[must_use]
    pub fn warning_remaining(&self) -> Duration {
        self.guess_duration.saturating_sub(self.warning_after)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            guess_duration: Duration::from_secs(DEFAULT_GUESS_SECONDS),
            warning_after: Duration::from_secs(DEFAULT_WARNING_SECONDS),
            reveal_timeout: Duration::from_secs(DEFAULT_REVEAL_SECONDS),
        }
    }
}
