//! Insider bot — startup and runtime errors.

use insider_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the console bot.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable or the word file is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The game engine refused or failed an operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Reading stdin, writing stdout or reading the word file failed.
    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}
