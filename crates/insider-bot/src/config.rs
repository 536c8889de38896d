//! Configuration read from the environment at start-up.

use std::path::PathBuf;
use std::time::Duration;

use insider_game::application::config::{
    DEFAULT_GUESS_SECONDS, DEFAULT_REVEAL_SECONDS, DEFAULT_WARNING_SECONDS, GameConfig,
};
use insider_game::domain::word_pool::WordPool;
use tracing::{info, warn};

use crate::error::AppError;

pub const GUESS_SECONDS_VAR: &str = "INSIDER_GUESS_SECONDS";
pub const WARNING_SECONDS_VAR: &str = "INSIDER_WARNING_SECONDS";
pub const REVEAL_SECONDS_VAR: &str = "INSIDER_REVEAL_SECONDS";
pub const WORDS_PATH_VAR: &str = "INSIDER_WORDS_PATH";
pub const CHANNEL_VAR: &str = "INSIDER_CHANNEL";
pub const BOT_NAME_VAR: &str = "INSIDER_BOT_NAME";

const DEFAULT_CHANNEL: &str = "general";
const DEFAULT_BOT_NAME: &str = "spongebot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Game timings.
    pub game: GameConfig,
    /// JSON word file; the built-in list when unset.
    pub words_path: Option<PathBuf>,
    /// Channel the console plays in.
    pub channel: String,
    /// Name players mention the bot by.
    pub bot_name: String,
}

impl BotConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, using defaults for anything it
    /// does not return.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a duration is not a whole number of
    /// seconds, or the warning does not come before the end of the guess
    /// phase.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let guess = seconds(&lookup, GUESS_SECONDS_VAR, DEFAULT_GUESS_SECONDS)?;
        let warning = seconds(&lookup, WARNING_SECONDS_VAR, DEFAULT_WARNING_SECONDS)?;
        let reveal = seconds(&lookup, REVEAL_SECONDS_VAR, DEFAULT_REVEAL_SECONDS)?;
        let game = GameConfig::new(Duration::from_secs(guess), Duration::from_secs(warning))
            .map_err(|e| AppError::Config(e.to_string()))?
            .with_reveal_timeout(Duration::from_secs(reveal));

        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        Ok(Self {
            game,
            words_path: lookup(WORDS_PATH_VAR)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            channel: text(CHANNEL_VAR, DEFAULT_CHANNEL),
            bot_name: text(BOT_NAME_VAR, DEFAULT_BOT_NAME),
        })
    }

    /// Loads the configured word file, or the built-in list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read and
    /// `AppError::Config` if it is not a valid word file.
    pub async fn load_words(&self) -> Result<WordPool, AppError> {
        let pool = match &self.words_path {
            None => WordPool::builtin(),
            Some(path) => {
                let json = tokio::fs::read_to_string(path).await?;
                WordPool::from_json(&json)
                    .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?
            }
        };
        if pool.is_empty() {
            warn!("word pool is empty, every game request will be refused");
        }
        info!(words = pool.remaining(), "word pool loaded");
        Ok(pool)
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::Config(format!("{key} must be a whole number of seconds: {e}"))
        }),
    }
}
