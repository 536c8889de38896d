//! The pool of secret words.
//!
//! Drawing removes the word for the rest of the process lifetime and nothing
//! restocks the pool, so the number of games a bot can host is bounded by
//! the pool size. Once it is empty every new game is refused with
//! `DomainError::EmptyPool` until the process restarts.

use insider_core::error::DomainError;
use insider_core::rng::DeterministicRng;
use serde::Deserialize;

const BUILTIN_WORDS: &str = include_str!("../../words.json");

/// On-disk word file format: `{ "words": ["...", ...] }`.
#[derive(Debug, Deserialize)]
struct WordFile {
    words: Vec<String>,
}

/// Candidate secret words, drawn without replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Creates a pool from a list of words. Blank entries are dropped and
    /// surrounding whitespace is trimmed.
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_owned())
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    /// Parses a word file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let file: WordFile = serde_json::from_str(json)
            .map_err(|e| DomainError::Validation(format!("invalid word file: {e}")))?;
        Ok(Self::new(file.words))
    }

    /// The word list shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        // The embedded file is checked by `test_builtin_pool_is_not_empty`.
        Self::from_json(BUILTIN_WORDS).unwrap_or_default()
    }

    /// Removes and returns a uniformly random word.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyPool` when no words remain.
    pub fn draw(&mut self, rng: &mut dyn DeterministicRng) -> Result<String, DomainError> {
        let index = rng
            .next_index(self.words.len())
            .ok_or(DomainError::EmptyPool)?;
        Ok(self.words.remove(index))
    }

    /// Number of words left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.words.len()
    }

    /// Whether every word has been drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insider_core::rng::SystemRng;
    use insider_test_support::{MockRng, SequenceRng};

    #[test]
    fn test_draw_removes_the_picked_word() {
        let mut pool = WordPool::new(["anchor", "bicycle", "candle"]);
        let mut rng = SequenceRng::new(vec![1]);

        let word = pool.draw(&mut rng).unwrap();

        assert_eq!(word, "bicycle");
        assert_eq!(pool, WordPool::new(["anchor", "candle"]));
    }

    #[test]
    fn test_n_draws_exhaust_pool_and_next_draw_fails() {
        for size in 1_u64..=6 {
            let words: Vec<String> = (0..size).map(|i| format!("word-{i}")).collect();
            let mut pool = WordPool::new(&words);
            let mut rng = SystemRng::seeded(size);

            let mut drawn: Vec<String> = (0..size).map(|_| pool.draw(&mut rng).unwrap()).collect();

            drawn.sort();
            assert_eq!(drawn, words);
            assert!(pool.is_empty());
            match pool.draw(&mut rng) {
                Err(DomainError::EmptyPool) => {}
                other => panic!("expected EmptyPool, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_pool_draw_returns_empty_pool_error() {
        let mut pool = WordPool::default();

        let result = pool.draw(&mut MockRng);

        assert!(matches!(result, Err(DomainError::EmptyPool)));
    }

    #[test]
    fn test_new_trims_and_drops_blank_words() {
        let pool = WordPool::new(["  lighthouse ", "", "   "]);

        assert_eq!(pool.remaining(), 1);
    }

    #[test]
    fn test_from_json_reads_word_file_format() {
        let pool = WordPool::from_json(r#"{ "words": ["igloo", "kettle"] }"#).unwrap();

        assert_eq!(pool, WordPool::new(["igloo", "kettle"]));
    }

    #[test]
    fn test_from_json_rejects_malformed_file() {
        let result = WordPool::from_json(r#"["igloo"]"#);

        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.starts_with("invalid word file")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_pool_is_not_empty() {
        assert!(WordPool::from_json(BUILTIN_WORDS).is_ok());
        assert!(WordPool::builtin().remaining() >= 50);
    }
}
