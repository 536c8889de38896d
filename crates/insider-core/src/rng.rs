//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests, a seeded or scripted
//! implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Pick a uniformly random index into a collection of `len` items.
    ///
    /// Returns `None` for an empty collection. The result is clamped to
    /// `len - 1` so scripted implementations cannot index out of bounds.
    fn next_index(&mut self, len: usize) -> Option<usize> {
        let last = len.checked_sub(1)?;
        let max = u32::try_from(last).unwrap_or(u32::MAX);
        let picked = usize::try_from(self.next_u32_range(0, max)).unwrap_or(last);
        Some(picked.min(last))
    }
}

/// Production RNG backed by `rand`'s standard generator.
#[derive(Debug, Clone)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Creates a reproducible RNG from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(u32);

    impl DeterministicRng for Always {
        fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_next_index_of_empty_collection_is_none() {
        assert_eq!(Always(0).next_index(0), None);
    }

    #[test]
    fn test_next_index_is_clamped_to_last_position() {
        assert_eq!(Always(42).next_index(3), Some(2));
    }

    #[test]
    fn test_seeded_rng_stays_within_bounds() {
        let mut rng = SystemRng::seeded(7);
        for _ in 0..1_000 {
            let value = rng.next_u32_range(3, 9);
            assert!((3..=9).contains(&value));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut first = SystemRng::seeded(99);
        let mut second = SystemRng::seeded(99);
        let a: Vec<u32> = (0..16).map(|_| first.next_u32_range(0, 100)).collect();
        let b: Vec<u32> = (0..16).map(|_| second.next_u32_range(0, 100)).collect();

        assert_eq!(a, b);
    }
}
