//! Deterministic random number generation.
//!
//! Every random draw in the engine flows through one per-match [`MatchRng`],
//! advanced monotonically. No wall-clock time, thread identifiers, or
//! external I/O may influence outcomes — that is the precondition for
//! transcript replay to be exact.
//!
//! Uses ChaCha8 for speed while maintaining high-quality randomness, with
//! O(1) state capture via the word position counter.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded per-match RNG.
#[derive(Clone, Debug)]
pub struct MatchRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl MatchRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random integer in the given half-open range.
    pub fn gen_range(&mut self, range: std::ops::Range<i32>) -> i32 {
        self.inner.gen_range(range)
    }

    /// Generate a random usize in the given half-open range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Roll an inclusive range, e.g. a card's power range.
    pub fn roll_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        if lo >= hi {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> MatchRngState {
        MatchRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &MatchRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state.
///
/// Uses the ChaCha8 word position for O(1) capture regardless of how many
/// numbers have been generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRngState {
    /// Original seed.
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter).
    pub word_pos: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = MatchRng::new(42);
        let mut rng2 = MatchRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range(0..1000), rng2.gen_range(0..1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = MatchRng::new(1);
        let mut rng2 = MatchRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.gen_range(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.gen_range(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_roll_inclusive_bounds() {
        let mut rng = MatchRng::new(7);
        for _ in 0..100 {
            let roll = rng.roll_inclusive(4, 8);
            assert!((4..=8).contains(&roll));
        }
        // Degenerate range
        assert_eq!(rng.roll_inclusive(5, 5), 5);
        assert_eq!(rng.roll_inclusive(9, 3), 9);
    }

    #[test]
    fn test_shuffle_preserves_elements() {
        let mut rng = MatchRng::new(42);
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        rng.shuffle(&mut data);

        data.sort_unstable();
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_state_capture_restore() {
        let mut rng = MatchRng::new(42);
        for _ in 0..100 {
            rng.gen_range(0..1000);
        }

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.gen_range(0..1000)).collect();

        let mut restored = MatchRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.gen_range(0..1000)).collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_state_serde() {
        let state = MatchRngState {
            seed: 42,
            word_pos: 12345,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: MatchRngState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }
}
