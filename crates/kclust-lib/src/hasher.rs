//! Deterministic whole-sequence hasher using ahash.
//!
//! This uses AHasher with explicit seeds to provide deterministic hashing.
//! We can swap the hash implementation later without changing callers.

use ahash::RandomState;
use std::hash::{BuildHasher, Hasher};

/// A deterministic hasher with a seeded state.
#[derive(Clone)]
pub struct DeterministicHasher {
    seed: u64,
    state: RandomState,
}

impl DeterministicHasher {
    /// Create a new deterministic hasher with the given seed.
    pub fn new(seed: u64) -> Self {
        let state = RandomState::with_seeds(seed, !seed, seed, !seed);
        Self { seed, state }
    }

    /// Hash a residue slice using the seeded AHasher.
    #[inline]
    pub fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.state.build_hasher();
        hasher.write(bytes);
        hasher.finish()
    }

    /// Get the seed value.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
