//! Deterministic entropy derived from a single master seed.

use crate::EntropySource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derives every random stream of a run from one 64-bit seed.
///
/// Streams are:
/// - Deterministic: same seed and index always give the same stream
/// - Unique: each worker gets a different stream
/// - Isolated: changing the worker count doesn't alter existing streams
#[derive(Debug, Clone, Copy)]
pub struct SeededEntropy {
    master_seed: u64,
}

impl SeededEntropy {
    /// Creates a seeded source.
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }
}

impl EntropySource for SeededEntropy {
    fn region_rng(&self) -> ChaCha8Rng {
        // Separate salt so the region stream never collides with worker 0
        let region_seed = self.master_seed.wrapping_mul(0x3c6ef372fe94f82b);
        ChaCha8Rng::seed_from_u64(region_seed)
    }

    fn worker_rng(&self, worker: u64) -> ChaCha8Rng {
        let worker_seed = self
            .master_seed
            .wrapping_mul(0x9e3779b97f4a7c15) // Golden ratio prime
            .wrapping_add(worker.wrapping_mul(0x517cc1b727220a95));
        ChaCha8Rng::seed_from_u64(worker_seed)
    }

    fn seed(&self) -> u64 {
        self.master_seed
    }
}
