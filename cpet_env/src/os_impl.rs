//! Production entropy source backed by the operating system.

use crate::EntropySource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeds every stream from OS entropy.
///
/// Used when no seed was configured. Two calls with the same worker index
/// return unrelated streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl OsEntropy {
    /// Creates an OS-backed source.
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropy {
    fn region_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::from_entropy()
    }

    fn worker_rng(&self, _worker: u64) -> ChaCha8Rng {
        ChaCha8Rng::from_entropy()
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}
