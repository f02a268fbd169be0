//! Entropy source trait for the topology sampler.

use rand_chacha::ChaCha8Rng;

/// Hands out independently owned random generators.
///
/// The sampler needs two kinds of randomness:
/// - one stream for the region's random start points, shared by all workers
///   behind a lock
/// - one private stream per worker for the per-trial step budget
///
/// # Implementations
///
/// - **Reproducible**: `SeededEntropy` - every stream derived from one seed
/// - **Production**: `OsEntropy` - every stream seeded from the OS
pub trait EntropySource: Send + Sync {
    /// Returns the generator backing region start-point draws.
    fn region_rng(&self) -> ChaCha8Rng;

    /// Returns a private generator for the worker with the given index.
    ///
    /// For seeded sources the same index always yields the same stream,
    /// and distinct indices yield distinct streams.
    fn worker_rng(&self, worker: u64) -> ChaCha8Rng;

    /// Returns the master seed (for logging/debugging).
    ///
    /// Unseeded sources return 0.
    fn seed(&self) -> u64;
}
