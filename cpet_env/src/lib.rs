//! CPET Environment Layer
//!
//! Everything the topology sampler needs from the outside world that is not
//! physics:
//! - **Errors**: a single tagged error type shared by every crate
//! - **Randomness**: entropy sources that hand out explicitly owned generators
//!
//! Workers never reach for a global or thread-local RNG. The coordinator asks
//! an [`EntropySource`] for one generator per worker and moves it into the
//! worker, so a seeded run is reproducible for a fixed worker count.
//!
//! # Example
//!
//! ```ignore
//! use cpet_env::{EntropySource, SeededEntropy};
//! use rand::Rng;
//!
//! let entropy = SeededEntropy::new(42);
//! let mut rng = entropy.worker_rng(0);
//! let budget: f64 = rng.gen_range(0.0..1.0);
//! ```

mod context;
mod error;
mod os_impl;
mod seeded;

pub use context::EntropySource;
pub use error::{CpetError, Result};
pub use os_impl::OsEntropy;
pub use seeded::SeededEntropy;
