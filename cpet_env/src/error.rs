//! Error types for CPET.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a topology run.
///
/// Numerical degeneracies (a sample landing on a charge) are not reported
/// here; they surface as non-finite values in the samples.
#[derive(Debug, Error)]
pub enum CpetError {
    /// Inputs loaded but cannot describe a runnable system
    /// (no region, no charges, zero samples, singular basis).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A data source could not be read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An expected element was absent from a lookup
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// A record was present but malformed
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl CpetError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Creates a parse error for a 1-based line number.
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Wraps an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the CPET crates.
pub type Result<T> = std::result::Result<T, CpetError>;
