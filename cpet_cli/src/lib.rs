//! CPET command-line runner.
//!
//! Wires the options and structure loaders to the topology sampler and
//! writes the results:
//! - **Samples**: one `distance,curvature` line per trial
//! - **Summary**: run metadata and aggregate statistics as JSON
//!
//! # Usage
//!
//! ```text
//! cpet -p protein.pqr -o options -t 8 --out topology.csv --json
//! ```

mod exporter;

pub use exporter::{write_samples, write_samples_to_file, TopologyExport};
