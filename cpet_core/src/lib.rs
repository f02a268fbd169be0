//! CPET Core - Electric Field Topology Sampling
//!
//! Estimates the topology of the electric field around a charged molecular
//! structure by tracing many short field lines from random points inside a
//! region and recording, for each one:
//! 1. **Distance**: net displacement between start and end of the trace
//! 2. **Curvature**: mean finite-difference curvature at both ends
//!
//! The resulting distribution of (distance, curvature) pairs is the
//! fingerprint used to compare fields between structures.

pub mod charge;
pub mod field;
pub mod options;
pub mod region;
pub mod sample;
pub mod system;

// Re-export key types for convenience
pub use charge::{load_point_charges, PointCharge};
pub use field::{electric_field, COULOMB_CONSTANT, PERMITTIVITY};
pub use options::{Options, SamplingParams};
pub use region::{BoxRegion, Region, SphereRegion, VolumeSpec};
pub use sample::{PathSample, TopologySummary};
pub use system::{System, Trace};
pub use cpet_env::{CpetError, Result};
