//! The System aggregate: charges, frame, region and the topology sampler.
//!
//! # Sampling
//!
//! One trial picks a start point in the region, walks along the unit field
//! direction in fixed steps until it leaves the region or exhausts a random
//! step budget, and reports the net displacement plus the mean curvature at
//! both ends.
//!
//! With more than one worker the trials are claimed from a shared atomic
//! countdown, so every one of the N slots runs exactly once. Two locks exist:
//! one around the region's random generator, one around the result vector.
//! Everything else (charges, frame, parameters) is read-only while sampling.

use crate::charge::{load_point_charges, PointCharge};
use crate::field::{advance, curvature, electric_field};
use crate::options::{Options, SamplingParams};
use crate::region::Region;
use crate::sample::PathSample;

use cpet_env::{CpetError, EntropySource, OsEntropy, Result, SeededEntropy};
use nalgebra::{Matrix3, Vector3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{debug, info, warn};

/// Path of a single field-line trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    pub initial_position: Vector3<f64>,
    pub final_position: Vector3<f64>,

    /// Integration steps actually taken
    pub steps: usize,

    /// Step budget drawn for this trace
    pub max_steps: usize,
}

/// A charged structure prepared for field-line sampling.
pub struct System {
    /// Charges, already expressed in the user frame
    charges: Vec<PointCharge>,

    /// Origin of the user frame (structure coordinates)
    center: Vector3<f64>,

    /// Columns v1, v2, v1 × v2
    basis: Matrix3<f64>,

    region: Box<dyn Region>,

    /// Generator behind every region draw; not safe to share unguarded
    region_rng: Mutex<ChaCha8Rng>,

    /// Source of per-worker generators
    entropy: Box<dyn EntropySource>,

    sample_count: usize,

    params: SamplingParams,
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("charges", &self.charges.len())
            .field("region", &self.region.description())
            .field("sample_count", &self.sample_count)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl System {
    /// Builds a system from a structure file and an options file.
    ///
    /// The options are checked before the structure is read, so a missing
    /// region fails without touching the charge file.
    pub fn from_files(charges_path: impl AsRef<Path>, options_path: impl AsRef<Path>) -> Result<Self> {
        let options = Options::load(options_path)?;
        options.validate()?;

        let region = options
            .volume
            .as_ref()
            .ok_or_else(|| CpetError::config("no volume configured"))?
            .build()?;
        info!("[Region] ==>> {}", region.description());

        let charges = load_point_charges(charges_path)?;
        Self::new(charges, region, &options)
    }

    /// Builds a system from loaded charges and an injected region.
    ///
    /// Charges are translated to `options.center` and re-expressed in
    /// `options.basis`. The volume descriptor in `options` is not consulted.
    pub fn new(mut charges: Vec<PointCharge>, region: Box<dyn Region>, options: &Options) -> Result<Self> {
        if charges.is_empty() {
            return Err(CpetError::config("no point charges loaded"));
        }
        if options.sample_count == 0 {
            return Err(CpetError::config("sample count must be at least 1"));
        }
        // The parallel countdown is signed
        if isize::try_from(options.sample_count).is_err() {
            return Err(CpetError::config(format!(
                "sample count {} exceeds {}",
                options.sample_count,
                isize::MAX
            )));
        }
        options.sampling.validate()?;

        to_user_frame(&mut charges, &options.center, &options.basis)?;

        let entropy: Box<dyn EntropySource> = match options.sampling.seed {
            Some(seed) => Box::new(SeededEntropy::new(seed)),
            None => Box::new(OsEntropy::new()),
        };

        Ok(Self {
            charges,
            center: options.center,
            basis: options.basis,
            region,
            region_rng: Mutex::new(entropy.region_rng()),
            entropy,
            sample_count: options.sample_count,
            params: options.sampling,
        })
    }

    /// Replaces the entropy source, resetting the region generator.
    pub fn with_entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.region_rng = Mutex::new(entropy.region_rng());
        self.entropy = Box::new(entropy);
        self
    }

    pub fn charges(&self) -> &[PointCharge] {
        &self.charges
    }

    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    pub fn basis(&self) -> Matrix3<f64> {
        self.basis
    }

    pub fn region(&self) -> &dyn Region {
        self.region.as_ref()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn params(&self) -> &SamplingParams {
        &self.params
    }

    /// Master seed of the entropy source (0 when seeded from the OS).
    pub fn seed(&self) -> u64 {
        self.entropy.seed()
    }

    /// Electric field at `position` (user frame).
    ///
    /// Non-finite if `position` coincides with a charge.
    pub fn electric_field(&self, position: &Vector3<f64>) -> Vector3<f64> {
        electric_field(&self.charges, position)
    }

    /// Curvature of the field line through `point`.
    pub fn curvature(&self, point: &Vector3<f64>) -> f64 {
        curvature(|p| self.electric_field(p), point, self.params.step_size)
    }

    /// One integration step from `position`.
    pub fn next_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        advance(position, &self.electric_field(position), self.params.step_size)
    }

    /// Runs all trials and returns exactly `sample_count` samples.
    ///
    /// `workers == 1` samples on the calling thread; larger values spawn that
    /// many scoped threads for the duration of the call. `0` is treated as 1.
    pub fn calculate_topology(&self, workers: usize) -> Vec<PathSample> {
        info!("======[Sampling topology]======");
        info!("[Npoints] ==>> {}", self.sample_count);
        info!("[Threads] ==>> {}", workers);

        let workers = if workers == 0 {
            warn!("Worker count 0 requested, sampling on the calling thread");
            1
        } else {
            workers
        };

        if workers == 1 {
            let mut rng = self.entropy.worker_rng(0);
            return (0..self.sample_count).map(|_| self.sample(&mut rng)).collect();
        }

        let remaining = AtomicIsize::new(self.sample_count as isize);
        let results = Mutex::new(Vec::with_capacity(self.sample_count));

        info!("====[Initializing threads]====");
        thread::scope(|scope| {
            for worker in 0..workers {
                let mut rng = self.entropy.worker_rng(worker as u64);
                let remaining = &remaining;
                let results = &results;

                scope.spawn(move || {
                    let mut claimed = 0usize;
                    while remaining.fetch_sub(1, Ordering::AcqRel) > 0 {
                        let sample = self.sample(&mut rng);
                        results
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(sample);
                        claimed += 1;
                    }
                    debug!("[Worker {}] ==>> {} samples", worker, claimed);
                });
            }
        });

        results.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one field-line trial.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> PathSample {
        let trace = self.trace(rng);

        PathSample::new(
            (trace.final_position - trace.initial_position).norm(),
            (self.curvature(&trace.final_position) + self.curvature(&trace.initial_position)) / 2.0,
        )
    }

    /// Walks one field line from a random start point.
    pub fn trace(&self, rng: &mut ChaCha8Rng) -> Trace {
        let max_steps = self.random_step_budget(rng);
        let initial_position = self.random_start();

        let mut final_position = initial_position;
        let mut steps = 0;
        while steps < max_steps && self.region.is_inside(&final_position) {
            final_position = self.next_position(&final_position);
            steps += 1;
        }

        Trace {
            initial_position,
            final_position,
            steps,
            max_steps,
        }
    }

    /// Draws a step budget: a uniform path length over the step size.
    fn random_step_budget(&self, rng: &mut ChaCha8Rng) -> usize {
        if self.params.max_path_length == 0.0 {
            return 0;
        }
        let length = rng.gen_range(0.0..self.params.max_path_length);
        (length / self.params.step_size) as usize
    }

    fn random_start(&self) -> Vector3<f64> {
        let mut rng = self
            .region_rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.region.random_point(&mut *rng)
    }
}

/// Translates charges to `center` and re-expresses them in `basis`.
///
/// `basis` must be invertible; for an orthonormal basis this is a rotation.
pub fn to_user_frame(charges: &mut [PointCharge], center: &Vector3<f64>, basis: &Matrix3<f64>) -> Result<()> {
    let inverse = basis
        .try_inverse()
        .ok_or_else(|| CpetError::config("basis vectors v1 and v2 are parallel or zero"))?;

    for pc in charges.iter_mut() {
        pc.position = inverse * (pc.position - center);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{BoxRegion, SphereRegion};
    use crate::sample::TopologySummary;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn options(samples: usize) -> Options {
        Options {
            sample_count: samples,
            sampling: SamplingParams {
                step_size: 0.01,
                max_path_length: 0.5,
                seed: Some(42),
            },
            ..Default::default()
        }
    }

    /// A dipole well outside a 1 Å box, so no trace ever lands on a charge.
    fn dipole_system(samples: usize) -> System {
        let charges = vec![
            PointCharge::new(Vector3::new(3.0, 0.0, 0.0), 1.0),
            PointCharge::new(Vector3::new(-3.0, 0.5, 0.0), -1.0),
        ];
        let region = Box::new(BoxRegion::new(Vector3::new(1.0, 1.0, 1.0)).unwrap());
        System::new(charges, region, &options(samples)).unwrap()
    }

    fn assert_valid(samples: &[PathSample]) {
        for s in samples {
            assert!(s.distance.is_finite() && s.distance >= 0.0, "bad distance {}", s.distance);
            assert!(s.curvature.is_finite() && s.curvature >= 0.0, "bad curvature {}", s.curvature);
        }
    }

    #[test]
    fn test_empty_charges_is_configuration_error() {
        let region = Box::new(SphereRegion::new(1.0).unwrap());
        let result = System::new(Vec::new(), region, &options(10));

        assert!(matches!(result, Err(CpetError::Configuration(_))));
    }

    #[test]
    fn test_singular_basis_is_configuration_error() {
        let mut opts = options(10);
        opts.basis = Matrix3::new(1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let charges = vec![PointCharge::new(Vector3::x(), 1.0)];
        let region = Box::new(SphereRegion::new(1.0).unwrap());

        assert!(matches!(
            System::new(charges, region, &opts),
            Err(CpetError::Configuration(_))
        ));
    }

    #[test]
    fn test_charges_moved_into_user_frame() {
        let mut opts = options(1);
        opts.center = Vector3::new(1.0, 1.0, 1.0);
        // v1 = y, v2 = z, v3 = x
        opts.basis = Matrix3::from_columns(&[Vector3::y(), Vector3::z(), Vector3::x()]);

        let charges = vec![PointCharge::new(Vector3::new(4.0, 3.0, 2.0), 1.0)];
        let region = Box::new(SphereRegion::new(1.0).unwrap());
        let system = System::new(charges, region, &opts).unwrap();

        // Offset (3, 2, 1) expressed along (y, z, x)
        assert_relative_eq!(system.charges()[0].position, Vector3::new(2.0, 1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_system_field_matches_free_function() {
        let system = dipole_system(1);
        let p = Vector3::new(0.1, -0.2, 0.3);

        assert_relative_eq!(system.electric_field(&p), electric_field(system.charges(), &p));
    }

    #[test]
    fn test_sequential_returns_exactly_n_samples() {
        let samples = dipole_system(64).calculate_topology(1);

        assert_eq!(samples.len(), 64);
        assert_valid(&samples);
    }

    #[test]
    fn test_parallel_returns_exactly_n_samples() {
        for workers in [2, 3, 8] {
            let samples = dipole_system(101).calculate_topology(workers);

            assert_eq!(samples.len(), 101, "workers={}", workers);
            assert_valid(&samples);
        }
    }

    #[test]
    fn test_more_workers_than_samples() {
        let samples = dipole_system(3).calculate_topology(8);
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn test_zero_workers_runs_sequentially() {
        let samples = dipole_system(5).calculate_topology(0);
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_seeded_sequential_runs_are_reproducible() {
        let a = dipole_system(20).calculate_topology(1);
        let b = dipole_system(20).calculate_topology(1);

        assert_eq!(a, b);
    }

    #[test]
    fn test_oversized_sample_count_is_configuration_error() {
        let charges = vec![PointCharge::new(Vector3::x(), 1.0)];
        let region = Box::new(SphereRegion::new(1.0).unwrap());

        let err = System::new(charges, region, &options(usize::MAX)).unwrap_err();
        assert!(matches!(err, CpetError::Configuration(_)));
    }

    #[test]
    fn test_debug_names_region_and_count() {
        let text = format!("{:?}", dipole_system(12));

        assert!(text.starts_with("System {"));
        assert!(text.contains("Box: [1, 1, 1]"));
        assert!(text.contains("sample_count: 12"));
    }

    #[test]
    fn test_seed_reported_from_entropy_source() {
        let system = dipole_system(1);
        assert_eq!(system.seed(), 42);
        assert_eq!(system.with_entropy(SeededEntropy::new(7)).seed(), 7);
        assert_eq!(dipole_system(1).with_entropy(OsEntropy::new()).seed(), 0);
    }

    #[test]
    fn test_entropy_override_changes_stream() {
        let a = dipole_system(20).calculate_topology(1);
        let b = dipole_system(20)
            .with_entropy(SeededEntropy::new(7))
            .calculate_topology(1);

        assert_ne!(a, b);
    }

    #[test]
    fn test_outward_field_trace_terminates_within_budget() {
        // Single charge at the origin pushes every line out of the sphere
        let charges = vec![PointCharge::new(Vector3::zeros(), 1.0)];
        let region = Box::new(SphereRegion::new(0.2).unwrap());
        let mut opts = options(1);
        opts.sampling.max_path_length = 5.0;
        let system = System::new(charges, region, &opts).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let trace = system.trace(&mut rng);
            assert!(trace.steps <= trace.max_steps);
            // A line that ran out of region stops one step past the boundary
            if trace.steps < trace.max_steps {
                assert!(!system.region().is_inside(&trace.final_position));
            }
        }
    }

    #[test]
    fn test_zero_budget_gives_zero_distance() {
        let mut system = dipole_system(10);
        system.params.max_path_length = 0.0;

        let samples = system.calculate_topology(2);
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| s.distance == 0.0));
    }

    #[test]
    fn test_worker_counts_agree_statistically() {
        let runs: Vec<TopologySummary> = [1, 2, 8]
            .iter()
            .map(|&w| TopologySummary::from_samples(&dipole_system(2000).calculate_topology(w)))
            .collect();

        let base = runs[0];
        for summary in &runs[1..] {
            assert_eq!(summary.count, 2000);
            let d_tol = 4.0 * base.std_distance / (2000f64).sqrt() + 1e-9;
            let k_tol = 4.0 * base.std_curvature / (2000f64).sqrt() + 1e-9;
            assert!((summary.mean_distance - base.mean_distance).abs() <= 2.0 * d_tol);
            assert!((summary.mean_curvature - base.mean_curvature).abs() <= 2.0 * k_tol);
        }
    }

    #[test]
    fn test_repeated_parallel_runs_do_not_deadlock() {
        let system = dipole_system(50);
        for _ in 0..20 {
            assert_eq!(system.calculate_topology(4).len(), 50);
        }
    }
}
