//! Field-line trial results and their aggregate statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one field-line trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    /// Net displacement between start and end of the trace (Å)
    pub distance: f64,

    /// Mean of the curvature estimates at both ends of the trace (1/Å)
    pub curvature: f64,
}

impl PathSample {
    /// Creates a sample.
    pub fn new(distance: f64, curvature: f64) -> Self {
        Self { distance, curvature }
    }
}

/// Writes the sample as a `distance,curvature` record.
impl fmt::Display for PathSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.distance, self.curvature)
    }
}

/// Aggregate statistics over a set of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySummary {
    /// Number of samples summarized
    pub count: usize,

    pub mean_distance: f64,
    pub std_distance: f64,

    pub mean_curvature: f64,
    pub std_curvature: f64,
}

impl TopologySummary {
    /// Computes population mean and standard deviation of both fields.
    ///
    /// An empty slice yields an all-zero summary.
    pub fn from_samples(samples: &[PathSample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let mean_distance = samples.iter().map(|s| s.distance).sum::<f64>() / n;
        let mean_curvature = samples.iter().map(|s| s.curvature).sum::<f64>() / n;

        let var_distance = samples
            .iter()
            .map(|s| (s.distance - mean_distance).powi(2))
            .sum::<f64>()
            / n;
        let var_curvature = samples
            .iter()
            .map(|s| (s.curvature - mean_curvature).powi(2))
            .sum::<f64>()
            / n;

        Self {
            count: samples.len(),
            mean_distance,
            std_distance: var_distance.sqrt(),
            mean_curvature,
            std_curvature: var_curvature.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_display_is_csv_record() {
        assert_eq!(PathSample::new(1.5, 0.25).to_string(), "1.5,0.25");
        assert_eq!(PathSample::default().to_string(), "0,0");
    }

    #[test]
    fn test_summary_statistics() {
        let samples = [
            PathSample::new(1.0, 0.0),
            PathSample::new(3.0, 2.0),
            PathSample::new(2.0, 1.0),
            PathSample::new(2.0, 1.0),
        ];
        let summary = TopologySummary::from_samples(&samples);

        assert_eq!(summary.count, 4);
        assert_relative_eq!(summary.mean_distance, 2.0);
        assert_relative_eq!(summary.mean_curvature, 1.0);
        assert_relative_eq!(summary.std_distance, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(summary.std_curvature, 0.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(TopologySummary::from_samples(&[]), TopologySummary::default());
    }
}
