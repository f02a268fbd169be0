//! Sample and summary exporters.

use cpet_core::{PathSample, TopologySummary};
use cpet_env::{CpetError, Result};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one `distance,curvature` line per sample.
pub fn write_samples(samples: &[PathSample], writer: &mut impl Write) -> std::io::Result<()> {
    for sample in samples {
        writeln!(writer, "{}", sample)?;
    }
    writer.flush()
}

/// Writes the samples to a CSV file, replacing it if present.
pub fn write_samples_to_file(samples: &[PathSample], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| CpetError::io(path, e))?;
    write_samples(samples, &mut BufWriter::new(file)).map_err(|e| CpetError::io(path, e))
}

/// Metadata and statistics of one topology run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyExport {
    /// Structure file the charges came from
    pub structure: String,

    /// Options file the run was configured from
    pub options: String,

    /// Worker threads used
    pub workers: usize,

    /// Master seed (0 = OS entropy)
    pub seed: u64,

    /// Origin of the user frame, in structure coordinates
    pub center: [f64; 3],

    /// Frame axes v1, v2, v3
    pub axes: [[f64; 3]; 3],

    /// Wall-clock sampling time in seconds
    pub elapsed_secs: f64,

    pub summary: TopologySummary,

    /// CSV destination, if samples were written to a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl TopologyExport {
    /// Creates an export for a finished run.
    pub fn new(structure: &str, options: &str, workers: usize, seed: u64) -> Self {
        Self {
            structure: structure.to_string(),
            options: options.to_string(),
            workers,
            seed,
            center: [0.0; 3],
            axes: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            elapsed_secs: 0.0,
            summary: TopologySummary::default(),
            output: None,
        }
    }

    /// Records the user frame the charges were expressed in.
    pub fn with_frame(mut self, center: &Vector3<f64>, basis: &Matrix3<f64>) -> Self {
        self.center = [center.x, center.y, center.z];
        for (axis, column) in self.axes.iter_mut().zip(basis.column_iter()) {
            *axis = [column[0], column[1], column[2]];
        }
        self
    }

    /// Records the sampled results.
    pub fn finalize(&mut self, samples: &[PathSample], elapsed_secs: f64) {
        self.summary = TopologySummary::from_samples(samples);
        self.elapsed_secs = elapsed_secs;
    }

    /// Renders the export as pretty JSON.
    pub fn to_json(&self) -> String {
        // Only plain numbers and strings; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<PathSample> {
        vec![PathSample::new(0.5, 0.25), PathSample::new(1.5, 0.75)]
    }

    #[test]
    fn test_write_samples_csv() {
        let mut buffer = Vec::new();
        write_samples(&samples(), &mut buffer).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "0.5,0.25\n1.5,0.75\n");
    }

    #[test]
    fn test_write_samples_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.csv");

        write_samples_to_file(&samples(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let err = write_samples_to_file(&samples(), "/no/such/dir/out.csv").unwrap_err();
        assert!(matches!(err, CpetError::Io { .. }));
    }

    #[test]
    fn test_export_json_round_trip() {
        let mut export = TopologyExport::new("protein.pqr", "options", 4, 42);
        export.finalize(&samples(), 1.25);

        let parsed: TopologyExport = serde_json::from_str(&export.to_json()).unwrap();
        assert_eq!(parsed.workers, 4);
        assert_eq!(parsed.summary.count, 2);
        assert_eq!(parsed.summary.mean_distance, 1.0);
        assert!(parsed.output.is_none());
    }

    #[test]
    fn test_export_records_frame_axes() {
        let basis = Matrix3::from_columns(&[Vector3::y(), Vector3::z(), Vector3::x()]);
        let export = TopologyExport::new("protein.pqr", "options", 1, 0)
            .with_frame(&Vector3::new(1.0, 2.0, 3.0), &basis);

        assert_eq!(export.center, [1.0, 2.0, 3.0]);
        assert_eq!(export.axes[0], [0.0, 1.0, 0.0]);
        assert_eq!(export.axes[2], [1.0, 0.0, 0.0]);
    }
}
