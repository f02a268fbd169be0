//! Options file loader.
//!
//! The options file is line oriented; each line starts with a keyword
//! followed by whitespace-separated values:
//!
//! ```text
//! center 10.0 12.5 -3.0
//! v1 1 0 0
//! v2 0 1 0
//! volume box 2.0 2.0 2.0
//! sample 10000
//! step 0.001
//! length 1.0
//! seed 42
//! ```
//!
//! Blank lines and `#` comments are skipped. Unknown keywords are ignored.

use crate::region::VolumeSpec;
use cpet_env::{CpetError, Result};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Integration and randomization knobs for a topology run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Length of one integration step along the field (Å)
    pub step_size: f64,

    /// Upper bound of the per-trial path length budget (Å)
    pub max_path_length: f64,

    /// Master seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            step_size: 0.001,
            max_path_length: 1.0,
            seed: None,
        }
    }
}

impl SamplingParams {
    /// Checks that the step and path budget describe a finite trace.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(CpetError::config(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }
        if !(self.max_path_length.is_finite() && self.max_path_length >= 0.0) {
            return Err(CpetError::config(format!(
                "max path length must be non-negative, got {}",
                self.max_path_length
            )));
        }
        Ok(())
    }
}

/// Parsed contents of an options file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Origin of the user frame, in structure coordinates
    pub center: Vector3<f64>,

    /// Columns are v1, v2 and v1 × v2
    pub basis: Matrix3<f64>,

    /// Sampling region; required
    pub volume: Option<VolumeSpec>,

    /// Number of field-line trials
    pub sample_count: usize,

    pub sampling: SamplingParams,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            center: Vector3::zeros(),
            basis: Matrix3::identity(),
            volume: None,
            sample_count: 0,
            sampling: SamplingParams::default(),
        }
    }
}

impl Options {
    /// Reads and parses an options file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CpetError::io(path, e))?;
        let options = text.parse::<Options>()?;

        info!("=====[Options | {}]=====", path.display());
        options.log_summary();
        Ok(options)
    }

    /// Rejects options that cannot drive a run, before any charges load.
    pub fn validate(&self) -> Result<()> {
        if self.volume.is_none() {
            return Err(CpetError::config("no volume configured"));
        }
        if self.sample_count == 0 {
            return Err(CpetError::config("sample count must be at least 1"));
        }
        self.sampling.validate()
    }

    fn log_summary(&self) {
        let col = |i: usize| {
            let c = self.basis.column(i);
            format!("[ {:.4} {:.4} {:.4} ]", c[0], c[1], c[2])
        };
        info!("[V1]     ==>> {}", col(0));
        info!("[V2]     ==>> {}", col(1));
        info!("[V3]     ==>> {}", col(2));
        info!(
            "[Center] ==>> [ {:.4} {:.4} {:.4} ]",
            self.center.x, self.center.y, self.center.z
        );
        match &self.volume {
            Some(volume) => info!("[Volume] ==>> {:?}", volume),
            None => info!("[Volume] ==>> <none>"),
        }
        info!("[Npoints] ==>> {}", self.sample_count);
    }
}

impl FromStr for Options {
    type Err = CpetError;

    fn from_str(text: &str) -> Result<Self> {
        let mut options = Options::default();
        let mut v1 = Vector3::x();
        let mut v2 = Vector3::y();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            match keyword {
                "center" => options.center = vector(&values, line_no, keyword)?,
                "v1" => v1 = vector(&values, line_no, keyword)?,
                "v2" => v2 = vector(&values, line_no, keyword)?,
                "volume" => {
                    let (kind, params) = values.split_first().ok_or_else(|| {
                        CpetError::parse(line_no, "volume needs a kind (box or sphere)")
                    })?;
                    let params = params
                        .iter()
                        .map(|v| number::<f64>(v, line_no, "volume"))
                        .collect::<Result<Vec<_>>>()?;
                    options.volume = Some(VolumeSpec::from_kind(kind, &params)?);
                }
                "sample" => options.sample_count = single(&values, line_no, keyword)?,
                "step" => options.sampling.step_size = single(&values, line_no, keyword)?,
                "length" => options.sampling.max_path_length = single(&values, line_no, keyword)?,
                "seed" => options.sampling.seed = Some(single(&values, line_no, keyword)?),
                other => debug!("Ignoring unknown option '{}' on line {}", other, line_no),
            }
        }

        // Third axis is always derived, never read
        options.basis.set_column(0, &v1);
        options.basis.set_column(1, &v2);
        options.basis.set_column(2, &v1.cross(&v2));

        Ok(options)
    }
}

fn number<T: FromStr>(raw: &str, line_no: usize, keyword: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| CpetError::parse(line_no, format!("invalid {} value '{}': {}", keyword, raw, e)))
}

fn single<T: FromStr>(values: &[&str], line_no: usize, keyword: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match values {
        [raw, ..] => number(raw, line_no, keyword),
        [] => Err(CpetError::parse(line_no, format!("{} needs a value", keyword))),
    }
}

fn vector(values: &[&str], line_no: usize, keyword: &str) -> Result<Vector3<f64>> {
    match values {
        [x, y, z, ..] => Ok(Vector3::new(
            number(x, line_no, keyword)?,
            number(y, line_no, keyword)?,
            number(z, line_no, keyword)?,
        )),
        _ => Err(CpetError::parse(
            line_no,
            format!("{} needs 3 components, got {}", keyword, values.len()),
        )),
    }
}
