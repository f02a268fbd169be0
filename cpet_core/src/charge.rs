//! Point charges and the PDB-style loader that produces them.

use cpet_env::{CpetError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Approximate bytes per `ATOM` record, used to pre-size the charge list.
const BYTES_PER_RECORD: u64 = 69;

/// Fixed columns (0-based, end-exclusive) of an `ATOM`/`HETATM` record.
const X_COLUMNS: std::ops::Range<usize> = 31..39;
const Y_COLUMNS: std::ops::Range<usize> = 39..47;
const Z_COLUMNS: std::ops::Range<usize> = 47..55;
const CHARGE_COLUMNS: std::ops::Range<usize> = 55..63;

/// A fixed charge contributing to the electric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCharge {
    /// Position [x, y, z] in Å
    pub position: Vector3<f64>,

    /// Charge in units of e
    pub charge: f64,
}

impl PointCharge {
    /// Creates a point charge.
    pub fn new(position: Vector3<f64>, charge: f64) -> Self {
        Self { position, charge }
    }
}

/// Loads every `ATOM`/`HETATM` record of a structure file as a point charge.
pub fn load_point_charges(path: impl AsRef<Path>) -> Result<Vec<PointCharge>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CpetError::io(path, e))?;
    let file_size = file.metadata().map_err(|e| CpetError::io(path, e))?.len();

    let capacity = (file_size / BYTES_PER_RECORD) as usize;
    let charges = parse_point_charges(BufReader::new(file), capacity).map_err(|e| match e {
        CpetError::Io { source, .. } => CpetError::io(path, source),
        other => other,
    })?;

    info!("Loaded {} point charges from {}", charges.len(), path.display());
    Ok(charges)
}

/// Parses point charges from any line source.
///
/// Lines that are not `ATOM`/`HETATM` records are skipped.
pub fn parse_point_charges(reader: impl BufRead, capacity: usize) -> Result<Vec<PointCharge>> {
    let mut charges = Vec::with_capacity(capacity);

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CpetError::io("<reader>", e))?;
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }

        let line_no = index + 1;
        let position = Vector3::new(
            column(&line, X_COLUMNS, line_no, "x")?,
            column(&line, Y_COLUMNS, line_no, "y")?,
            column(&line, Z_COLUMNS, line_no, "z")?,
        );
        let charge = column(&line, CHARGE_COLUMNS, line_no, "charge")?;
        charges.push(PointCharge::new(position, charge));
    }

    Ok(charges)
}

fn column(line: &str, range: std::ops::Range<usize>, line_no: usize, field: &str) -> Result<f64> {
    let raw = line.get(range.clone()).ok_or_else(|| {
        CpetError::parse(
            line_no,
            format!("record too short for {} columns {}..{}", field, range.start, range.end),
        )
    })?;

    raw.trim()
        .parse::<f64>()
        .map_err(|e| CpetError::parse(line_no, format!("invalid {} '{}': {}", field, raw.trim(), e)))
}
