//! Sampling regions.
//!
//! The sampler only ever asks a region for a random interior point and
//! whether a point is still inside. Shapes are centered on the origin of the
//! user frame, which is where the options' `center` lands after the charges
//! have been transformed.

use cpet_env::{CpetError, Result};
use nalgebra::Vector3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// A bounded volume that field lines are traced through.
///
/// `random_point` draws from the generator it is handed; the caller owns
/// that generator and is responsible for serializing access to it.
pub trait Region: Send + Sync {
    /// Returns a point drawn uniformly from the interior.
    fn random_point(&self, rng: &mut dyn RngCore) -> Vector3<f64>;

    /// Returns true if `point` lies inside or on the boundary.
    fn is_inside(&self, point: &Vector3<f64>) -> bool;

    /// Human-readable description for logs.
    fn description(&self) -> String;
}

/// Axis-aligned box spanning `[-h, h]` on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRegion {
    half_extents: Vector3<f64>,
}

impl BoxRegion {
    /// Creates a box from its half-extents, which must be positive.
    pub fn new(half_extents: Vector3<f64>) -> Result<Self> {
        if half_extents.iter().any(|h| !(h.is_finite() && *h > 0.0)) {
            return Err(CpetError::config(format!(
                "box half-extents must be positive, got [{}, {}, {}]",
                half_extents.x, half_extents.y, half_extents.z
            )));
        }
        Ok(Self { half_extents })
    }
}

impl Region for BoxRegion {
    fn random_point(&self, rng: &mut dyn RngCore) -> Vector3<f64> {
        // Scale a unit draw; a [-h, h] range overflows for h > f64::MAX / 2
        let unit = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        unit.component_mul(&self.half_extents)
    }

    fn is_inside(&self, point: &Vector3<f64>) -> bool {
        point
            .iter()
            .zip(self.half_extents.iter())
            .all(|(p, h)| p.abs() <= *h)
    }

    fn description(&self) -> String {
        format!(
            "Box: [{}, {}, {}]",
            self.half_extents.x, self.half_extents.y, self.half_extents.z
        )
    }
}

/// Ball of the given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereRegion {
    radius: f64,
}

impl SphereRegion {
    /// Creates a sphere; the radius must be positive.
    pub fn new(radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CpetError::config(format!(
                "sphere radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self { radius })
    }
}

impl Region for SphereRegion {
    fn random_point(&self, rng: &mut dyn RngCore) -> Vector3<f64> {
        // Rejection sampling from the unit cube (accepts ~52%), then scale
        loop {
            let candidate: Vector3<f64> = Vector3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            );
            if candidate.norm_squared() <= 1.0 {
                return candidate * self.radius;
            }
        }
    }

    fn is_inside(&self, point: &Vector3<f64>) -> bool {
        // Relative to the radius so huge spheres don't overflow the square
        (point / self.radius).norm_squared() <= 1.0
    }

    fn description(&self) -> String {
        format!("Sphere: r={}", self.radius)
    }
}

/// Region descriptor as read from an options file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VolumeSpec {
    Box { half_extents: [f64; 3] },
    Sphere { radius: f64 },
}

impl VolumeSpec {
    /// Resolves a volume keyword and its numeric parameters.
    ///
    /// Unknown keywords are a lookup error; a wrong parameter count is a
    /// configuration error.
    pub fn from_kind(kind: &str, params: &[f64]) -> Result<Self> {
        match (kind, params) {
            ("box", [x, y, z]) => Ok(Self::Box {
                half_extents: [*x, *y, *z],
            }),
            ("sphere", [r]) => Ok(Self::Sphere { radius: *r }),
            ("box", _) => Err(CpetError::config(format!(
                "volume box takes 3 half-extents, got {}",
                params.len()
            ))),
            ("sphere", _) => Err(CpetError::config(format!(
                "volume sphere takes 1 radius, got {}",
                params.len()
            ))),
            (other, _) => Err(CpetError::lookup(format!(
                "no volume kind named '{}' (expected box or sphere)",
                other
            ))),
        }
    }

    /// Builds the concrete region.
    pub fn build(&self) -> Result<Box<dyn Region>> {
        match *self {
            Self::Box { half_extents } => Ok(Box::new(BoxRegion::new(Vector3::from(half_extents))?)),
            Self::Sphere { radius } => Ok(Box::new(SphereRegion::new(radius)?)),
        }
    }
}
