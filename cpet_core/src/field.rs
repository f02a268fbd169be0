//! Electrostatic field evaluation and field-line geometry.
//!
//! Positions are in Å, charges in e, fields in V/Å. Every function here is
//! pure, so the charge set can be shared across sampling workers without
//! synchronization.
//!
//! Evaluating the field exactly on a charge divides by zero and yields
//! non-finite components. Callers are responsible for keeping sample points
//! off the charges.

use crate::charge::PointCharge;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Vacuum permittivity in e²/(eV·Å).
pub const PERMITTIVITY: f64 = 0.0055263495;

/// Coulomb prefactor 1/(4π·ε).
pub const COULOMB_CONSTANT: f64 = 1.0 / (4.0 * PI * PERMITTIVITY);

/// Superposition of the Coulomb fields of every charge at `position`.
pub fn electric_field(charges: &[PointCharge], position: &Vector3<f64>) -> Vector3<f64> {
    let sum = charges.iter().fold(Vector3::zeros(), |acc, pc| {
        let d = position - pc.position;
        let d_norm = d.norm();
        acc + d * (pc.charge / (d_norm * d_norm * d_norm))
    });

    sum * COULOMB_CONSTANT
}

/// Advances `position` one fixed step along the unit direction of `field`.
///
/// A null field has no direction; the position is returned unchanged.
pub fn advance(position: &Vector3<f64>, field: &Vector3<f64>, step_size: f64) -> Vector3<f64> {
    match field.try_normalize(0.0) {
        Some(direction) => position + direction * step_size,
        None => *position,
    }
}

/// One-step finite-difference curvature of the field line through `point`.
///
/// With the field-line parameterization dα/dt = E, one step of length `h`
/// along Ê spends Δt = h/|E| and the field's derivative along the line is
/// E' ≈ (E(α₁) − E(α₀))/Δt. The curvature of the line is then
/// `|E × E'| / |E|³`.
///
/// Returns 0 where the field vanishes, since the line has no tangent there.
pub fn curvature<F>(field: F, point: &Vector3<f64>, step_size: f64) -> f64
where
    F: Fn(&Vector3<f64>) -> Vector3<f64>,
{
    let alpha_prime = field(point);
    let alpha_prime_norm = alpha_prime.norm();
    if alpha_prime_norm == 0.0 {
        return 0.0;
    }

    let alpha_1 = advance(point, &alpha_prime, step_size);
    let delta_t = (alpha_1 - point).norm() / alpha_prime_norm;

    let alpha_prime_prime = (field(&alpha_1) - alpha_prime) / delta_t;

    alpha_prime.cross(&alpha_prime_prime).norm()
        / (alpha_prime_norm * alpha_prime_norm * alpha_prime_norm)
}
