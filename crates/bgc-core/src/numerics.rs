//! Shared scalar kernels and hazard guards.
//!
//! Evaluation never raises errors: depleted (negative) pools are floored
//! at zero before they feed a rate, and divisors are floored at
//! [`EPSILON`] so a collapsed pool cannot poison the derivative with
//! `NaN`/`Inf`.

use crate::constants::EPSILON;

/// Clamp a concentration to be non-negative. `NaN` maps to 0.
#[inline]
pub fn floor_zero(x: f64) -> f64 {
    if x > 0.0 { x } else { 0.0 }
}

/// Floor a divisor at [`EPSILON`].
#[inline]
pub fn guard_divisor(x: f64) -> f64 {
    if x > EPSILON { x } else { EPSILON }
}

/// Split of a flux between an oxygen-dependent fate and its complement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Partition {
    pub aerobic: f64,
    pub anaerobic: f64,
}

/// Sigmoid partition `O² / (K² + O²)` with the anaerobic complement.
///
/// The two fractions always sum to exactly 1. With `K = 0` any positive
/// oxygen is fully aerobic; with no oxygen the flux is fully anaerobic.
pub fn partition(oxygen: f64, half_saturation: f64) -> Partition {
    let o2 = floor_zero(oxygen).powi(2);
    let denom = half_saturation * half_saturation + o2;
    let aerobic = if denom > 0.0 { o2 / denom } else { 0.0 };
    Partition {
        aerobic,
        anaerobic: 1.0 - aerobic,
    }
}

/// Michaelis–Menten limitation `x / (K + x)` on a floored input.
pub fn monod(x: f64, half_saturation: f64) -> f64 {
    let x = floor_zero(x);
    x / guard_divisor(half_saturation + x)
}

/// Temperature scaling `Q10^((T - Tref) / 10)`.
pub fn q10_factor(q10: f64, temp: f64, tref: f64) -> f64 {
    q10.powf((temp - tref) / 10.0)
}

/// Kinematic viscosity of water [m² s⁻¹] from temperature [°C]
/// (Poiseuille's fit).
pub fn water_viscosity(temp: f64) -> f64 {
    let t = temp.clamp(-2.0, 40.0);
    1.792e-6 / (1.0 + 0.0337 * t + 0.000221 * t * t)
}
