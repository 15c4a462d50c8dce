//! Predator–prey encounter kernels [m³ s⁻¹ per predator per prey].
//!
//! Three mechanisms bring particles together: Brownian motion, turbulent
//! shear, and relative motion (sinking and swimming). The method string
//! configured for a grazer selects how they combine.

use std::f64::consts::PI;
use std::str::FromStr;

use crate::constants::{BOLTZMANN, ZERO_CELSIUS};
use crate::error::SetupError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterMethod {
    /// Kernels add linearly.
    Rectilinear,
    /// Kernels add in quadrature.
    Quadrature,
}

impl FromStr for EncounterMethod {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rect" => Ok(EncounterMethod::Rectilinear),
            "quad" => Ok(EncounterMethod::Quadrature),
            other => Err(SetupError::invalid(format!(
                "unknown encounter method '{other}' (expected 'rect' or 'quad')"
            ))),
        }
    }
}

/// A particle as seen by the kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Radius [m]
    pub radius: f64,
    /// Sinking speed [m s⁻¹]
    pub sinking: f64,
    /// Swimming speed [m s⁻¹]
    pub swimming: f64,
}

impl Particle {
    /// Phytoplankton cell with allometric sinking speed `0.004 r^0.26`.
    pub fn phytoplankton(radius: f64) -> Self {
        Self {
            radius,
            sinking: 0.004 * radius.powf(0.26),
            swimming: 0.0,
        }
    }

    pub fn swimmer(radius: f64, swimming: f64) -> Self {
        Self {
            radius,
            sinking: 0.0,
            swimming,
        }
    }
}

/// Ambient fluid properties of the cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fluid {
    /// Turbulent kinetic energy dissipation rate [m² s⁻³]
    pub dissipation: f64,
    /// Kinematic viscosity [m² s⁻¹]
    pub viscosity: f64,
    /// Density [kg m⁻³]
    pub density: f64,
    /// Temperature [°C]
    pub temperature: f64,
}

pub fn brownian(a: &Particle, b: &Particle, fluid: &Fluid) -> f64 {
    let mu = fluid.viscosity * fluid.density;
    if mu <= 0.0 {
        return 0.0;
    }
    let kt = BOLTZMANN * (fluid.temperature + ZERO_CELSIUS);
    2.0 * kt / (3.0 * mu) * (1.0 / a.radius + 1.0 / b.radius) * (a.radius + b.radius)
}

pub fn shear(a: &Particle, b: &Particle, fluid: &Fluid) -> f64 {
    if fluid.viscosity <= 0.0 {
        return 0.0;
    }
    1.3 * (fluid.dissipation.max(0.0) / fluid.viscosity).sqrt() * (a.radius + b.radius).powi(3)
}

pub fn differential_settling(a: &Particle, b: &Particle) -> f64 {
    PI * (a.radius + b.radius).powi(2) * (a.sinking - b.sinking).abs()
}

/// Gerritsen–Strickler cruise encounter for randomly oriented swimmers.
pub fn swimming(a: &Particle, b: &Particle) -> f64 {
    let fast = a.swimming.abs().max(b.swimming.abs());
    let slow = a.swimming.abs().min(b.swimming.abs());
    if fast <= 0.0 {
        return 0.0;
    }
    PI * (a.radius + b.radius).powi(2) * (slow * slow + 3.0 * fast * fast) / (3.0 * fast)
}

/// Combined encounter kernel between `prey` and `predator`. Never negative.
pub fn encounter_rate(
    method: EncounterMethod,
    prey: &Particle,
    predator: &Particle,
    fluid: &Fluid,
) -> f64 {
    let kernels = [
        brownian(prey, predator, fluid),
        shear(prey, predator, fluid),
        differential_settling(prey, predator),
        swimming(prey, predator),
    ];
    let phi = match method {
        EncounterMethod::Rectilinear => kernels.iter().sum(),
        EncounterMethod::Quadrature => kernels.iter().map(|k| k * k).sum::<f64>().sqrt(),
    };
    if phi.is_finite() { phi.max(0.0) } else { 0.0 }
}
