/// Floor applied to divisors that may collapse to zero (depleted pools).
pub const EPSILON: f64 = 1e-10;

/// Seconds per day, used to express diagnostic rates per day.
pub const SEC_PER_DAY: f64 = 86_400.0;

/// Atomic weight of nitrogen [g mol⁻¹]
pub const ATOMIC_N: f64 = 14.01;

/// Atomic weight of phosphorus [g mol⁻¹]
pub const ATOMIC_P: f64 = 30.97;

/// Atomic weight of carbon [g mol⁻¹]
pub const ATOMIC_C: f64 = 12.01;

/// Redfield atomic ratio C:P
pub const RED_A_C: f64 = 106.0;

/// Redfield atomic ratio N:P
pub const RED_A_N: f64 = 16.0;

/// Redfield weight ratio P:N (mg P per mg N)
pub const RED_W_P: f64 = ATOMIC_P / (RED_A_N * ATOMIC_N);

/// Redfield weight ratio C:N (mg C per mg N)
pub const RED_W_C: f64 = RED_A_C * ATOMIC_C / (RED_A_N * ATOMIC_N);

/// Oxygen to carbon weight ratio for respiration (mg O₂ per mg C)
pub const C_O_W: f64 = 32.0 / ATOMIC_C;

/// Redfield weight ratio O₂:N (mg O₂ per mg N)
pub const RED_W_O: f64 = RED_W_C * C_O_W;

/// mg N → mol N
pub const MG_N_TO_MOL_N: f64 = 1e-3 / ATOMIC_N;

/// Energy reserve (mmol photon) → mg C.
/// 1060 photons fix 106 carbon atoms.
pub const ENERGY_RESERVE_TO_C: f64 = RED_A_C / 1060.0 * ATOMIC_C;

/// Carbon density of zooplankton cells [mol C m⁻³ of cell volume]
pub const ZOO_CARBON_DENSITY: f64 = 9.2e3;

/// Seawater density used by the encounter kernels [kg m⁻³]
pub const WATER_DENSITY: f64 = 1000.0;

/// Boltzmann constant [J K⁻¹]
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// 0 °C in kelvin
pub const ZERO_CELSIUS: f64 = 273.15;

/// Model-cache flag enabling the water-column mass-balance audit.
pub const MASS_BALANCE_WC: &str = "massbalance_wc";

/// Model-cache flag enabling the sediment mass-balance audit.
pub const MASS_BALANCE_SED: &str = "massbalance_sed";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redfield_weight_ratios() {
        assert!((RED_W_P - 0.138_16).abs() < 1e-4, "RED_W_P = {RED_W_P}");
        assert!((RED_W_C - 5.679).abs() < 1e-3, "RED_W_C = {RED_W_C}");
        assert!((RED_W_O / RED_W_C - C_O_W).abs() < 1e-12);
    }

    #[test]
    fn test_energy_reserve_conversion() {
        assert!((ENERGY_RESERVE_TO_C - 1.201).abs() < 1e-12);
    }
}
