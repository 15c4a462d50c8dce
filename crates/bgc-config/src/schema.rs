//! TOML run description.
//!
//! ```toml
//! [run]
//! name = "estuary"
//! tracers = ["temp", "PhyD_N", ...]
//! mass_balance = ["water_column"]
//!
//! [parameters]
//! PD_mL = 1.2e-6
//! ZLmeth = "rect"
//!
//! [processes]
//! water_column = ["tfactor", "dinoflagellate_diel_mortality_wc"]
//!
//! [[cells]]
//! domain = "water_column"
//! dz = 2.0
//! state = { temp = 18.0, PhyD_N = 5.0 }
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use bgc_core::{Domain, ParameterStore};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub parameters: ParameterStore,
    #[serde(default)]
    pub processes: ProcessSection,
    #[serde(default)]
    pub cells: Vec<CellConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub name: String,
    /// State-vector order.
    pub tracers: Vec<String>,
    /// Domains with the mass-balance audit switched on.
    #[serde(default)]
    pub mass_balance: Vec<Domain>,
    /// Cell-cache variables supplied per cell by the host.
    #[serde(default)]
    pub cell_inputs: Vec<String>,
    #[serde(default)]
    pub model_values: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSection {
    #[serde(default)]
    pub water_column: Vec<String>,
    #[serde(default)]
    pub sediment: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellConfig {
    pub domain: Domain,
    /// Sediment only.
    #[serde(default)]
    pub porosity: Option<f64>,
    #[serde(default = "default_dz")]
    pub dz: f64,
    #[serde(default)]
    pub state: BTreeMap<String, f64>,
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
}

fn default_dz() -> f64 {
    1.0
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

fn check_identifiers<'a>(what: &str, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for name in names {
        if !is_identifier(name) {
            return Err(ConfigError::InvalidData(format!(
                "{what} '{name}' is not a valid identifier"
            )));
        }
    }
    Ok(())
}

impl RunConfig {
    /// Structural checks that need no process knowledge.
    pub fn validate(&self) -> Result<()> {
        if self.run.name.trim().is_empty() {
            return Err(ConfigError::InvalidData("run name is empty".into()));
        }
        check_identifiers("tracer", self.run.tracers.iter().map(String::as_str))?;
        check_identifiers("cell input", self.run.cell_inputs.iter().map(String::as_str))?;
        check_identifiers("model value", self.run.model_values.keys().map(String::as_str))?;
        check_identifiers("parameter", self.parameters.iter().map(|(k, _)| k))?;
        check_identifiers(
            "process",
            self.processes
                .water_column
                .iter()
                .chain(&self.processes.sediment)
                .map(String::as_str),
        )?;

        for (i, cell) in self.cells.iter().enumerate() {
            if !(cell.dz.is_finite() && cell.dz > 0.0) {
                return Err(ConfigError::InvalidData(format!(
                    "cell {i}: dz must be positive, got {}",
                    cell.dz
                )));
            }
            match (cell.domain, cell.porosity) {
                (Domain::WaterColumn, Some(p)) if p != 1.0 => {
                    return Err(ConfigError::InvalidData(format!(
                        "cell {i}: water-column cells have porosity 1, got {p}"
                    )));
                }
                (Domain::Sediment, None) => {
                    return Err(ConfigError::InvalidData(format!(
                        "cell {i}: sediment cells need a porosity"
                    )));
                }
                (Domain::Sediment, Some(p)) if !(p > 0.0 && p <= 1.0) => {
                    return Err(ConfigError::InvalidData(format!(
                        "cell {i}: porosity must be in (0, 1], got {p}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
