//! From a run description to a built engine and its cells.

use std::fs;
use std::path::Path;

use bgc_core::{Cell, CellGeometry, Domain, Engine, EngineSpec, ProcessCatalog};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::schema::RunConfig;

pub fn from_toml_str(content: &str) -> Result<RunConfig> {
    let config: RunConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_run(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path)?;
    let config = from_toml_str(&content)?;
    debug!(
        path = %path.display(),
        run = %config.run.name,
        cells = config.cells.len(),
        "run description loaded"
    );
    Ok(config)
}

pub fn engine_spec(config: &RunConfig) -> EngineSpec {
    let mut spec = EngineSpec {
        tracers: config.run.tracers.clone(),
        parameters: config.parameters.clone(),
        water_column: config.processes.water_column.clone(),
        sediment: config.processes.sediment.clone(),
        cell_inputs: config.run.cell_inputs.clone(),
        model_values: config.run.model_values.clone(),
    };
    for &domain in &config.run.mass_balance {
        spec.enable_mass_balance(domain);
    }
    spec
}

pub fn build_engine(config: &RunConfig, catalog: &ProcessCatalog) -> Result<Engine> {
    let engine = Engine::build(engine_spec(config), catalog)?;
    info!(run = %config.run.name, "engine ready");
    Ok(engine)
}

/// Materialize the configured cells. Names must be declared tracers or
/// cell inputs of the run.
pub fn build_cells(config: &RunConfig, engine: &Engine) -> Result<Vec<Cell>> {
    let registry = engine.registry();
    let mut cells = Vec::with_capacity(config.cells.len());
    for (i, cfg) in config.cells.iter().enumerate() {
        let geometry = match cfg.domain {
            Domain::WaterColumn => CellGeometry::water_column(cfg.dz),
            Domain::Sediment => CellGeometry::sediment(cfg.porosity.unwrap_or(1.0), cfg.dz),
        };
        let mut cell = engine.new_cell(cfg.domain, geometry);

        for (name, value) in &cfg.state {
            let slot = registry.try_tracer(name).ok_or_else(|| {
                ConfigError::InvalidData(format!("cell {i}: unknown tracer '{name}'"))
            })?;
            cell.set_value(slot, *value);
        }
        for (name, value) in &cfg.inputs {
            if !config.run.cell_inputs.contains(name) {
                return Err(ConfigError::InvalidData(format!(
                    "cell {i}: '{name}' is not a declared cell input"
                )));
            }
            let slot = registry.require_cell_var(name)?;
            cell.set_input(slot, *value);
        }
        cells.push(cell);
    }
    debug!(cells = cells.len(), "cells built");
    Ok(cells)
}
