//! Assembled run: registry, parameters, both domain sequencers and the
//! model cache.
//!
//! Built once, then shared read-only across cells. Evaluation of distinct
//! cells touches no shared mutable state, so `evaluate_cells` fans out over
//! rayon's pool.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::balance::CellAudit;
use crate::cell::{Cell, CellGeometry, ModelCache};
use crate::error::{Result, SetupError};
use crate::params::ParameterStore;
use crate::process::{Domain, ProcessCatalog};
use crate::registry::{NameRegistry, Namespace};
use crate::sequencer::{Sequencer, mass_balance_flag};

/// Host-side description of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSpec {
    /// Tracer names in state-vector order.
    pub tracers: Vec<String>,
    pub parameters: ParameterStore,
    /// Water-column process ids, in evaluation order.
    pub water_column: Vec<String>,
    /// Sediment process ids, in evaluation order.
    pub sediment: Vec<String>,
    /// Cell-cache variables the host fills before evaluation.
    pub cell_inputs: Vec<String>,
    pub model_values: BTreeMap<String, f64>,
}

impl EngineSpec {
    /// Switch the mass-balance audit on for `domain`.
    pub fn enable_mass_balance(&mut self, domain: Domain) {
        self.model_values
            .insert(mass_balance_flag(domain).to_string(), 1.0);
    }

    pub fn processes(&self, domain: Domain) -> &[String] {
        match domain {
            Domain::WaterColumn => &self.water_column,
            Domain::Sediment => &self.sediment,
        }
    }
}

pub struct Engine {
    registry: NameRegistry,
    params: ParameterStore,
    water_column: Sequencer,
    sediment: Sequencer,
    model: ModelCache,
}

impl Engine {
    /// Setup of both domains, then late setup of both, then the model cache.
    pub fn build(spec: EngineSpec, catalog: &ProcessCatalog) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = spec.tracers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(SetupError::invalid(format!("tracer '{dup}' declared twice")));
        }

        let mut registry = NameRegistry::with_tracers(&spec.tracers);
        for name in &spec.cell_inputs {
            registry.cell_var(name);
        }
        for name in spec.model_values.keys() {
            registry.model_var(name);
        }

        let params = spec.parameters;
        let mut water_column = Sequencer::setup(
            Domain::WaterColumn,
            spec.water_column.as_slice(),
            catalog,
            &mut registry,
            &params,
        )?;
        let mut sediment = Sequencer::setup(
            Domain::Sediment,
            spec.sediment.as_slice(),
            catalog,
            &mut registry,
            &params,
        )?;
        water_column.late_setup(&registry, &params, &spec.cell_inputs)?;
        sediment.late_setup(&registry, &params, &spec.cell_inputs)?;

        let mut model = ModelCache::for_registry(&registry);
        for (name, value) in &spec.model_values {
            if let Some(slot) = registry.try_model_var(name) {
                model.set(slot, *value);
            }
        }

        info!(
            tracers = registry.len(Namespace::Tracer),
            cell_vars = registry.len(Namespace::CellCache),
            model_vars = registry.len(Namespace::ModelCache),
            "engine built"
        );
        Ok(Self {
            registry,
            params,
            water_column,
            sediment,
            model,
        })
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn model_cache(&self) -> &ModelCache {
        &self.model
    }

    pub fn sequencer(&self, domain: Domain) -> &Sequencer {
        match domain {
            Domain::WaterColumn => &self.water_column,
            Domain::Sediment => &self.sediment,
        }
    }

    /// Zeroed cell sized for this run.
    pub fn new_cell(&self, domain: Domain, geometry: CellGeometry) -> Cell {
        Cell::new(
            domain,
            geometry,
            self.registry.len(Namespace::Tracer),
            self.registry.len(Namespace::CellCache),
        )
    }

    /// Recompute the derivative of `cell` from its current state.
    pub fn evaluate(&self, cell: &mut Cell) -> Option<CellAudit> {
        debug_assert_eq!(cell.state.len(), self.registry.len(Namespace::Tracer));
        debug_assert_eq!(cell.cache.len(), self.registry.len(Namespace::CellCache));
        cell.clear_derivative();
        let sequencer = self.sequencer(cell.domain);
        sequencer.evaluate(&mut cell.context(&self.model))
    }

    /// Evaluate independent cells in parallel. Results follow input order.
    pub fn evaluate_cells(&self, cells: &mut [Cell]) -> Vec<Option<CellAudit>> {
        cells.par_iter_mut().map(|cell| self.evaluate(cell)).collect()
    }

    pub fn teardown(self) {
        self.water_column.teardown();
        self.sediment.teardown();
        info!("engine torn down");
    }
}
