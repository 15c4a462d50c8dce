//! JSON export of evaluated cells.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bgc_core::{Cell, CellAudit, Domain, Engine, Namespace};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    pub index: usize,
    pub domain: Domain,
    /// Nonzero derivative entries keyed by tracer name.
    pub derivative: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<CellAudit>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run: String,
    pub cells: Vec<CellReport>,
}

impl EvaluationReport {
    pub fn new(run: &str, engine: &Engine, cells: &[Cell], audits: &[Option<CellAudit>]) -> Self {
        let registry = engine.registry();
        let cells = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| CellReport {
                index,
                domain: cell.domain,
                derivative: cell
                    .derivative
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| **d != 0.0)
                    .filter_map(|(i, d)| {
                        registry
                            .name_of(Namespace::Tracer, i)
                            .map(|name| (name.to_string(), *d))
                    })
                    .collect(),
                audit: audits.get(index).copied().flatten(),
            })
            .collect();
        Self {
            run: run.to_string(),
            cells,
        }
    }

    /// Indices of audited cells whose totals disagree beyond `tolerance`.
    pub fn imbalanced(&self, tolerance: f64) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|c| c.audit.is_some_and(|a| !a.is_balanced(tolerance)))
            .map(|c| c.index)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
