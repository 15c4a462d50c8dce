//! Mass-balance audit.
//!
//! Participating processes report the elemental content of the pools they
//! own. Before accumulation and again after it, every report is added onto
//! the running total tracers (`TN`, `TP`, `TC`, optionally `BOD`). The
//! totals are never reset here; whatever the host left in them is kept.
//! Each half's contribution is also returned, and a process whose post-pass
//! report differs from its pre-pass report shows up as a gap between them.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::{CellContext, CellView};
use crate::error::Result;
use crate::registry::{NameRegistry, Slot, Tracer};

/// Elemental content of a set of pools, in tracer units
/// (mg N, mg P, mg C, mg O₂ demand per unit volume).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementalContent {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub carbon: f64,
    pub oxygen_demand: f64,
}

/// Content one bracket half added onto the total tracers.
pub type BalanceTotals = ElementalContent;

impl ElementalContent {
    pub const ZERO: Self = Self {
        nitrogen: 0.0,
        phosphorus: 0.0,
        carbon: 0.0,
        oxygen_demand: 0.0,
    };

    pub fn new(nitrogen: f64, phosphorus: f64, carbon: f64, oxygen_demand: f64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            carbon,
            oxygen_demand,
        }
    }

    pub fn max_abs(&self) -> f64 {
        self.nitrogen
            .abs()
            .max(self.phosphorus.abs())
            .max(self.carbon.abs())
            .max(self.oxygen_demand.abs())
    }
}

impl Add for ElementalContent {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            nitrogen: self.nitrogen + rhs.nitrogen,
            phosphorus: self.phosphorus + rhs.phosphorus,
            carbon: self.carbon + rhs.carbon,
            oxygen_demand: self.oxygen_demand + rhs.oxygen_demand,
        }
    }
}

impl AddAssign for ElementalContent {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for ElementalContent {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            nitrogen: self.nitrogen - rhs.nitrogen,
            phosphorus: self.phosphorus - rhs.phosphorus,
            carbon: self.carbon - rhs.carbon,
            oxygen_demand: self.oxygen_demand - rhs.oxygen_demand,
        }
    }
}

/// What the pre-pass and the post-pass of one cell evaluation added.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellAudit {
    pub before: BalanceTotals,
    pub after: BalanceTotals,
}

impl CellAudit {
    pub fn discrepancy(&self) -> ElementalContent {
        self.after - self.before
    }

    /// Within `tolerance`, relative to the larger total when it exceeds 1.
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        let scale = self.before.max_abs().max(self.after.max_abs()).max(1.0);
        self.discrepancy().max_abs() <= tolerance * scale
    }
}

/// Total tracers written by the audit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Auditor {
    tn: Slot<Tracer>,
    tp: Slot<Tracer>,
    tc: Slot<Tracer>,
    bod: Option<Slot<Tracer>>,
}

impl Auditor {
    /// `TN`, `TP` and `TC` are mandatory once the audit is switched on.
    pub fn resolve(registry: &NameRegistry) -> Result<Self> {
        let auditor = Self {
            tn: registry.tracer("TN")?,
            tp: registry.tracer("TP")?,
            tc: registry.tracer("TC")?,
            bod: registry.try_tracer("BOD"),
        };
        debug!(bod = auditor.bod.is_some(), "mass-balance totals resolved");
        Ok(auditor)
    }

    pub fn deposit(&self, cell: &mut CellContext<'_>, content: ElementalContent) {
        let state = cell.state_mut();
        state[self.tn.index()] += content.nitrogen;
        state[self.tp.index()] += content.phosphorus;
        state[self.tc.index()] += content.carbon;
        if let Some(bod) = self.bod {
            state[bod.index()] += content.oxygen_demand;
        }
    }

    /// Current running totals, host seed included.
    pub fn totals(&self, cell: &CellView<'_>) -> ElementalContent {
        ElementalContent {
            nitrogen: cell.value(self.tn),
            phosphorus: cell.value(self.tp),
            carbon: cell.value(self.tc),
            oxygen_demand: cell.value_or_zero(self.bod),
        }
    }
}
