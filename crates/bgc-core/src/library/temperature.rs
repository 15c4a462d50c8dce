//! Temperature-derived cell-cache quantities shared by other processes.

use crate::cell::{CellContext, CellView, Rates};
use crate::error::Result;
use crate::numerics::{q10_factor, water_viscosity};
use crate::process::{Process, SetupContext};
use crate::registry::{CellVar, Slot, Tracer};

/// Writes `Tfactor = Q10^((temp - Tref)/10)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureFactor {
    q10: f64,
    tref: f64,
    temp: Slot<Tracer>,
    tfactor: Slot<CellVar>,
}

impl TemperatureFactor {
    pub fn setup(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        Ok(Box::new(Self {
            q10: ctx.params.require("Q10")?,
            tref: ctx.params.require("Tref")?,
            temp: ctx.registry.tracer("temp")?,
            tfactor: ctx.registry.cell_var("Tfactor"),
        }))
    }
}

impl Process for TemperatureFactor {
    fn id(&self) -> &'static str {
        "tfactor"
    }

    fn cache_writes(&self) -> Vec<Slot<CellVar>> {
        vec![self.tfactor]
    }

    fn precalc(&self, cell: &mut CellContext<'_>) {
        let t = cell.value(self.temp);
        cell.set_cache(self.tfactor, q10_factor(self.q10, t, self.tref));
    }

    fn calc(&self, _cell: &CellView<'_>, _rates: &mut Rates<'_>) {}
}

/// Writes the kinematic viscosity of water.
#[derive(Debug, Clone, PartialEq)]
pub struct Viscosity {
    temp: Slot<Tracer>,
    viscosity: Slot<CellVar>,
}

impl Viscosity {
    pub fn setup(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        Ok(Box::new(Self {
            temp: ctx.registry.tracer("temp")?,
            viscosity: ctx.registry.cell_var("viscosity"),
        }))
    }
}

impl Process for Viscosity {
    fn id(&self) -> &'static str {
        "viscosity"
    }

    fn cache_writes(&self) -> Vec<Slot<CellVar>> {
        vec![self.viscosity]
    }

    fn precalc(&self, cell: &mut CellContext<'_>) {
        let t = cell.value(self.temp);
        cell.set_cache(self.viscosity, water_viscosity(t));
    }

    fn calc(&self, _cell: &CellView<'_>, _rates: &mut Rates<'_>) {}
}
