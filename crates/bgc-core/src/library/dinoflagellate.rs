//! Linear mortality of dinoflagellates.
//!
//! Structural nitrogen goes to labile plant detritus. The nutrient reserve
//! is remineralised to `NH4` and `DIP`. Light reserve `PhyD_I` is lost
//! without a carbon sink.

use crate::balance::ElementalContent;
use crate::cell::{CellContext, CellView, Rates};
use crate::constants::{RED_W_C, RED_W_P, SEC_PER_DAY};
use crate::error::Result;
use crate::numerics::{floor_zero, guard_divisor};
use crate::process::{Domain, LateSetup, Process, SetupContext};
use crate::registry::{CellVar, Slot, Tracer};

#[derive(Debug, Clone, PartialEq)]
pub struct DinoflagellateMortality {
    id: &'static str,
    domain: Domain,
    /// Mortality rate at the reference temperature [s⁻¹]
    ml_t0: f64,
    phy_n: Slot<Tracer>,
    phy_nr: Slot<Tracer>,
    phy_i: Slot<Tracer>,
    nh4: Slot<Tracer>,
    nh4_pr: Slot<Tracer>,
    dip: Slot<Tracer>,
    det_pl_n: Slot<Tracer>,
    ml: Slot<CellVar>,
    tfactor: Option<Slot<CellVar>>,
}

impl DinoflagellateMortality {
    pub fn setup_wc(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        Self::setup(ctx, "dinoflagellate_diel_mortality_wc")
    }

    pub fn setup_sed(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        Self::setup(ctx, "dinoflagellate_diel_mortality_sed")
    }

    fn setup(ctx: &mut SetupContext<'_>, id: &'static str) -> Result<Box<dyn Process>> {
        let reg = &mut *ctx.registry;
        Ok(Box::new(Self {
            id,
            domain: ctx.domain,
            ml_t0: ctx.params.require("PD_mL")?,
            phy_n: reg.tracer("PhyD_N")?,
            phy_nr: reg.tracer("PhyD_NR")?,
            phy_i: reg.tracer("PhyD_I")?,
            nh4: reg.tracer("NH4")?,
            nh4_pr: reg.tracer("NH4_pr")?,
            dip: reg.tracer("DIP")?,
            det_pl_n: reg.tracer("DetPL_N")?,
            ml: reg.cell_var("PD_mL"),
            tfactor: None,
        }))
    }
}

impl Process for DinoflagellateMortality {
    fn id(&self) -> &'static str {
        self.id
    }

    fn post_setup(&mut self, late: &LateSetup<'_>) -> Result<()> {
        self.tfactor = late.cache_source("Tfactor", "tfactor");
        Ok(())
    }

    fn cache_reads(&self) -> Vec<Slot<CellVar>> {
        self.tfactor.into_iter().collect()
    }

    fn cache_writes(&self) -> Vec<Slot<CellVar>> {
        vec![self.ml]
    }

    fn precalc(&self, cell: &mut CellContext<'_>) {
        let tf = cell.cache_or(self.tfactor, 1.0);
        cell.set_cache(self.ml, self.ml_t0 * tf);
    }

    fn calc(&self, cell: &CellView<'_>, rates: &mut Rates<'_>) {
        let ml = cell.cache(self.ml);
        let structural = floor_zero(cell.value(self.phy_n)) * ml;
        let reserve = floor_zero(cell.value(self.phy_nr)) * ml;
        let light = floor_zero(cell.value(self.phy_i)) * ml;

        let (porosity, pr_scale) = match self.domain {
            Domain::WaterColumn => (1.0, SEC_PER_DAY),
            Domain::Sediment => {
                let p = guard_divisor(cell.porosity());
                (p, SEC_PER_DAY * cell.dz() * p)
            }
        };

        rates.sub(self.phy_n, structural);
        rates.sub(self.phy_nr, reserve);
        rates.sub(self.phy_i, light);
        rates.add(self.det_pl_n, structural);
        rates.add(self.nh4, reserve / porosity);
        rates.add(self.dip, reserve * RED_W_P / porosity);
        rates.add(self.nh4_pr, reserve * pr_scale);
    }

    fn mass_content(&self, cell: &CellView<'_>) -> Option<ElementalContent> {
        let n = cell.value(self.phy_n);
        let nr = cell.value(self.phy_nr);
        Some(ElementalContent::new(
            n + nr,
            (n + nr) * RED_W_P,
            n * RED_W_C,
            0.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellGeometry, ModelCache};
    use crate::error::SetupError;
    use crate::params::ParameterStore;
    use crate::registry::{NameRegistry, Namespace};
    use approx::assert_relative_eq;

    const TRACERS: [&str; 7] = [
        "PhyD_N", "PhyD_NR", "PhyD_I", "NH4", "NH4_pr", "DIP", "DetPL_N",
    ];

    fn build(domain: Domain, reg: &mut NameRegistry) -> Box<dyn Process> {
        let params = ParameterStore::new().with("PD_mL", 0.1);
        let mut ctx = SetupContext {
            registry: &mut *reg,
            params: &params,
            domain,
        };
        let mut p = match domain {
            Domain::WaterColumn => DinoflagellateMortality::setup_wc(&mut ctx),
            Domain::Sediment => DinoflagellateMortality::setup_sed(&mut ctx),
        }
        .unwrap();
        let ids = [p.id()];
        p.post_setup(&LateSetup::new(reg, &params, domain, false, &ids))
            .unwrap();
        p
    }

    fn run(p: &dyn Process, cell: &mut Cell) {
        let model = ModelCache::default();
        let mut ctx = cell.context(&model);
        p.precalc(&mut ctx);
        let (view, mut rates) = ctx.split();
        p.calc(&view, &mut rates);
    }

    #[test]
    fn test_wc_mortality_routes_structural_to_detritus() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg);
        let mut cell = Cell::new(
            Domain::WaterColumn,
            CellGeometry::default(),
            reg.len(Namespace::Tracer),
            reg.len(Namespace::CellCache),
        );
        let n = reg.tracer("PhyD_N").unwrap();
        let nr = reg.tracer("PhyD_NR").unwrap();
        cell.set_value(n, 5.0);
        cell.set_value(nr, 2.0);
        run(p.as_ref(), &mut cell);

        assert_relative_eq!(cell.rate(n), -0.5);
        assert_relative_eq!(cell.rate(reg.tracer("DetPL_N").unwrap()), 0.5);
        assert_relative_eq!(cell.rate(nr), -0.2);
        assert_relative_eq!(cell.rate(reg.tracer("NH4").unwrap()), 0.2);
        assert_relative_eq!(cell.rate(reg.tracer("DIP").unwrap()), 0.2 * RED_W_P);
        assert_relative_eq!(cell.rate(reg.tracer("NH4_pr").unwrap()), 0.2 * SEC_PER_DAY);
    }

    #[test]
    fn test_sed_divides_by_porosity() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::Sediment, &mut reg);
        let mut cell = Cell::new(
            Domain::Sediment,
            CellGeometry::sediment(0.5, 0.01),
            reg.len(Namespace::Tracer),
            reg.len(Namespace::CellCache),
        );
        let nr = reg.tracer("PhyD_NR").unwrap();
        cell.set_value(nr, 2.0);
        run(p.as_ref(), &mut cell);

        assert_relative_eq!(cell.rate(reg.tracer("NH4").unwrap()), 0.4);
        assert_relative_eq!(
            cell.rate(reg.tracer("NH4_pr").unwrap()),
            0.2 * SEC_PER_DAY * 0.01 * 0.5
        );
    }

    #[test]
    fn test_negative_biomass_is_clamped() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg);
        let mut cell = Cell::new(Domain::WaterColumn, CellGeometry::default(), 7, 1);
        let n = reg.tracer("PhyD_N").unwrap();
        cell.set_value(n, -3.0);
        run(p.as_ref(), &mut cell);
        assert_eq!(cell.rate(n), 0.0);
        assert_eq!(cell.rate(reg.tracer("DetPL_N").unwrap()), 0.0);
    }

    #[test]
    fn test_missing_tracer_fails_setup() {
        let mut reg = NameRegistry::with_tracers(["PhyD_N", "PhyD_NR"]);
        let params = ParameterStore::new().with("PD_mL", 0.1);
        let err = DinoflagellateMortality::setup_wc(&mut SetupContext {
            registry: &mut reg,
            params: &params,
            domain: Domain::WaterColumn,
        })
        .err()
        .unwrap();
        assert!(matches!(err, SetupError::UnknownIdentifier { ref name, .. } if name == "PhyD_I"));
    }

    #[test]
    fn test_mass_content() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg);
        let mut cell = Cell::new(Domain::WaterColumn, CellGeometry::default(), 7, 1);
        cell.set_value(reg.tracer("PhyD_N").unwrap(), 10.0);
        cell.set_value(reg.tracer("PhyD_NR").unwrap(), 2.0);
        let model = ModelCache::default();
        let ctx = cell.context(&model);
        let content = p.mass_content(&ctx.view()).unwrap();
        assert_relative_eq!(content.nitrogen, 12.0);
        assert_relative_eq!(content.phosphorus, 12.0 * RED_W_P);
        assert_relative_eq!(content.carbon, 10.0 * RED_W_C);
    }
}
