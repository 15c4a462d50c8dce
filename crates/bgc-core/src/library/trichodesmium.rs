//! Linear mortality of Trichodesmium.
//!
//! Structural nitrogen goes to `DetPL_N`; each reserve returns to its own
//! dissolved pool. Respiring the energy reserve consumes oxygen where there
//! is oxygen, and otherwise accumulates chemical oxygen demand (`COD`).

use tracing::info;

use crate::balance::ElementalContent;
use crate::cell::{CellContext, CellView, Rates};
use crate::constants::{C_O_W, ENERGY_RESERVE_TO_C, RED_W_C, RED_W_P, SEC_PER_DAY};
use crate::error::Result;
use crate::numerics::{floor_zero, guard_divisor, partition};
use crate::process::{Domain, LateSetup, Process, SetupContext};
use crate::registry::{CellVar, Slot, Tracer};

#[derive(Debug, Clone, PartialEq)]
pub struct TrichodesmiumMortality {
    id: &'static str,
    domain: Domain,
    ml_t0: f64,
    /// Oxygen half-saturation of aerobic respiration
    ko_aer: f64,
    n: Slot<Tracer>,
    nr: Slot<Tracer>,
    i: Slot<Tracer>,
    pr: Slot<Tracer>,
    chl: Slot<Tracer>,
    nh4: Slot<Tracer>,
    dic: Slot<Tracer>,
    dip: Slot<Tracer>,
    det_pl_n: Slot<Tracer>,
    oxygen: Slot<Tracer>,
    cod: Option<Slot<Tracer>>,
    nh4_pr: Option<Slot<Tracer>>,
    ml: Slot<CellVar>,
    tfactor: Option<Slot<CellVar>>,
}

impl TrichodesmiumMortality {
    pub fn setup_wc(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        let ml_t0 = ctx.params.require("Tricho_mL")?;
        Self::setup(ctx, "trichodesmium_mortality_wc", ml_t0)
    }

    /// Falls back to the water-column rate when no sediment rate is given.
    pub fn setup_sed(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        let ml_t0 = match ctx.params.lookup_optional("Tricho_mL_sed") {
            Some(v) => v,
            None => {
                let v = ctx.params.require("Tricho_mL")?;
                info!(Tricho_mL = v, "Tricho_mL_sed not set, using Tricho_mL");
                v
            }
        };
        Self::setup(ctx, "trichodesmium_mortality_sed", ml_t0)
    }

    fn setup(ctx: &mut SetupContext<'_>, id: &'static str, ml_t0: f64) -> Result<Box<dyn Process>> {
        let reg = &mut *ctx.registry;
        Ok(Box::new(Self {
            id,
            domain: ctx.domain,
            ml_t0,
            ko_aer: ctx.params.require("KO_aer")?,
            n: reg.tracer("Tricho_N")?,
            nr: reg.tracer("Tricho_NR")?,
            i: reg.tracer("Tricho_I")?,
            pr: reg.tracer("Tricho_PR")?,
            chl: reg.tracer("Tricho_Chl")?,
            nh4: reg.tracer("NH4")?,
            dic: reg.tracer("DIC")?,
            dip: reg.tracer("DIP")?,
            det_pl_n: reg.tracer("DetPL_N")?,
            oxygen: reg.tracer("Oxygen")?,
            cod: reg.try_tracer("COD"),
            nh4_pr: reg.try_tracer("NH4_pr"),
            ml: reg.cell_var("Tricho_mL"),
            tfactor: None,
        }))
    }
}

impl Process for TrichodesmiumMortality {
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
        let structural = floor_zero(cell.value(self.n)) * ml;
        let n_reserve = floor_zero(cell.value(self.nr)) * ml;
        let energy = floor_zero(cell.value(self.i)) * ml;
        let p_reserve = floor_zero(cell.value(self.pr)) * ml;
        let chl = floor_zero(cell.value(self.chl)) * ml;

        let (porosity, pr_scale) = match self.domain {
            Domain::WaterColumn => (1.0, SEC_PER_DAY),
            Domain::Sediment => {
                let p = guard_divisor(cell.porosity());
                (p, SEC_PER_DAY * cell.dz() * p)
            }
        };

        rates.sub(self.n, structural);
        rates.sub(self.nr, n_reserve);
        rates.sub(self.i, energy);
        rates.sub(self.pr, p_reserve);
        rates.sub(self.chl, chl);

        rates.add(self.det_pl_n, structural);
        rates.add(self.nh4, n_reserve / porosity);
        rates.add(self.dip, p_reserve / porosity);

        let carbon = energy * ENERGY_RESERVE_TO_C;
        rates.add(self.dic, carbon / porosity);

        let split = partition(cell.value(self.oxygen), self.ko_aer);
        let demand = carbon * C_O_W / porosity;
        rates.sub(self.oxygen, demand * split.aerobic);
        rates.add_optional(self.cod, demand * split.anaerobic);
        rates.add_optional(self.nh4_pr, n_reserve * pr_scale);
    }

    fn mass_content(&self, cell: &CellView<'_>) -> Option<ElementalContent> {
        let n = cell.value(self.n);
        let carbon = n * RED_W_C + cell.value(self.i) * ENERGY_RESERVE_TO_C;
        Some(ElementalContent::new(
            n + cell.value(self.nr),
            n * RED_W_P + cell.value(self.pr),
            carbon,
            carbon * C_O_W,
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

    const TRACERS: [&str; 10] = [
        "Tricho_N",
        "Tricho_NR",
        "Tricho_I",
        "Tricho_PR",
        "Tricho_Chl",
        "NH4",
        "DIC",
        "DIP",
        "DetPL_N",
        "Oxygen",
    ];

    fn params() -> ParameterStore {
        ParameterStore::new()
            .with("Tricho_mL", 0.1)
            .with("KO_aer", 256.0)
    }

    fn build(domain: Domain, reg: &mut NameRegistry, params: &ParameterStore) -> Result<Box<dyn Process>> {
        let mut ctx = SetupContext {
            registry: &mut *reg,
            params,
            domain,
        };
        let mut p = match domain {
            Domain::WaterColumn => TrichodesmiumMortality::setup_wc(&mut ctx)?,
            Domain::Sediment => TrichodesmiumMortality::setup_sed(&mut ctx)?,
        };
        let ids = [p.id()];
        p.post_setup(&LateSetup::new(reg, params, domain, false, &ids))?;
        Ok(p)
    }

    fn evaluate(p: &dyn Process, cell: &mut Cell) {
        let model = ModelCache::default();
        let mut ctx = cell.context(&model);
        p.precalc(&mut ctx);
        let (view, mut rates) = ctx.split();
        p.calc(&view, &mut rates);
    }

    fn cell_for(reg: &NameRegistry, geometry: CellGeometry, domain: Domain) -> Cell {
        Cell::new(
            domain,
            geometry,
            reg.len(Namespace::Tracer),
            reg.len(Namespace::CellCache),
        )
    }

    #[test]
    fn test_energy_reserve_respiration_is_partitioned() {
        let mut with_cod = TRACERS.to_vec();
        with_cod.push("COD");
        let mut reg = NameRegistry::with_tracers(with_cod);
        let p = build(Domain::WaterColumn, &mut reg, &params()).unwrap();
        let mut cell = cell_for(&reg, CellGeometry::default(), Domain::WaterColumn);
        cell.set_value(reg.tracer("Tricho_I").unwrap(), 100.0);
        cell.set_value(reg.tracer("Oxygen").unwrap(), 256.0);
        evaluate(p.as_ref(), &mut cell);

        let carbon = 10.0 * ENERGY_RESERVE_TO_C;
        assert_relative_eq!(cell.rate(reg.tracer("DIC").unwrap()), carbon);
        assert_relative_eq!(cell.rate(reg.tracer("Oxygen").unwrap()), -carbon * C_O_W * 0.5);
        assert_relative_eq!(cell.rate(reg.tracer("COD").unwrap()), carbon * C_O_W * 0.5);
    }

    #[test]
    fn test_optional_tracers_absent_are_untouched() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg, &params()).unwrap();
        let mut cell = cell_for(&reg, CellGeometry::default(), Domain::WaterColumn);
        cell.state.fill(1.0);
        evaluate(p.as_ref(), &mut cell);
        // every entry written belongs to a declared tracer; nothing panics
        assert_eq!(cell.derivative.len(), TRACERS.len());
        assert!(cell.derivative.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn test_sed_uses_sediment_rate_when_present() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let params = params().with("Tricho_mL_sed", 0.3);
        let p = build(Domain::Sediment, &mut reg, &params).unwrap();
        let mut cell = cell_for(&reg, CellGeometry::sediment(0.5, 0.01), Domain::Sediment);
        let n = reg.tracer("Tricho_N").unwrap();
        cell.set_value(n, 1.0);
        evaluate(p.as_ref(), &mut cell);
        assert_relative_eq!(cell.rate(n), -0.3);
    }

    #[test]
    fn test_sed_falls_back_to_water_column_rate() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::Sediment, &mut reg, &params()).unwrap();
        let mut cell = cell_for(&reg, CellGeometry::sediment(0.5, 0.01), Domain::Sediment);
        let nr = reg.tracer("Tricho_NR").unwrap();
        cell.set_value(nr, 1.0);
        evaluate(p.as_ref(), &mut cell);
        assert_relative_eq!(cell.rate(nr), -0.1);
        assert_relative_eq!(cell.rate(reg.tracer("NH4").unwrap()), 0.2);
    }

    #[test]
    fn test_sed_without_any_rate_is_missing_parameter() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let params = ParameterStore::new().with("KO_aer", 1.0);
        let err = build(Domain::Sediment, &mut reg, &params).err().unwrap();
        assert_eq!(err, SetupError::MissingParameter("Tricho_mL".into()));
    }

    #[test]
    fn test_mortality_cache_is_not_shared_with_dinoflagellates() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg, &params()).unwrap();
        assert!(reg.try_cell_var("PD_mL").is_none());
        assert_eq!(p.cache_writes(), vec![reg.require_cell_var("Tricho_mL").unwrap()]);
    }

    #[test]
    fn test_mass_content_includes_oxygen_demand() {
        let mut reg = NameRegistry::with_tracers(TRACERS);
        let p = build(Domain::WaterColumn, &mut reg, &params()).unwrap();
        let mut cell = cell_for(&reg, CellGeometry::default(), Domain::WaterColumn);
        cell.set_value(reg.tracer("Tricho_N").unwrap(), 2.0);
        cell.set_value(reg.tracer("Tricho_I").unwrap(), 10.0);
        let model = ModelCache::default();
        let ctx = cell.context(&model);
        let c = p.mass_content(&ctx.view()).unwrap();
        let carbon = 2.0 * RED_W_C + 10.0 * ENERGY_RESERVE_TO_C;
        assert_relative_eq!(c.carbon, carbon);
        assert_relative_eq!(c.oxygen_demand, carbon * C_O_W);
    }
}
