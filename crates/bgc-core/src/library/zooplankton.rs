//! Large zooplankton grazing in the water column.
//!
//! Ingestion is the lesser of the physiological maximum and the rate at
//! which prey are encountered. Prey are large phytoplankton, benthic
//! microalgae resuspended into the water column, and, when dinoflagellates
//! are modelled, dinoflagellates.

use tracing::info;

use crate::balance::ElementalContent;
use crate::cell::{CellContext, CellView, Rates};
use crate::constants::{
    C_O_W, MG_N_TO_MOL_N, RED_A_C, RED_A_N, RED_W_C, RED_W_P, SEC_PER_DAY, WATER_DENSITY,
    ZOO_CARBON_DENSITY,
};
use crate::error::{Result, SetupError};
use crate::numerics::{floor_zero, guard_divisor, monod};
use crate::process::{LateSetup, Process, SetupContext};
use crate::registry::{CellVar, Namespace, Slot, Tracer};

use super::encounter::{EncounterMethod, Fluid, Particle, encounter_rate};

/// Growth process that makes `PhyD_N`/`PhyD_C` evolve. Grazing on
/// dinoflagellates is only switched on when it is configured.
pub const DINOFLAGELLATE_GROWTH: &str = "dinoflagellate_grow_wc";

/// Carbon-equivalent mass of one zooplankton cell of `radius` [m], in
/// Redfield phosphorus units [mol P cell⁻¹].
pub fn zoo_cell_mass(radius: f64) -> f64 {
    4.0 / 3.0 * std::f64::consts::PI * radius.powi(3) * ZOO_CARBON_DENSITY / RED_A_C
}

/// Dinoflagellate prey pools. Both tracers exist or neither is grazed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DinoflagellatePrey {
    pub n: Slot<Tracer>,
    pub c: Slot<Tracer>,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LargeZooplanktonGrazing {
    umax_t0: f64,
    radius: f64,
    method: EncounterMethod,
    swim_t0: f64,
    tke_eps: f64,
    pl_radius: f64,
    mb_radius: f64,
    /// Cell mass [mol P cell⁻¹]
    m: f64,
    /// Assimilation efficiency
    e: f64,
    /// Fraction of unassimilated food egested as detritus
    fdg: f64,
    ko_aer: f64,

    zoo_n: Slot<Tracer>,
    phy_l_n: Slot<Tracer>,
    mpb_n: Slot<Tracer>,
    nh4: Slot<Tracer>,
    det_pl_n: Slot<Tracer>,
    dic: Slot<Tracer>,
    oxygen: Slot<Tracer>,
    dip: Slot<Tracer>,
    temp: Slot<Tracer>,
    zoo_n_gr: Slot<Tracer>,
    zoo_n_rm: Slot<Tracer>,
    nh4_pr: Slot<Tracer>,
    oxy_pr: Slot<Tracer>,
    dinoflagellates: Option<DinoflagellatePrey>,

    tfactor: Option<Slot<CellVar>>,
    viscosity: Option<Slot<CellVar>>,
    umax: Slot<CellVar>,
    phi_mb: Slot<CellVar>,
    phi_pl: Slot<CellVar>,
    phi_df: Slot<CellVar>,
}

impl LargeZooplanktonGrazing {
    pub fn setup(ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        let params = ctx.params;
        let reg = &mut *ctx.registry;

        let radius = params.require("ZLrad")?;
        let method: EncounterMethod = params.require_text("ZLmeth")?.parse()?;
        let m = params
            .lookup_optional("ZLm")
            .unwrap_or_else(|| zoo_cell_mass(radius));
        let e = params.require("ZL_E")?;
        if m <= 0.0 || e <= 0.0 {
            return Err(SetupError::invalid(format!(
                "zooplankton_large_grow_wc needs positive cell mass and ZL_E (m = {m}, ZL_E = {e})"
            )));
        }

        let dinoflagellates = match (reg.try_tracer("PhyD_N"), reg.try_tracer("PhyD_C")) {
            (Some(n), Some(c)) => Some(DinoflagellatePrey {
                n,
                c,
                radius: params.require("DFrad")?,
            }),
            _ => None,
        };

        Ok(Box::new(Self {
            umax_t0: params.require("ZLumax")?,
            radius,
            method,
            swim_t0: params.require("ZLswim")?,
            tke_eps: params.require("TKEeps")?,
            pl_radius: params.require("PLrad")?,
            mb_radius: params.require("MBrad")?,
            m,
            e,
            fdg: params.require("ZL_FDG")?,
            ko_aer: params.require("KO_aer")?,

            zoo_n: reg.tracer("ZooL_N")?,
            phy_l_n: reg.tracer("PhyL_N")?,
            mpb_n: reg.tracer("MPB_N")?,
            nh4: reg.tracer("NH4")?,
            det_pl_n: reg.tracer("DetPL_N")?,
            dic: reg.tracer("DIC")?,
            oxygen: reg.tracer("Oxygen")?,
            dip: reg.tracer("DIP")?,
            temp: reg.tracer("temp")?,
            zoo_n_gr: reg.tracer("ZooL_N_gr")?,
            zoo_n_rm: reg.tracer("ZooL_N_rm")?,
            nh4_pr: reg.tracer("NH4_pr")?,
            oxy_pr: reg.tracer("Oxy_pr")?,
            dinoflagellates,

            tfactor: None,
            viscosity: None,
            umax: reg.cell_var("ZLumax"),
            phi_mb: reg.cell_var("phi_MB_ZL"),
            phi_pl: reg.cell_var("phi_PL_ZL"),
            phi_df: reg.cell_var("phi_DF_ZL"),
        }))
    }

    pub fn grazes_dinoflagellates(&self) -> bool {
        self.dinoflagellates.is_some()
    }
}

impl Process for LargeZooplanktonGrazing {
    fn id(&self) -> &'static str {
        "zooplankton_large_grow_wc"
    }

    fn post_setup(&mut self, late: &LateSetup<'_>) -> Result<()> {
        self.tfactor = late.cache_source("Tfactor", "tfactor");
        let viscosity = late.cache_source("viscosity", "viscosity").ok_or_else(|| {
            SetupError::UnknownIdentifier {
                namespace: Namespace::CellCache,
                name: "viscosity".into(),
            }
        })?;
        self.viscosity = Some(viscosity);
        if self.dinoflagellates.is_some() && !late.process_present(DINOFLAGELLATE_GROWTH) {
            self.dinoflagellates = None;
        }
        info!(
            dinoflagellates = self.dinoflagellates.is_some(),
            "zooplankton_large_grow_wc prey resolved"
        );
        Ok(())
    }

    fn cache_reads(&self) -> Vec<Slot<CellVar>> {
        self.tfactor.into_iter().chain(self.viscosity).collect()
    }

    fn cache_writes(&self) -> Vec<Slot<CellVar>> {
        vec![self.umax, self.phi_mb, self.phi_pl, self.phi_df]
    }

    fn precalc(&self, cell: &mut CellContext<'_>) {
        let tf = cell.cache_or(self.tfactor, 1.0);
        let fluid = Fluid {
            dissipation: self.tke_eps,
            viscosity: cell.cache_or(self.viscosity, 0.0),
            density: WATER_DENSITY,
            temperature: cell.value(self.temp),
        };
        let predator = Particle::swimmer(self.radius, self.swim_t0 * tf);
        let phi = |prey_radius: f64| {
            encounter_rate(
                self.method,
                &Particle::phytoplankton(prey_radius),
                &predator,
                &fluid,
            )
        };

        cell.set_cache(self.umax, self.umax_t0 * tf);
        cell.set_cache(self.phi_pl, phi(self.pl_radius));
        cell.set_cache(self.phi_mb, phi(self.mb_radius));
        let phi_df = self.dinoflagellates.map_or(0.0, |df| phi(df.radius));
        cell.set_cache(self.phi_df, phi_df);
    }

    fn calc(&self, cell: &CellView<'_>, rates: &mut Rates<'_>) {
        let zoo = floor_zero(cell.value(self.zoo_n));
        let phy_l = floor_zero(cell.value(self.phy_l_n));
        let mpb = floor_zero(cell.value(self.mpb_n));
        let (df_n, df_c) = match self.dinoflagellates {
            Some(df) => (floor_zero(cell.value(df.n)), floor_zero(cell.value(df.c))),
            None => (0.0, 0.0),
        };

        let phi_pl = cell.cache(self.phi_pl);
        let phi_mb = cell.cache(self.phi_mb);
        let phi_df = cell.cache(self.phi_df);

        let cells = zoo * MG_N_TO_MOL_N / self.m / RED_A_N;
        let max_enc = phy_l * phi_pl + mpb * phi_mb + df_n * phi_df;
        let max_ing = cell.cache(self.umax) * self.m * RED_A_N / MG_N_TO_MOL_N / self.e;
        let graze = cells * max_ing.min(max_enc);
        let enc = if graze > 0.0 { max_enc } else { 1.0 };

        let unassimilated = graze * (1.0 - self.e);
        let nh4_release = unassimilated * (1.0 - self.fdg);
        let growth = graze * self.e;

        let mut dic_release = nh4_release * RED_W_C;
        if let Some(df) = self.dinoflagellates {
            let df_graze = graze * df_n * phi_df / enc;
            let c_to_n = df_c / guard_divisor(df_n);
            dic_release += df_graze * (c_to_n - RED_W_C);
            rates.sub(df.n, df_graze);
            rates.sub(df.c, df_graze * c_to_n);
        }
        let oxy_pr = -dic_release * C_O_W * monod(cell.value(self.oxygen), self.ko_aer);

        rates.add(self.zoo_n, growth);
        rates.sub(self.phy_l_n, graze * phy_l * phi_pl / enc);
        rates.sub(self.mpb_n, graze * mpb * phi_mb / enc);
        rates.add(self.nh4, nh4_release);
        rates.add(self.dip, nh4_release * RED_W_P);
        rates.add(self.dic, dic_release);
        rates.add(self.oxygen, oxy_pr);
        rates.add(self.det_pl_n, unassimilated * self.fdg);

        rates.add(self.oxy_pr, oxy_pr * SEC_PER_DAY);
        rates.add(self.nh4_pr, nh4_release * SEC_PER_DAY);
        rates.add(self.zoo_n_rm, graze * RED_W_C * SEC_PER_DAY);
        rates.add(self.zoo_n_gr, growth * SEC_PER_DAY);
    }

    fn mass_content(&self, cell: &CellView<'_>) -> Option<ElementalContent> {
        let n = cell.value(self.zoo_n);
        Some(ElementalContent::new(n, n * RED_W_P, n * RED_W_C, 0.0))
    }
}
