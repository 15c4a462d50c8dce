//! Built-in process modules.

pub mod dinoflagellate;
pub mod encounter;
pub mod temperature;
pub mod trichodesmium;
pub mod zooplankton;

use crate::process::{Domain, ProcessCatalog, ProcessEntry};

use dinoflagellate::DinoflagellateMortality;
use temperature::{TemperatureFactor, Viscosity};
use trichodesmium::TrichodesmiumMortality;
use zooplankton::LargeZooplanktonGrazing;

const BOTH: &[Domain] = &Domain::ALL;
const WC: &[Domain] = &[Domain::WaterColumn];
const SED: &[Domain] = &[Domain::Sediment];

const ENTRIES: [ProcessEntry; 7] = [
    ProcessEntry {
        id: "tfactor",
        domains: BOTH,
        summary: "Q10 temperature factor into cell cache Tfactor",
        factory: TemperatureFactor::setup,
    },
    ProcessEntry {
        id: "viscosity",
        domains: BOTH,
        summary: "kinematic viscosity of water into cell cache viscosity",
        factory: Viscosity::setup,
    },
    ProcessEntry {
        id: "dinoflagellate_diel_mortality_wc",
        domains: WC,
        summary: "linear dinoflagellate mortality, water column",
        factory: DinoflagellateMortality::setup_wc,
    },
    ProcessEntry {
        id: "dinoflagellate_diel_mortality_sed",
        domains: SED,
        summary: "linear dinoflagellate mortality, sediment",
        factory: DinoflagellateMortality::setup_sed,
    },
    ProcessEntry {
        id: "trichodesmium_mortality_wc",
        domains: WC,
        summary: "linear Trichodesmium mortality, water column",
        factory: TrichodesmiumMortality::setup_wc,
    },
    ProcessEntry {
        id: "trichodesmium_mortality_sed",
        domains: SED,
        summary: "linear Trichodesmium mortality, sediment",
        factory: TrichodesmiumMortality::setup_sed,
    },
    ProcessEntry {
        id: "zooplankton_large_grow_wc",
        domains: WC,
        summary: "encounter-limited grazing by large zooplankton",
        factory: LargeZooplanktonGrazing::setup,
    },
];

impl ProcessCatalog {
    /// Catalogue holding every built-in process.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for entry in ENTRIES {
            catalog.register(entry);
        }
        catalog
    }
}
