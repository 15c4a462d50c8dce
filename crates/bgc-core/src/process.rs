//! The process-module contract.
//!
//! A process is built once by its catalogue factory (setup), which resolves
//! every tracer, parameter and cache slot it needs into a private
//! workspace. After all processes of a run exist, `post_setup` resolves
//! anything that depends on other processes. Per cell and per evaluation
//! the sequencer then calls `precalc`, `calc` and `postcalc` in that
//! order, and `teardown` once at the end of the run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::balance::ElementalContent;
use crate::cell::{CellContext, CellView, Rates};
use crate::error::{Result, SetupError};
use crate::params::ParameterStore;
use crate::registry::{CellVar, NameRegistry, Slot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    WaterColumn,
    Sediment,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::WaterColumn, Domain::Sediment];

    pub fn suffix(self) -> &'static str {
        match self {
            Domain::WaterColumn => "wc",
            Domain::Sediment => "sed",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::WaterColumn => f.write_str("water_column"),
            Domain::Sediment => f.write_str("sediment"),
        }
    }
}

/// Everything a factory may touch while building its workspace.
pub struct SetupContext<'a> {
    pub registry: &'a mut NameRegistry,
    pub params: &'a ParameterStore,
    pub domain: Domain,
}

/// Cross-module view handed to `post_setup`.
pub struct LateSetup<'a> {
    pub registry: &'a NameRegistry,
    pub params: &'a ParameterStore,
    pub domain: Domain,
    /// Whether the mass-balance audit is active for this domain.
    pub mass_balance: bool,
    configured: &'a [&'a str],
    host_inputs: &'a [String],
}

impl<'a> LateSetup<'a> {
    pub fn new(
        registry: &'a NameRegistry,
        params: &'a ParameterStore,
        domain: Domain,
        mass_balance: bool,
        configured: &'a [&'a str],
    ) -> Self {
        Self {
            registry,
            params,
            domain,
            mass_balance,
            configured,
            host_inputs: &[],
        }
    }

    /// Cell-cache variables the host fills before evaluation.
    pub fn with_host_inputs(mut self, host_inputs: &'a [String]) -> Self {
        self.host_inputs = host_inputs;
        self
    }

    /// Is process `id` configured in this domain for the run?
    pub fn process_present(&self, id: &str) -> bool {
        self.configured.contains(&id)
    }

    /// Cell-cache slot `name`, if something fills it for cells of this
    /// domain: the `writer` process configured here, or the host.
    ///
    /// Cell-cache names are shared by both domains, so a slot registered
    /// by the other domain's writer is not enough.
    pub fn cache_source(&self, name: &str, writer: &str) -> Option<Slot<CellVar>> {
        if self.process_present(writer) || self.host_inputs.iter().any(|i| i == name) {
            self.registry.try_cell_var(name)
        } else {
            None
        }
    }
}

pub trait Process: Send + Sync {
    /// Catalogue identifier, e.g. `trichodesmium_mortality_sed`.
    fn id(&self) -> &'static str;

    fn post_setup(&mut self, _late: &LateSetup<'_>) -> Result<()> {
        Ok(())
    }

    /// Cell-cache slots read during evaluation that another process may write.
    fn cache_reads(&self) -> Vec<Slot<CellVar>> {
        Vec::new()
    }

    /// Cell-cache slots this process writes in `precalc`.
    fn cache_writes(&self) -> Vec<Slot<CellVar>> {
        Vec::new()
    }

    /// Refresh per-cell cached quantities.
    fn precalc(&self, _cell: &mut CellContext<'_>) {}

    /// Add signed contributions to the derivative. Hot path.
    fn calc(&self, cell: &CellView<'_>, rates: &mut Rates<'_>);

    fn postcalc(&self, _cell: &mut CellContext<'_>) {}

    /// Elemental content of the pools this process owns, for the
    /// mass-balance audit. The same function serves both bracket halves.
    fn mass_content(&self, _cell: &CellView<'_>) -> Option<ElementalContent> {
        None
    }

    fn teardown(self: Box<Self>) {}
}

pub type ProcessFactory = fn(&mut SetupContext<'_>) -> Result<Box<dyn Process>>;

#[derive(Clone, Copy)]
pub struct ProcessEntry {
    pub id: &'static str,
    pub domains: &'static [Domain],
    pub summary: &'static str,
    pub factory: ProcessFactory,
}

impl fmt::Debug for ProcessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessEntry")
            .field("id", &self.id)
            .field("domains", &self.domains)
            .finish()
    }
}

/// Id → factory table. Hosts may add their own entries.
#[derive(Clone, Debug, Default)]
pub struct ProcessCatalog {
    entries: BTreeMap<&'static str, ProcessEntry>,
}

impl ProcessCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones with the same id.
    pub fn register(&mut self, entry: ProcessEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: &str) -> Option<&ProcessEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProcessEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the setup phase of `id` for `ctx.domain`.
    pub fn build(&self, id: &str, ctx: &mut SetupContext<'_>) -> Result<Box<dyn Process>> {
        let entry = self
            .get(id)
            .ok_or_else(|| SetupError::invalid(format!("unknown process '{id}'")))?;
        if !entry.domains.contains(&ctx.domain) {
            return Err(SetupError::invalid(format!(
                "process '{id}' cannot run in the {} domain",
                ctx.domain
            )));
        }
        (entry.factory)(ctx)
    }
}
