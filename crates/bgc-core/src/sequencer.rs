//! Ordered dispatch of the process lifecycle for one domain.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::balance::{Auditor, BalanceTotals, CellAudit};
use crate::cell::CellContext;
use crate::constants::{MASS_BALANCE_SED, MASS_BALANCE_WC};
use crate::error::{Result, SetupError};
use crate::params::ParameterStore;
use crate::process::{Domain, LateSetup, Process, ProcessCatalog, SetupContext};
use crate::registry::{NameRegistry, Namespace};

/// Model-cache flag whose presence switches the audit on for `domain`.
pub fn mass_balance_flag(domain: Domain) -> &'static str {
    match domain {
        Domain::WaterColumn => MASS_BALANCE_WC,
        Domain::Sediment => MASS_BALANCE_SED,
    }
}

/// Processes of one domain, in configured order.
///
/// Within a cell the order matters: a process may read cell-cache values
/// written by an earlier process in the same pre-pass. `late_setup`
/// rejects configurations where a reader precedes its writer.
pub struct Sequencer {
    domain: Domain,
    processes: Vec<Box<dyn Process>>,
    auditor: Option<Auditor>,
}

impl Sequencer {
    /// Setup phase: build every configured process in order.
    pub fn setup<S: AsRef<str>>(
        domain: Domain,
        ids: &[S],
        catalog: &ProcessCatalog,
        registry: &mut NameRegistry,
        params: &ParameterStore,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut processes = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                return Err(SetupError::invalid(format!(
                    "process '{id}' configured twice in the {domain} domain"
                )));
            }
            let mut ctx = SetupContext {
                registry: &mut *registry,
                params,
                domain,
            };
            processes.push(catalog.build(id, &mut ctx)?);
            debug!(%domain, process = id, "process set up");
        }
        Ok(Self {
            domain,
            processes,
            auditor: None,
        })
    }

    /// Late-setup phase: resolve the audit and cross-module dependencies,
    /// then validate cache ordering. `host_inputs` are the cell-cache
    /// variables the host fills itself.
    pub fn late_setup(
        &mut self,
        registry: &NameRegistry,
        params: &ParameterStore,
        host_inputs: &[String],
    ) -> Result<()> {
        let flag = mass_balance_flag(self.domain);
        let mass_balance = registry
            .lookup_optional(Namespace::ModelCache, flag)
            .is_some();
        self.auditor = if mass_balance {
            Some(Auditor::resolve(registry)?)
        } else {
            None
        };

        let ids: Vec<&'static str> = self.processes.iter().map(|p| p.id()).collect();
        let late = LateSetup::new(registry, params, self.domain, mass_balance, &ids)
            .with_host_inputs(host_inputs);
        for process in &mut self.processes {
            process.post_setup(&late)?;
        }

        self.validate_cache_order(registry)?;
        info!(
            domain = %self.domain,
            processes = self.processes.len(),
            mass_balance,
            "sequencer ready"
        );
        Ok(())
    }

    fn validate_cache_order(&self, registry: &NameRegistry) -> Result<()> {
        for (i, reader) in self.processes.iter().enumerate() {
            let own_writes = reader.cache_writes();
            for slot in reader.cache_reads() {
                let written_before = own_writes.contains(&slot)
                    || self.processes[..i]
                        .iter()
                        .any(|p| p.cache_writes().contains(&slot));
                if written_before {
                    continue;
                }
                if let Some(writer) = self.processes[i + 1..]
                    .iter()
                    .find(|p| p.cache_writes().contains(&slot))
                {
                    return Err(SetupError::invalid(format!(
                        "process '{}' reads cell cache '{}' before '{}' writes it",
                        reader.id(),
                        registry.slot_name(slot),
                        writer.id()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.processes.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn mass_balance(&self) -> bool {
        self.auditor.is_some()
    }

    /// Pre-pass over all processes. Returns what the pass added to the
    /// totals when the audit is on.
    pub fn precalc(&self, cell: &mut CellContext<'_>) -> Option<BalanceTotals> {
        self.bracket(cell, |process, cell| process.precalc(cell))
    }

    /// Derivative accumulation over all processes.
    pub fn calc(&self, cell: &mut CellContext<'_>) {
        let (view, mut rates) = cell.split();
        for process in &self.processes {
            process.calc(&view, &mut rates);
        }
    }

    /// Post-pass over all processes. Returns what the pass added to the
    /// totals when the audit is on.
    pub fn postcalc(&self, cell: &mut CellContext<'_>) -> Option<BalanceTotals> {
        self.bracket(cell, |process, cell| process.postcalc(cell))
    }

    /// Run one bracket half: for each process run its hook, then add its
    /// content onto the running totals.
    fn bracket<F>(&self, cell: &mut CellContext<'_>, hook: F) -> Option<BalanceTotals>
    where
        F: Fn(&dyn Process, &mut CellContext<'_>),
    {
        let Some(auditor) = &self.auditor else {
            for process in &self.processes {
                hook(process.as_ref(), &mut *cell);
            }
            return None;
        };

        let mut added = BalanceTotals::ZERO;
        for process in &self.processes {
            hook(process.as_ref(), &mut *cell);
            let content = process.mass_content(&cell.view());
            if let Some(content) = content {
                auditor.deposit(cell, content);
                added += content;
            }
        }
        Some(added)
    }

    /// One full evaluation of a cell on an unchanged state.
    pub fn evaluate(&self, cell: &mut CellContext<'_>) -> Option<CellAudit> {
        let before = self.precalc(cell);
        self.calc(cell);
        let after = self.postcalc(cell);
        before.zip(after).map(|(before, after)| CellAudit { before, after })
    }

    pub fn teardown(self) {
        for process in self.processes {
            debug!(domain = %self.domain, process = process.id(), "teardown");
            process.teardown();
        }
    }
}
