//! Derivative composition engine for biogeochemical models.
//!
//! Independent process modules (growth, mortality, grazing, ...) each
//! contribute signed rates to a shared derivative vector of tracer
//! concentrations. Names are resolved to dense indices once at setup;
//! per-cell evaluation is allocation-free and never fails. An optional
//! mass-balance audit brackets every evaluation with elemental totals.
//!
//! Zero I/O. Configuration loading lives in `bgc-config`.

pub mod balance;
pub mod cell;
pub mod constants;
pub mod engine;
pub mod error;
pub mod library;
pub mod numerics;
pub mod params;
pub mod process;
pub mod registry;
pub mod sequencer;

pub use balance::{Auditor, BalanceTotals, CellAudit, ElementalContent};
pub use cell::{Cell, CellContext, CellGeometry, CellView, ModelCache, Rates};
pub use constants::{EPSILON, MASS_BALANCE_SED, MASS_BALANCE_WC, SEC_PER_DAY};
pub use engine::{Engine, EngineSpec};
pub use error::{Result, SetupError};
pub use numerics::{Partition, partition};
pub use params::{ParamValue, ParameterStore};
pub use process::{
    Domain, LateSetup, Process, ProcessCatalog, ProcessEntry, ProcessFactory, SetupContext,
};
pub use registry::{CellVar, ModelVar, NameRegistry, Namespace, Slot, SlotKind, Tracer};
pub use sequencer::{Sequencer, mass_balance_flag};
