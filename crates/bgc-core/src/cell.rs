//! Per-cell evaluation context.
//!
//! A cell evaluation sees four arrays: the current state (tracers), the
//! derivative being accumulated, the per-cell cache, and the shared
//! per-model cache. [`CellContext`] borrows them for one pass; processes
//! get narrower views depending on the lifecycle step they are in.

use serde::{Deserialize, Serialize};

use crate::process::Domain;
use crate::registry::{CellVar, ModelVar, NameRegistry, Namespace, Slot, Tracer};

/// Physical constants of a spatial unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    /// Pore-water fraction of the cell volume (1 in the water column).
    pub porosity: f64,
    /// Layer thickness [m]
    pub dz: f64,
}

impl CellGeometry {
    pub fn water_column(dz: f64) -> Self {
        Self { porosity: 1.0, dz }
    }

    pub fn sediment(porosity: f64, dz: f64) -> Self {
        Self { porosity, dz }
    }
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self::water_column(1.0)
    }
}

/// Run-wide values. Written once while the engine is built, shared
/// read-only by every cell afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelCache {
    values: Vec<f64>,
}

impl ModelCache {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn for_registry(registry: &NameRegistry) -> Self {
        Self::new(registry.len(Namespace::ModelCache))
    }

    pub fn get(&self, slot: Slot<ModelVar>) -> f64 {
        self.values[slot.index()]
    }

    pub fn set(&mut self, slot: Slot<ModelVar>, value: f64) {
        self.values[slot.index()] = value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Owned buffers for one spatial unit, for hosts that don't bring their own.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub domain: Domain,
    pub geometry: CellGeometry,
    pub state: Vec<f64>,
    pub derivative: Vec<f64>,
    pub cache: Vec<f64>,
}

impl Cell {
    pub fn new(domain: Domain, geometry: CellGeometry, n_tracers: usize, n_cache: usize) -> Self {
        Self {
            domain,
            geometry,
            state: vec![0.0; n_tracers],
            derivative: vec![0.0; n_tracers],
            cache: vec![0.0; n_cache],
        }
    }

    pub fn value(&self, slot: Slot<Tracer>) -> f64 {
        self.state[slot.index()]
    }

    pub fn set_value(&mut self, slot: Slot<Tracer>, value: f64) {
        self.state[slot.index()] = value;
    }

    pub fn rate(&self, slot: Slot<Tracer>) -> f64 {
        self.derivative[slot.index()]
    }

    pub fn cached(&self, slot: Slot<CellVar>) -> f64 {
        self.cache[slot.index()]
    }

    /// Host-supplied cache input (e.g. viscosity from a physics model).
    pub fn set_input(&mut self, slot: Slot<CellVar>, value: f64) {
        self.cache[slot.index()] = value;
    }

    /// Zero the derivative before a fresh evaluation.
    pub fn clear_derivative(&mut self) {
        self.derivative.fill(0.0);
    }

    pub fn context<'a>(&'a mut self, model: &'a ModelCache) -> CellContext<'a> {
        CellContext {
            geometry: self.geometry,
            state: &mut self.state,
            derivative: &mut self.derivative,
            cache: &mut self.cache,
            model,
        }
    }
}

/// Borrowed buffers for one evaluation pass.
///
/// The state vector is only written by the mass-balance auditor (total
/// tracers); processes read it through [`CellView`].
pub struct CellContext<'a> {
    geometry: CellGeometry,
    state: &'a mut [f64],
    derivative: &'a mut [f64],
    cache: &'a mut [f64],
    model: &'a ModelCache,
}

impl<'a> CellContext<'a> {
    pub fn new(
        geometry: CellGeometry,
        state: &'a mut [f64],
        derivative: &'a mut [f64],
        cache: &'a mut [f64],
        model: &'a ModelCache,
    ) -> Self {
        debug_assert_eq!(state.len(), derivative.len());
        Self {
            geometry,
            state,
            derivative,
            cache,
            model,
        }
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn value(&self, slot: Slot<Tracer>) -> f64 {
        self.state[slot.index()]
    }

    pub fn state(&self) -> &[f64] {
        &*self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut [f64] {
        &mut *self.state
    }

    pub fn derivative(&self) -> &[f64] {
        &*self.derivative
    }

    pub fn cache(&self, slot: Slot<CellVar>) -> f64 {
        self.cache[slot.index()]
    }

    /// Optional cache input, e.g. `Tfactor` when temperature scaling is off.
    pub fn cache_or(&self, slot: Option<Slot<CellVar>>, fallback: f64) -> f64 {
        slot.map_or(fallback, |s| self.cache[s.index()])
    }

    pub fn set_cache(&mut self, slot: Slot<CellVar>, value: f64) {
        self.cache[slot.index()] = value;
    }

    pub fn model(&self, slot: Slot<ModelVar>) -> f64 {
        self.model.get(slot)
    }

    pub fn view(&self) -> CellView<'_> {
        CellView {
            geometry: &self.geometry,
            state: &*self.state,
            cache: &*self.cache,
            model: self.model,
        }
    }

    /// Read-only inputs plus the add-only derivative, for the hot path.
    pub fn split(&mut self) -> (CellView<'_>, Rates<'_>) {
        (
            CellView {
                geometry: &self.geometry,
                state: &*self.state,
                cache: &*self.cache,
                model: self.model,
            },
            Rates {
                derivative: &mut *self.derivative,
            },
        )
    }
}

/// Read-only view of a cell.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    geometry: &'a CellGeometry,
    state: &'a [f64],
    cache: &'a [f64],
    model: &'a ModelCache,
}

impl<'a> CellView<'a> {
    pub fn value(&self, slot: Slot<Tracer>) -> f64 {
        self.state[slot.index()]
    }

    /// Value of an optional tracer, 0 when not configured.
    pub fn value_or_zero(&self, slot: Option<Slot<Tracer>>) -> f64 {
        slot.map_or(0.0, |s| self.state[s.index()])
    }

    pub fn cache(&self, slot: Slot<CellVar>) -> f64 {
        self.cache[slot.index()]
    }

    pub fn cache_or(&self, slot: Option<Slot<CellVar>>, fallback: f64) -> f64 {
        slot.map_or(fallback, |s| self.cache[s.index()])
    }

    pub fn model(&self, slot: Slot<ModelVar>) -> f64 {
        self.model.get(slot)
    }

    pub fn geometry(&self) -> &CellGeometry {
        self.geometry
    }

    pub fn porosity(&self) -> f64 {
        self.geometry.porosity
    }

    pub fn dz(&self) -> f64 {
        self.geometry.dz
    }
}

/// Add-only access to the derivative vector.
pub struct Rates<'a> {
    derivative: &'a mut [f64],
}

impl<'a> Rates<'a> {
    pub fn new(derivative: &'a mut [f64]) -> Self {
        Self { derivative }
    }

    #[inline]
    pub fn add(&mut self, slot: Slot<Tracer>, rate: f64) {
        debug_assert!(rate.is_finite(), "non-finite rate {rate} for {slot:?}");
        self.derivative[slot.index()] += rate;
    }

    #[inline]
    pub fn sub(&mut self, slot: Slot<Tracer>, rate: f64) {
        self.add(slot, -rate);
    }

    /// Writes only when the tracer was configured for this run.
    #[inline]
    pub fn add_optional(&mut self, slot: Option<Slot<Tracer>>, rate: f64) {
        if let Some(slot) = slot {
            self.add(slot, rate);
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &*self.derivative
    }
}
