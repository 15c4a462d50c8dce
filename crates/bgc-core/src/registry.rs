//! Name → slot resolution for tracers and cache variables.
//!
//! Three namespaces live side by side: state tracers, per-cell cache
//! variables, and per-model cache variables. Each maps names to dense
//! indices that never change once handed out. Typed [`Slot`] handles carry
//! their namespace in the type, so a tracer index cannot address a cache
//! array.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Tracer,
    CellCache,
    ModelCache,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Tracer => "tracer",
            Namespace::CellCache => "cell cache variable",
            Namespace::ModelCache => "model cache variable",
        };
        f.write_str(s)
    }
}

/// Marker for state-vector slots.
#[derive(Debug)]
pub enum Tracer {}

/// Marker for per-cell cache slots.
#[derive(Debug)]
pub enum CellVar {}

/// Marker for per-model cache slots.
#[derive(Debug)]
pub enum ModelVar {}

/// Ties a slot marker to its namespace.
pub trait SlotKind {
    const NAMESPACE: Namespace;
}

impl SlotKind for Tracer {
    const NAMESPACE: Namespace = Namespace::Tracer;
}

impl SlotKind for CellVar {
    const NAMESPACE: Namespace = Namespace::CellCache;
}

impl SlotKind for ModelVar {
    const NAMESPACE: Namespace = Namespace::ModelCache;
}

/// A resolved index into one namespace.
pub struct Slot<K> {
    index: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Slot<K> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _kind: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

impl<K> Clone for Slot<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Slot<K> {}

impl<K> PartialEq for Slot<K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<K> Eq for Slot<K> {}

impl<K> Hash for Slot<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<K: SlotKind> fmt::Debug for Slot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot<{}>({})", K::NAMESPACE, self.index)
    }
}

/// Dense name table for a single namespace.
#[derive(Debug, Clone, Default)]
struct NameTable {
    index: HashMap<String, usize>,
    names: Vec<String>,
}

impl NameTable {
    fn register(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    tracers: NameTable,
    cell: NameTable,
    model: NameTable,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose tracer namespace follows the declared order.
    /// Duplicate names collapse onto their first index.
    pub fn with_tracers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(Namespace::Tracer, name.as_ref());
        }
        registry
    }

    fn table(&self, namespace: Namespace) -> &NameTable {
        match namespace {
            Namespace::Tracer => &self.tracers,
            Namespace::CellCache => &self.cell,
            Namespace::ModelCache => &self.model,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut NameTable {
        match namespace {
            Namespace::Tracer => &mut self.tracers,
            Namespace::CellCache => &mut self.cell,
            Namespace::ModelCache => &mut self.model,
        }
    }

    /// Find-or-create. Never fails.
    pub fn register(&mut self, namespace: Namespace, name: &str) -> usize {
        self.table_mut(namespace).register(name)
    }

    pub fn require(&self, namespace: Namespace, name: &str) -> Result<usize> {
        self.lookup_optional(namespace, name)
            .ok_or_else(|| SetupError::UnknownIdentifier {
                namespace,
                name: name.to_string(),
            })
    }

    /// Absent names stay absent: this never allocates a slot.
    pub fn lookup_optional(&self, namespace: Namespace, name: &str) -> Option<usize> {
        self.table(namespace).get(name)
    }

    pub fn len(&self, namespace: Namespace) -> usize {
        self.table(namespace).names.len()
    }

    pub fn name_of(&self, namespace: Namespace, index: usize) -> Option<&str> {
        self.table(namespace).names.get(index).map(String::as_str)
    }

    pub fn names(&self, namespace: Namespace) -> &[String] {
        &self.table(namespace).names
    }

    // --- Typed access ---

    pub fn slot<K: SlotKind>(&self, name: &str) -> Result<Slot<K>> {
        self.require(K::NAMESPACE, name).map(Slot::new)
    }

    pub fn try_slot<K: SlotKind>(&self, name: &str) -> Option<Slot<K>> {
        self.lookup_optional(K::NAMESPACE, name).map(Slot::new)
    }

    pub fn slot_or_add<K: SlotKind>(&mut self, name: &str) -> Slot<K> {
        Slot::new(self.register(K::NAMESPACE, name))
    }

    pub fn slot_name<K: SlotKind>(&self, slot: Slot<K>) -> &str {
        self.name_of(K::NAMESPACE, slot.index()).unwrap_or("?")
    }

    pub fn tracer(&self, name: &str) -> Result<Slot<Tracer>> {
        self.slot(name)
    }

    pub fn try_tracer(&self, name: &str) -> Option<Slot<Tracer>> {
        self.try_slot(name)
    }

    /// Find-or-create a per-cell cache slot.
    pub fn cell_var(&mut self, name: &str) -> Slot<CellVar> {
        self.slot_or_add(name)
    }

    pub fn require_cell_var(&self, name: &str) -> Result<Slot<CellVar>> {
        self.slot(name)
    }

    pub fn try_cell_var(&self, name: &str) -> Option<Slot<CellVar>> {
        self.try_slot(name)
    }

    /// Find-or-create a per-model cache slot.
    pub fn model_var(&mut self, name: &str) -> Slot<ModelVar> {
        self.slot_or_add(name)
    }

    pub fn try_model_var(&self, name: &str) -> Option<Slot<ModelVar>> {
        self.try_slot(name)
    }
}
