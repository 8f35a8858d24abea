//! Handle registry for hosts that cannot hold Rust references.
//!
//! A foreign host (a garbage-collected runtime, a C caller, a callback
//! trampoline) gets an [`EngineId`] instead of a pointer. Ids are issued by
//! the registry from a monotonically increasing counter and are never
//! reused, so a stale id resolves to nothing rather than to whichever engine
//! happens to occupy the same address later.

use crate::shared::SharedEngine;
use std::{
    collections::HashMap,
    fmt,
    num::NonZeroU64,
    sync::{
        Arc, OnceLock, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;

/// An opaque, registry-issued engine identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(NonZeroU64);

impl EngineId {
    /// The raw value, for storage in a host-side context slot.
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }

    /// Rebuild an id from a raw value. `0` is never issued and yields `None`.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Errors from resolving an id.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Nothing is registered under this raw id.
    #[error("no live engine registered under id {0}")]
    Unknown(u64),
}

/// A map from [`EngineId`] to live engines.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::new();
/// let id = registry.insert(SharedEngine::new(config)?);
///
/// // Later, from a callback trampoline that only has the raw id:
/// let engine = registry.resolve_raw(context as u64)?;
/// engine.push(EventKind::Data, "host", payload)?;
///
/// registry.remove(id); // closes the engine
/// ```
pub struct Registry {
    engines: RwLock<HashMap<EngineId, Arc<SharedEngine>>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register an engine and issue its id.
    pub fn insert(&self, engine: impl Into<Arc<SharedEngine>>) -> EngineId {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 inserts to wrap.
        let id = EngineId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MAX));
        let engine = engine.into();
        tracing::debug!(%id, engine = %engine.name(), "engine registered");
        self.engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, engine);
        id
    }

    /// The engine registered under `id`, if still live.
    pub fn get(&self, id: EngineId) -> Option<Arc<SharedEngine>> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Resolve a raw id received from a host.
    pub fn resolve_raw(&self, raw: u64) -> Result<Arc<SharedEngine>, RegistryError> {
        EngineId::from_raw(raw)
            .and_then(|id| self.get(id))
            .ok_or(RegistryError::Unknown(raw))
    }

    /// Unregister and close the engine under `id`.
    ///
    /// Callers still holding an `Arc` keep a closed engine: every operation on
    /// it reports `Closed`.
    pub fn remove(&self, id: EngineId) -> Option<Arc<SharedEngine>> {
        let removed = self
            .engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(engine) = &removed {
            engine.close();
            tracing::debug!(%id, engine = %engine.name(), "engine unregistered");
        }
        removed
    }

    /// Unregister and close every engine. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self
            .engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (_, engine) in &drained {
            engine.close();
        }
        drained.len()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no engines are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("engines", &self.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evstage_core::{EngineConfig, EngineError, EventKind};

    fn engine(name: &str) -> SharedEngine {
        SharedEngine::new(EngineConfig::new(name)).unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_nonzero() {
        let registry = Registry::new();
        let a = registry.insert(engine("a"));
        let b = registry.insert(engine("b"));
        assert_ne!(a, b);
        assert_ne!(a.as_raw(), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_round_trip() {
        let registry = Registry::new();
        let id = registry.insert(engine("a"));
        let resolved = registry.resolve_raw(id.as_raw()).unwrap();
        assert_eq!(resolved.name(), "a");
        assert_eq!(registry.get(id).unwrap().name(), "a");
    }

    #[test]
    fn test_zero_and_unknown_ids() {
        let registry = Registry::new();
        assert!(EngineId::from_raw(0).is_none());
        assert_eq!(registry.resolve_raw(0).unwrap_err(), RegistryError::Unknown(0));
        assert_eq!(registry.resolve_raw(99).unwrap_err(), RegistryError::Unknown(99));
    }

    #[test]
    fn test_removed_id_never_resolves_to_new_engine() {
        let registry = Registry::new();
        let old = registry.insert(engine("old"));
        let held = registry.remove(old).unwrap();
        let new = registry.insert(engine("new"));

        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert!(held.is_closed());
        assert_eq!(held.push(EventKind::Data, "s", &[]), Err(EngineError::Closed));
        assert_eq!(registry.get(new).unwrap().name(), "new");
    }

    #[test]
    fn test_close_all() {
        let registry = Registry::new();
        let a = registry.insert(engine("a"));
        let held = registry.get(a).unwrap();
        registry.insert(engine("b"));

        assert_eq!(registry.close_all(), 2);
        assert!(registry.is_empty());
        assert!(held.is_closed());
    }

    #[test]
    fn test_global_is_shared() {
        let id = Registry::global().insert(engine("global"));
        assert!(Registry::global().get(id).is_some());
        Registry::global().remove(id);
        assert!(Registry::global().get(id).is_none());
    }
}
