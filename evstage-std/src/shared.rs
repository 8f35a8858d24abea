//! # Shared Engine
//!
//! A thread-safe facade over the single-threaded [`Engine`].
//!
//! `SharedEngine` wraps the engine in a `RwLock<Option<Engine>>`:
//!
//! - **Writers** (`push`, `process`, `process_all`, `start`, `stop`,
//!   `clear_queue`, `close`) take the write lock, one at a time.
//! - **Readers** (`state`, `queue_size`, `events_processed`, `is_closed`)
//!   take the read lock and may run concurrently with each other, never with
//!   a writer and never with `close`.
//!
//! `close` takes the engine out of the lock and drops it while still holding
//! the write lock, so no operation can observe a half-destroyed engine.
//! Every later call sees `None` and fails fast with
//! [`EngineError::Closed`] or returns a zero value.
//!
//! # Re-entrancy
//!
//! Callbacks run while the write lock is held. A callback must not call back
//! into the same `SharedEngine`; that deadlocks. A slow handler blocks every
//! other caller for its duration.

use evstage_core::{ConfigError, Engine, EngineConfig, EngineError, EventKind, LifecycleState};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A `Send + Sync` engine handle, typically held in an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Arc::new(SharedEngine::new(EngineConfig::new("api"))?);
///
/// let producer = engine.clone();
/// std::thread::spawn(move || producer.push(EventKind::Data, "sensor", b"42"));
///
/// engine.start()?;
/// engine.process_all()?;
/// engine.close();
/// ```
#[derive(Debug)]
pub struct SharedEngine {
    name: String,
    capacity: Option<usize>,
    inner: RwLock<Option<Engine>>,
}

impl SharedEngine {
    /// Validate `config` and wrap the resulting engine.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Engine::new(config).map(Self::from_engine)
    }

    /// Wrap an existing engine.
    pub fn from_engine(engine: Engine) -> Self {
        Self {
            name: engine.name().to_string(),
            capacity: engine.capacity(),
            inner: RwLock::new(Some(engine)),
        }
    }

    // ------------------------------------------------------------------------
    // Writers
    // ------------------------------------------------------------------------

    /// See [`Engine::push`].
    pub fn push(&self, kind: EventKind, source: &str, payload: &[u8]) -> Result<(), EngineError> {
        self.with_engine_mut(|engine| engine.push(kind, source, payload))?
    }

    /// See [`Engine::process`].
    pub fn process(&self) -> Result<bool, EngineError> {
        self.with_engine_mut(Engine::process)
    }

    /// See [`Engine::process_all`].
    pub fn process_all(&self) -> Result<usize, EngineError> {
        self.with_engine_mut(Engine::process_all)
    }

    /// See [`Engine::clear_queue`].
    pub fn clear_queue(&self) -> Result<usize, EngineError> {
        self.with_engine_mut(Engine::clear_queue)
    }

    /// See [`Engine::start`].
    pub fn start(&self) -> Result<(), EngineError> {
        self.with_engine_mut(Engine::start)
    }

    /// See [`Engine::stop`].
    pub fn stop(&self) -> Result<(), EngineError> {
        self.with_engine_mut(Engine::stop)
    }

    /// Destroy the engine, discarding queued records without dispatch.
    ///
    /// Idempotent: returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let mut guard = self.write();
        match guard.take() {
            Some(engine) => {
                drop(engine);
                drop(guard);
                tracing::debug!(engine = %self.name, "engine closed");
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------------

    /// Current lifecycle state, or `None` once closed.
    pub fn state(&self) -> Option<LifecycleState> {
        self.read().as_ref().map(Engine::state)
    }

    /// Queued record count; `0` once closed.
    pub fn queue_size(&self) -> usize {
        self.read().as_ref().map_or(0, Engine::queue_size)
    }

    /// Dispatched record count; `0` once closed.
    pub fn events_processed(&self) -> u64 {
        self.read().as_ref().map_or(0, Engine::events_processed)
    }

    /// Whether [`SharedEngine::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.read().is_none()
    }

    /// The engine name. Available after close.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured maximum queue size. Available after close.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    // ------------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------------

    fn with_engine_mut<T>(&self, f: impl FnOnce(&mut Engine) -> T) -> Result<T, EngineError> {
        let mut guard = self.write();
        let engine = guard.as_mut().ok_or(EngineError::Closed)?;
        Ok(f(engine))
    }

    // The engine contains every callback panic, so a poisoned lock still
    // guards a consistent engine.
    fn write(&self) -> RwLockWriteGuard<'_, Option<Engine>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Engine>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::from_engine(engine)
    }
}
