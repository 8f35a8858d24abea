//! # Callback Contract
//!
//! The four extension points through which every side effect of the engine
//! is injected:
//!
//! - [`EventHandler`] - receives each dispatched record (delivery)
//! - [`EventFilter`] - decides at push time whether a record is queued
//! - [`LogSink`] - receives internal diagnostics when logging is enabled
//! - [`StateObserver`] - notified after each actual lifecycle transition
//!
//! All four are optional, supplied once through [`Callbacks`], and invoked
//! synchronously on the thread that called the triggering engine operation.
//!
//! # Failure containment
//!
//! Handler and filter failures, whether an `Err` return or a panic, are
//! caught at the boundary by [`guard`] and never unwind into the engine. A
//! failed handler still counts as delivered (at-most-once, no retry). A
//! failed filter allows the record (fail open).
//!
//! # Closures
//!
//! Each trait has a blanket implementation for closures. Handler closures may
//! return `()` or `Result<(), E>`; filter closures may return `bool` or
//! `Result<bool, E>`:
//!
//! ```rust,ignore
//! let callbacks = Callbacks::new()
//!     .with_handler(|record: &EventRecord| println!("{}", record.kind()))
//!     .with_filter(|record: &EventRecord| record.source() != "blocked");
//! ```

use crate::{
    error::{BoxError, CallbackError},
    record::EventRecord,
    state::LifecycleState,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
};

// ============================================================================
// Log levels
// ============================================================================

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-record chatter (queued, filtered, dispatching).
    Debug,
    /// Lifecycle and batch summaries.
    Info,
    /// Rejections and gated dispatch.
    Warn,
    /// Contained callback failures.
    Error,
}

impl LogLevel {
    /// Upper-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Parse a level name as sent by a foreign host.
    ///
    /// Unrecognized names map to [`LogLevel::Info`] so the message is still
    /// delivered.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => LogLevel::Debug,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for LogLevel {
    fn from(name: &str) -> Self {
        LogLevel::parse(name)
    }
}

// ============================================================================
// Outcome conversions
// ============================================================================

/// Conversion of a handler's return value into a delivery outcome.
///
/// # Default Implementations
///
/// - `()` → delivered
/// - `Result<(), E>` → delivered, or a failure to be logged
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid event handler return type",
    label = "handlers must return `()` or `Result<(), E>`"
)]
pub trait IntoOutcome {
    /// Convert into the engine's outcome type.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Conversion of a filter's return value into an allow/drop verdict.
///
/// # Default Implementations
///
/// - `bool` → `true` = allow
/// - `Result<bool, E>` → verdict, or a failure (which allows)
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid event filter return type",
    label = "filters must return `bool` or `Result<bool, E>`"
)]
pub trait IntoVerdict {
    /// Convert into the engine's verdict type.
    fn into_verdict(self) -> Result<bool, BoxError>;
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Result<bool, BoxError> {
        Ok(self)
    }
}

impl<E: Into<BoxError>> IntoVerdict for Result<bool, E> {
    fn into_verdict(self) -> Result<bool, BoxError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Extension point traits
// ============================================================================

/// Receives every dispatched record.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `EventHandler`",
    label = "missing `EventHandler` implementation",
    note = "closures must take `&EventRecord` and return `()` or `Result<(), E>`"
)]
pub trait EventHandler: Send + Sync + 'static {
    /// Deliver one record. An `Err` is logged; the record is not retried.
    fn on_event(&self, record: &EventRecord) -> Result<(), BoxError>;
}

impl<F, R> EventHandler for F
where
    F: Fn(&EventRecord) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn on_event(&self, record: &EventRecord) -> Result<(), BoxError> {
        self(record).into_outcome()
    }
}

/// Decides whether a pushed record is queued.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `EventFilter`",
    label = "missing `EventFilter` implementation",
    note = "closures must take `&EventRecord` and return `bool` or `Result<bool, E>`"
)]
pub trait EventFilter: Send + Sync + 'static {
    /// `Ok(false)` silently drops the record. An `Err` allows it.
    fn allow(&self, record: &EventRecord) -> Result<bool, BoxError>;
}

impl<F, R> EventFilter for F
where
    F: Fn(&EventRecord) -> R + Send + Sync + 'static,
    R: IntoVerdict,
{
    fn allow(&self, record: &EventRecord) -> Result<bool, BoxError> {
        self(record).into_verdict()
    }
}

/// Receives engine diagnostics.
pub trait LogSink: Send + Sync + 'static {
    /// Handle one diagnostic line.
    fn on_log(&self, level: LogLevel, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    fn on_log(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

/// Notified after every actual lifecycle transition.
pub trait StateObserver: Send + Sync + 'static {
    /// Called with the previous and the (already applied) new state.
    fn on_state_change(&self, old: LifecycleState, new: LifecycleState);
}

impl<F> StateObserver for F
where
    F: Fn(LifecycleState, LifecycleState) + Send + Sync + 'static,
{
    fn on_state_change(&self, old: LifecycleState, new: LifecycleState) {
        self(old, new)
    }
}

// ============================================================================
// Callback set
// ============================================================================

/// The optional set of callbacks an engine is created with.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_event: Option<Box<dyn EventHandler>>,
    pub(crate) on_filter: Option<Box<dyn EventFilter>>,
    pub(crate) on_log: Option<Box<dyn LogSink>>,
    pub(crate) on_state_change: Option<Box<dyn StateObserver>>,
}

impl Callbacks {
    /// An empty set: records are allowed, dispatched to nobody, and nothing
    /// is logged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event handler.
    pub fn with_handler<H: EventHandler>(mut self, handler: H) -> Self {
        self.on_event = Some(Box::new(handler));
        self
    }

    /// Set the push-time filter.
    pub fn with_filter<F: EventFilter>(mut self, filter: F) -> Self {
        self.on_filter = Some(Box::new(filter));
        self
    }

    /// Set the diagnostic sink.
    pub fn with_log<L: LogSink>(mut self, sink: L) -> Self {
        self.on_log = Some(Box::new(sink));
        self
    }

    /// Set the lifecycle observer.
    pub fn with_state_observer<S: StateObserver>(mut self, observer: S) -> Self {
        self.on_state_change = Some(Box::new(observer));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_event", &self.on_event.is_some())
            .field("on_filter", &self.on_filter.is_some())
            .field("on_log", &self.on_log.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

/// Run a callback, converting both `Err` returns and panics into a
/// [`CallbackError`].
pub fn guard<T>(f: impl FnOnce() -> Result<T, BoxError>) -> Result<T, CallbackError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CallbackError::Failed(err)),
        Err(payload) => Err(CallbackError::from_panic(payload)),
    }
}
