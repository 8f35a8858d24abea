//! Testing utilities for evstage.
//!
//! Ready-made callbacks for asserting on engine behavior. Every type is
//! cheaply cloneable and clones share state, so keep one clone in the test
//! and hand the other to the engine.
//!
//! # Features
//!
//! - [`RecordingHandler`]: records every dispatched record
//! - [`CountingHandler`]: counts dispatches without storing them
//! - [`FailingHandler`]: fails every dispatch, by `Err` or by panic
//! - [`ScriptedFilter`]: a filter whose verdict can be flipped mid-test
//! - [`LogCapture`]: collects diagnostics
//! - [`StateRecorder`]: collects lifecycle transitions

use evstage_core::{
    BoxError, EventFilter, EventHandler, EventKind, EventRecord, LifecycleState, LogLevel,
    LogSink, StateObserver,
};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every record it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// let mut engine = EngineConfig::new("t").handler(recorder.clone()).build()?;
///
/// engine.push(EventKind::Data, "s1", b"A")?;
/// engine.start();
/// engine.process_all();
///
/// assert_eq!(recorder.sources(), ["s1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingHandler {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the recorded records, in dispatch order.
    pub fn records(&self) -> Vec<EventRecord> {
        lock(&self.records).clone()
    }

    /// Source tags in dispatch order.
    pub fn sources(&self) -> Vec<String> {
        lock(&self.records)
            .iter()
            .map(|record| record.source().to_string())
            .collect()
    }

    /// Kinds in dispatch order.
    pub fn kinds(&self) -> Vec<EventKind> {
        lock(&self.records).iter().map(EventRecord::kind).collect()
    }

    /// Number of recorded records.
    pub fn count(&self) -> usize {
        lock(&self.records).len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl EventHandler for RecordingHandler {
    fn on_event(&self, record: &EventRecord) -> Result<(), BoxError> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that only counts.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches seen so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl EventHandler for CountingHandler {
    fn on_event(&self, _record: &EventRecord) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// A handler that fails every dispatch after counting it.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: Arc<str>,
    panics: bool,
    attempts: Arc<AtomicUsize>,
}

impl FailingHandler {
    /// Fail by returning `Err(message)`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
            panics: false,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail by panicking with `message`.
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            panics: true,
            ..Self::error(message)
        }
    }

    /// Dispatch attempts so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EventHandler for FailingHandler {
    fn on_event(&self, _record: &EventRecord) -> Result<(), BoxError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("{}", self.message);
        }
        Err(self.message.to_string().into())
    }
}

// ============================================================================
// Scripted Filter
// ============================================================================

/// A filter that records what it was asked and answers with a switchable
/// verdict.
#[derive(Debug, Clone)]
pub struct ScriptedFilter {
    allow: Arc<AtomicBool>,
    fail: Arc<AtomicBool>,
    seen: Arc<AtomicUsize>,
}

impl ScriptedFilter {
    /// Start out allowing everything.
    pub fn allowing() -> Self {
        Self {
            allow: Arc::new(AtomicBool::new(true)),
            fail: Arc::new(AtomicBool::new(false)),
            seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start out rejecting everything.
    pub fn rejecting() -> Self {
        let filter = Self::allowing();
        filter.set_allow(false);
        filter
    }

    /// Change the verdict for later pushes.
    pub fn set_allow(&self, allow: bool) {
        self.allow.store(allow, Ordering::SeqCst);
    }

    /// Make the filter return `Err` instead of a verdict.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Records offered so far.
    pub fn seen(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

impl EventFilter for ScriptedFilter {
    fn allow(&self, _record: &EventRecord) -> Result<bool, BoxError> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("scripted filter failure".into());
        }
        Ok(self.allow.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Log Capture
// ============================================================================

/// A log sink that keeps every diagnostic.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl LogCapture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured `(level, message)` pair, in order.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        lock(&self.lines).clone()
    }

    /// Messages captured at `level`.
    pub fn at(&self, level: LogLevel) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.lines)
            .iter()
            .any(|(_, message)| message.contains(needle))
    }

    /// Number of captured lines.
    pub fn count(&self) -> usize {
        lock(&self.lines).len()
    }

    /// Forget captured lines.
    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl LogSink for LogCapture {
    fn on_log(&self, level: LogLevel, message: &str) {
        lock(&self.lines).push((level, message.to_string()));
    }
}

// ============================================================================
// State Recorder
// ============================================================================

/// An observer that keeps every `(old, new)` transition.
#[derive(Debug, Clone, Default)]
pub struct StateRecorder {
    transitions: Arc<Mutex<Vec<(LifecycleState, LifecycleState)>>>,
}

impl StateRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions in the order they happened.
    pub fn transitions(&self) -> Vec<(LifecycleState, LifecycleState)> {
        lock(&self.transitions).clone()
    }

    /// Number of transitions.
    pub fn count(&self) -> usize {
        lock(&self.transitions).len()
    }
}

impl StateObserver for StateRecorder {
    fn on_state_change(&self, old: LifecycleState, new: LifecycleState) {
        lock(&self.transitions).push((old, new));
    }
}
