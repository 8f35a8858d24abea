//! # Engine
//!
//! Composes the [`EventQueue`], the lifecycle state and the [`Callbacks`]
//! behind one API.
//!
//! The engine is single-threaded by contract: every mutation takes
//! `&mut self` and no internal locking is performed. Share it across threads
//! through a facade that serializes writers (see `evstage::SharedEngine`).
//!
//! # Data flow
//!
//! ```text
//! push ──► capacity check ──► copy-in ──► filter ──► queue
//!                                                      │
//! process / process_all (RUNNING only) ◄───────────────┘
//!        └──► handler ──► events_processed += 1 ──► record dropped
//! ```
//!
//! # Teardown
//!
//! Dropping an engine logs the teardown, discards queued records without
//! dispatching them and frees everything it owns. [`Engine::close`] is the
//! explicit spelling of the same.

use crate::{
    callbacks::{Callbacks, LogLevel, guard},
    config::EngineConfig,
    error::{CallbackError, ConfigError, EngineError},
    queue::{EnqueueError, EventQueue},
    record::{EventKind, EventRecord},
    state::LifecycleState,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
};

/// An event staging and dispatch engine.
#[derive(Debug)]
pub struct Engine {
    name: String,
    enable_logging: bool,
    callbacks: Callbacks,
    state: LifecycleState,
    queue: EventQueue,
    events_processed: u64,
}

impl Engine {
    /// Validate `config` and create an idle engine with an empty queue.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let engine = Self {
            queue: EventQueue::new(config.max_queue_size),
            name: config.name,
            enable_logging: config.enable_logging,
            callbacks: config.callbacks,
            state: LifecycleState::Idle,
            events_processed: 0,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            engine = %engine.name,
            capacity = ?engine.queue.capacity(),
            "engine created"
        );

        engine.log(
            LogLevel::Info,
            format_args!("Event processor '{}' created", engine.name),
        );
        Ok(engine)
    }

    // ------------------------------------------------------------------------
    // Producer side
    // ------------------------------------------------------------------------

    /// Copy an event into the engine and queue it.
    ///
    /// Returns `Ok(())` both when the record was queued and when the filter
    /// dropped it: a filtered record is handled, not failed. Errors are
    /// [`EngineError::QueueFull`] when the queue is at capacity and
    /// [`EngineError::Allocation`] when the payload copy or queue growth cannot
    /// be allocated.
    ///
    /// `source` and `payload` may be reused by the caller as soon as this
    /// returns.
    pub fn push(
        &mut self,
        kind: EventKind,
        source: &str,
        payload: &[u8],
    ) -> Result<(), EngineError> {
        if self.queue.is_full() {
            let capacity = self.queue.len();
            self.log(LogLevel::Warn, format_args!("Queue full ({capacity} items)"));
            return Err(EngineError::QueueFull { capacity });
        }

        let record = match EventRecord::copy_from(kind, source, payload) {
            Ok(record) => record,
            Err(err) => {
                self.log(LogLevel::Error, format_args!("Dropping event: {err}"));
                return Err(err);
            }
        };

        if !self.admit(&record) {
            self.log(LogLevel::Debug, format_args!("Event filtered out"));
            return Ok(());
        }

        match self.queue.enqueue(record) {
            Ok(()) => {}
            Err(EnqueueError::Full(rejected)) => {
                let capacity = self.queue.len();
                self.log(
                    LogLevel::Warn,
                    format_args!("Queue full ({capacity} items), dropping {}", rejected.kind()),
                );
                return Err(EngineError::QueueFull { capacity });
            }
            Err(EnqueueError::Allocation { requested, .. }) => {
                let err = EngineError::Allocation { requested };
                self.log(LogLevel::Error, format_args!("Dropping event: {err}"));
                return Err(err);
            }
        }

        self.log(
            LogLevel::Debug,
            format_args!(
                "Event queued (type={kind}, queue_size={})",
                self.queue.len()
            ),
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Consumer side
    // ------------------------------------------------------------------------

    /// Dispatch at most one record.
    ///
    /// Returns `true` when a record was handed to the handler. Does nothing
    /// unless the engine is running.
    pub fn process(&mut self) -> bool {
        if !self.state.is_running() {
            self.log(LogLevel::Warn, format_args!("Processor not running"));
            return false;
        }
        match self.queue.dequeue() {
            Some(record) => {
                self.dispatch(record);
                true
            }
            None => false,
        }
    }

    /// Dispatch records until the queue is empty or the engine stops
    /// running. Returns how many were dispatched.
    pub fn process_all(&mut self) -> usize {
        if !self.state.is_running() {
            self.log(LogLevel::Warn, format_args!("Processor not running"));
            return 0;
        }

        let mut count = 0;
        while self.state.is_running() {
            let Some(record) = self.queue.dequeue() else {
                break;
            };
            self.dispatch(record);
            count += 1;
        }

        if count > 0 {
            self.log(LogLevel::Info, format_args!("Processed {count} events"));
        }
        count
    }

    /// Discard every queued record without dispatching it. Returns how many
    /// were discarded.
    pub fn clear_queue(&mut self) -> usize {
        let cleared = self.queue.clear();
        if cleared > 0 {
            self.log(
                LogLevel::Info,
                format_args!("Cleared {cleared} events from queue"),
            );
        }
        cleared
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Permit dispatch. A no-op when already running.
    pub fn start(&mut self) {
        self.transition(LifecycleState::Running);
    }

    /// Suspend dispatch. A no-op when already stopped.
    pub fn stop(&mut self) {
        self.transition(LifecycleState::Stopped);
    }

    /// Tear the engine down now rather than at end of scope.
    pub fn close(self) {}

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of records waiting for dispatch.
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Number of records dispatched so far, failed deliveries included.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// The configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured maximum queue size, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.queue.capacity()
    }

    /// Whether diagnostics reach the log sink.
    pub fn logging_enabled(&self) -> bool {
        self.enable_logging
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn admit(&self, record: &EventRecord) -> bool {
        let Some(filter) = &self.callbacks.on_filter else {
            return true;
        };
        match guard(|| filter.allow(record)) {
            Ok(allow) => allow,
            Err(err) => {
                self.report_failure("filter", Some(record.kind()), &err);
                true
            }
        }
    }

    fn dispatch(&mut self, record: EventRecord) {
        self.log(
            LogLevel::Debug,
            format_args!("Processing event (type={})", record.kind()),
        );

        if let Some(handler) = &self.callbacks.on_event {
            if let Err(err) = guard(|| handler.on_event(&record)) {
                self.report_failure("event", Some(record.kind()), &err);
            }
        }

        self.events_processed += 1;
    }

    fn transition(&mut self, new: LifecycleState) {
        let old = self.state;
        if old == new {
            return;
        }

        self.log(LogLevel::Info, format_args!("State change: {old} -> {new}"));
        self.state = new;

        if let Some(observer) = &self.callbacks.on_state_change {
            let notified = guard(|| {
                observer.on_state_change(old, new);
                Ok(())
            });
            if let Err(err) = notified {
                self.report_failure("state change", None, &err);
            }
        }
    }

    fn report_failure(&self, callback: &'static str, kind: Option<EventKind>, err: &CallbackError) {
        #[cfg(feature = "tracing")]
        tracing::error!(
            engine = %self.name,
            callback,
            kind = kind.map(EventKind::as_str),
            error = %err,
            "callback failed"
        );

        match kind {
            Some(kind) => self.log(
                LogLevel::Error,
                format_args!("Panic or error in {callback} handler (type={kind}): {err}"),
            ),
            None => self.log(
                LogLevel::Error,
                format_args!("Panic or error in {callback} handler: {err}"),
            ),
        }
    }

    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>) {
        if !self.enable_logging {
            return;
        }
        let Some(sink) = &self.callbacks.on_log else {
            return;
        };

        let message = message.to_string();
        // A panicking sink cannot report its own failure; it is swallowed.
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| sink.on_log(level, &message)));
        if delivered.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!(engine = %self.name, %level, "log sink panicked");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.log(
            LogLevel::Info,
            format_args!("Destroying event processor '{}'", self.name),
        );
        self.clear_queue();
    }
}
