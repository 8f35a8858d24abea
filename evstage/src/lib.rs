//! # evstage - In-Memory Event Staging and Dispatch
//!
//! `evstage` accepts small typed events from producers, copies them into an
//! engine-owned FIFO, optionally filters them at push time, and dispatches
//! them to a single handler when the owner asks for it. Dispatch is pulled,
//! never pushed: nothing happens until `process` or `process_all` is called
//! on a running engine.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evstage::prelude::*;
//!
//! let mut engine = EngineConfig::new("sensors")
//!     .max_queue_size(1024)
//!     .handler(|record: &EventRecord| println!("{} from {}", record.kind(), record.source()))
//!     .filter(SourceBlocklist::new(["noisy"]))
//!     .build()?;
//!
//! engine.push(EventKind::Data, "probe-1", b"21.5")?;
//! engine.start();
//! engine.process_all();
//! ```
//!
//! ## Sharing across threads
//!
//! [`Engine`] is single-threaded by contract. Wrap it in a [`SharedEngine`]
//! (usually behind an `Arc`) when producers and the consumer live on
//! different threads, and put it in a [`Registry`] when a foreign host can
//! only hold an integer handle.

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use evstage_core::{
    // Error types
    BoxError,
    CallbackError,
    // Callbacks
    Callbacks,
    ConfigError,
    // Engine
    EnqueueError,
    Engine,
    EngineConfig,
    EngineError,
    EventFilter,
    EventHandler,
    // Records
    EventKind,
    EventQueue,
    EventRecord,
    IntoOutcome,
    IntoVerdict,
    // Lifecycle
    LifecycleState,
    LogLevel,
    LogSink,
    StateObserver,
    guard,
};

// Thread-safe handles
pub use evstage_std::{
    registry::{EngineId, Registry, RegistryError},
    shared::SharedEngine,
};

// Front door
pub use evstage_std::service::{
    BatchOutcome, DispatchReport, EventRequest, HealthReport, HealthStatus, Service,
    StatusReport,
};

// Metrics
pub use evstage_std::metrics::{
    HistogramSnapshot, LabeledCount, MeteredHandler, MetricsSnapshot, ServiceMetrics,
};

// Configuration
pub use evstage_std::settings::{Settings, SettingsError};

// Logging
pub use evstage_std::log::TracingLog;

/// Periodic dispatch on a tokio runtime.
#[cfg(feature = "pump")]
pub mod pump {
    pub use evstage_std::pump::Pump;
}

/// Standard push-time filters.
pub mod filters {
    #![allow(clippy::wildcard_imports)]
    pub use evstage_std::filters::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use evstage_std::testing::*;
}

/// Prelude module - common imports for evstage.
///
/// # Usage
///
/// ```rust,ignore
/// use evstage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::filters::{KindFilter, MaxPayload, SourceBlocklist};
    pub use crate::{
        // Errors
        BoxError,
        ConfigError,
        // Engine
        Engine,
        EngineConfig,
        EngineError,
        // Callbacks
        EventFilter,
        EventHandler,
        // Records
        EventKind,
        EventRecord,
        LifecycleState,
        LogLevel,
        LogSink,
        SharedEngine,
        StateObserver,
    };
}
