//! # evstage-core
//!
//! Core engine for the evstage event staging and dispatch library.
//!
//! This crate has minimal dependencies and is designed to be embedded by
//! front ends (control loops, network services, foreign-language hosts) that
//! want one implementation of queueing, filtering and lifecycle rules.
//!
//! # Components
//!
//! ## Event Record ([`EventRecord`])
//!
//! The immutable unit of data: a [`EventKind`], a source tag and an opaque
//! payload, all copied into engine-owned storage at push time.
//!
//! ## Queue ([`EventQueue`])
//!
//! A strict FIFO backed by a ring of slots. Bounded queues reject pushes at
//! capacity instead of truncating or blocking.
//!
//! ## Lifecycle ([`LifecycleState`])
//!
//! IDLE → RUNNING ⇄ STOPPED. Only RUNNING permits dispatch; pushing is always
//! allowed.
//!
//! ## Callbacks ([`Callbacks`])
//!
//! Handler, filter, log sink and state observer. Every side effect of the
//! engine flows through one of them, and failures inside them are contained.
//!
//! ## Engine ([`Engine`])
//!
//! Composes the above behind create / push / process / start / stop /
//! clear / inspect, single-threaded by contract.
//!
//! # Error Types
//!
//! - [`EngineError`] - Capacity rejection, allocation failure, use-after-close
//! - [`ConfigError`] - Malformed creation parameters
//! - [`CallbackError`] - Contained callback failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod callbacks;
mod config;
mod engine;
mod error;
mod queue;
mod record;
mod state;

// Re-exports
pub use callbacks::{
    Callbacks, EventFilter, EventHandler, IntoOutcome, IntoVerdict, LogLevel, LogSink,
    StateObserver, guard,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{BoxError, CallbackError, ConfigError, EngineError};
pub use queue::{EnqueueError, EventQueue};
pub use record::{EventKind, EventRecord};
pub use state::LifecycleState;
