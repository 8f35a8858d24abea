//! # evstage-std
//!
//! Standard implementations around the evstage core engine.
//!
//! This crate provides:
//! - **Concurrency**: [`shared::SharedEngine`], a `Send + Sync` engine handle
//! - **Foreign hosts**: [`registry::Registry`], id-based engine handles
//! - **Front door**: [`service::Service`] with batch enqueue, status and health
//! - **Metrics**: [`metrics::ServiceMetrics`], received/processed counters, queue
//!   gauge and dispatch histogram
//! - **Callbacks**: ready-made [`filters`] and the [`log::TracingLog`] sink
//! - **Configuration**: [`settings::Settings`] from `EVSTAGE_*` variables
//! - **Scheduling**: `pump::Pump`, a tokio dispatch loop (`pump` feature)
//! - **Testing**: recording callbacks in [`testing`]

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use evstage_core;

// Modules
pub mod filters;
pub mod log;
pub mod metrics;
#[cfg(feature = "pump")]
pub mod pump;
pub mod registry;
pub mod service;
pub mod settings;
pub mod shared;
pub mod testing;
