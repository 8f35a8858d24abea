//! Error types for evstage.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`EngineError`] - Failures surfaced to the caller of an engine operation
//! - [`ConfigError`] - Rejected engine configuration
//! - [`CallbackError`] - Failures contained at the callback boundary

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by engine operations.
///
/// Only capacity rejections and use-after-close reach the caller. Callback
/// failures never do; they are logged and contained inside the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The queue already holds `capacity` records.
    #[error("queue full ({capacity} items)")]
    QueueFull {
        /// The configured maximum queue size.
        capacity: usize,
    },

    /// The engine could not allocate storage for the record copy or for
    /// more queue slots.
    #[error("failed to allocate {requested} bytes for event storage")]
    Allocation {
        /// Byte count that could not be allocated.
        requested: usize,
    },

    /// The engine has been closed.
    #[error("engine is closed")]
    Closed,

    /// A wire-level kind tag outside the closed kind set.
    #[error("unknown event kind: {0}")]
    UnknownKind(i32),
}

/// Errors raised while validating an engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The engine name is empty or whitespace.
    #[error("engine name must not be empty")]
    EmptyName,

    /// The engine name cannot be represented by every host.
    #[error("invalid engine name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// A failure raised by a user callback.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("callback failed: {0}")]
    Failed(#[source] BoxError),

    /// The callback panicked.
    #[error("callback panicked: {0}")]
    Panicked(String),
}

impl CallbackError {
    /// Build a [`CallbackError::Panicked`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallbackError::Panicked(message)
    }
}

impl From<BoxError> for CallbackError {
    fn from(err: BoxError) -> Self {
        CallbackError::Failed(err)
    }
}
