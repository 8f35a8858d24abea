//! Engine configuration snapshot.

use crate::{
    callbacks::{Callbacks, EventFilter, EventHandler, LogSink, StateObserver},
    error::ConfigError,
};

/// Creation parameters for an [`Engine`](crate::Engine).
///
/// The snapshot is consumed by [`Engine::new`](crate::Engine::new) and is
/// immutable afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineConfig::new("ingest")
///     .max_queue_size(1024)
///     .enable_logging(true)
///     .handler(|record: &EventRecord| store(record))
///     .build()?;
/// ```
#[derive(Debug)]
pub struct EngineConfig {
    pub(crate) name: String,
    pub(crate) max_queue_size: usize,
    pub(crate) enable_logging: bool,
    pub(crate) callbacks: Callbacks,
}

impl EngineConfig {
    /// Start a configuration with the given engine name, an unbounded queue,
    /// logging disabled and no callbacks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_queue_size: 0,
            enable_logging: false,
            callbacks: Callbacks::new(),
        }
    }

    /// Maximum number of queued records. `0` means unbounded.
    pub fn max_queue_size(mut self, max: usize) -> Self {
        self.max_queue_size = max;
        self
    }

    /// Whether diagnostics are sent to the log sink.
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Replace the whole callback set.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Set the event handler.
    pub fn handler<H: EventHandler>(mut self, handler: H) -> Self {
        self.callbacks = self.callbacks.with_handler(handler);
        self
    }

    /// Set the push-time filter.
    pub fn filter<F: EventFilter>(mut self, filter: F) -> Self {
        self.callbacks = self.callbacks.with_filter(filter);
        self
    }

    /// Set the diagnostic sink.
    pub fn log_sink<L: LogSink>(mut self, sink: L) -> Self {
        self.callbacks = self.callbacks.with_log(sink);
        self
    }

    /// Set the lifecycle observer.
    pub fn state_observer<S: StateObserver>(mut self, observer: S) -> Self {
        self.callbacks = self.callbacks.with_state_observer(observer);
        self
    }

    /// The configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the snapshot against the validation policy.
    ///
    /// Names must be non-blank and free of NUL bytes, since C hosts receive
    /// them as NUL-terminated strings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.name.contains('\0') {
            return Err(ConfigError::InvalidName {
                name: self.name.clone(),
                reason: "contains a NUL byte",
            });
        }
        Ok(())
    }

    /// Validate and create the engine.
    pub fn build(self) -> Result<crate::Engine, ConfigError> {
        crate::Engine::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("e");
        assert_eq!(config.max_queue_size, 0);
        assert!(!config.enable_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(EngineConfig::new("").validate(), Err(ConfigError::EmptyName));
        assert_eq!(EngineConfig::new("  \t").validate(), Err(ConfigError::EmptyName));
    }

    #[test]
    fn test_nul_name_rejected() {
        let err = EngineConfig::new("bad\0name").validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName { .. }));
    }
}
