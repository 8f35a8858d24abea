//! Log sink bridging engine diagnostics into `tracing`.

use evstage_core::{LogLevel, LogSink};

/// A [`LogSink`] that re-emits engine diagnostics as `tracing` events.
///
/// Each event carries the engine name in the `engine` field so output from
/// several engines stays attributable.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineConfig::new("ingest")
///     .enable_logging(true)
///     .log_sink(TracingLog::named("ingest"))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct TracingLog {
    engine: String,
}

impl TracingLog {
    /// Create a sink with a default engine label.
    pub fn new() -> Self {
        Self::named("evstage")
    }

    /// Create a sink labelling every event with `engine`.
    pub fn named(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    /// The engine label.
    pub fn engine(&self) -> &str {
        &self.engine
    }
}

impl Default for TracingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for TracingLog {
    fn on_log(&self, level: LogLevel, message: &str) {
        let engine = self.engine.as_str();
        match level {
            LogLevel::Debug => tracing::debug!(engine, "{message}"),
            LogLevel::Info => tracing::info!(engine, "{message}"),
            LogLevel::Warn => tracing::warn!(engine, "{message}"),
            LogLevel::Error => tracing::error!(engine, "{message}"),
        }
    }
}
