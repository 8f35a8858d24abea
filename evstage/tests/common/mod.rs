#![allow(dead_code)]

use evstage::{
    Engine, EngineConfig, SharedEngine,
    testing::{LogCapture, RecordingHandler, StateRecorder},
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Every observable side channel of one engine.
pub struct Probe {
    pub handler: RecordingHandler,
    pub log: LogCapture,
    pub states: StateRecorder,
}

impl Probe {
    pub fn new() -> Self {
        Self {
            handler: RecordingHandler::new(),
            log: LogCapture::new(),
            states: StateRecorder::new(),
        }
    }

    /// A config wired to this probe, with logging on.
    pub fn config(&self, name: &str, max_queue_size: usize) -> EngineConfig {
        EngineConfig::new(name)
            .max_queue_size(max_queue_size)
            .enable_logging(true)
            .handler(self.handler.clone())
            .log_sink(self.log.clone())
            .state_observer(self.states.clone())
    }

    pub fn engine(&self, max_queue_size: usize) -> Engine {
        self.config("probe", max_queue_size).build().unwrap()
    }

    pub fn shared(&self, max_queue_size: usize) -> SharedEngine {
        SharedEngine::new(self.config("probe", max_queue_size)).unwrap()
    }
}
