//! Lifecycle state machine.

use std::fmt;

/// Lifecycle state of an engine.
///
/// Only [`LifecycleState::Running`] permits dispatch. Pushing is allowed in
/// every state. There is no terminal state: a stopped engine may be started
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Created, never started.
    #[default]
    Idle,
    /// Dispatch permitted.
    Running,
    /// Dispatch suspended.
    Stopped,
}

impl LifecycleState {
    /// Upper-case name used in log lines and status reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Idle => "IDLE",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Stopped => "STOPPED",
        }
    }

    /// Whether dispatch is permitted in this state.
    pub const fn is_running(self) -> bool {
        matches!(self, LifecycleState::Running)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
