//! Reusable push-time filters.

use evstage_core::{BoxError, EventFilter, EventKind, EventRecord};
use std::collections::HashSet;

/// Drops records whose source tag is on a blocklist.
///
/// # Example
///
/// ```rust,ignore
/// let filter = SourceBlocklist::new(["blocked", "spam"]);
/// let engine = EngineConfig::new("api").filter(filter).build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceBlocklist {
    blocked: HashSet<String>,
}

impl SourceBlocklist {
    /// Block every source in `sources`.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: sources.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one more blocked source.
    pub fn block(mut self, source: impl Into<String>) -> Self {
        self.blocked.insert(source.into());
        self
    }

    /// Whether `source` is blocked.
    pub fn is_blocked(&self, source: &str) -> bool {
        self.blocked.contains(source)
    }
}

impl EventFilter for SourceBlocklist {
    fn allow(&self, record: &EventRecord) -> Result<bool, BoxError> {
        Ok(!self.is_blocked(record.source()))
    }
}

/// Allows only the listed kinds.
#[derive(Debug, Clone, Copy)]
pub struct KindFilter {
    allowed: [bool; EventKind::ALL.len()],
}

impl KindFilter {
    /// Allow exactly the kinds in `kinds`.
    pub fn only(kinds: &[EventKind]) -> Self {
        let mut allowed = [false; EventKind::ALL.len()];
        for kind in kinds {
            allowed[kind.as_i32() as usize] = true;
        }
        Self { allowed }
    }

    /// Allow everything except the kinds in `kinds`.
    pub fn except(kinds: &[EventKind]) -> Self {
        let mut filter = Self {
            allowed: [true; EventKind::ALL.len()],
        };
        for kind in kinds {
            filter.allowed[kind.as_i32() as usize] = false;
        }
        filter
    }

    /// Whether `kind` passes.
    pub fn allows(&self, kind: EventKind) -> bool {
        self.allowed[kind.as_i32() as usize]
    }
}

impl EventFilter for KindFilter {
    fn allow(&self, record: &EventRecord) -> Result<bool, BoxError> {
        Ok(self.allows(record.kind()))
    }
}

/// Drops records whose payload exceeds a byte limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPayload(pub usize);

impl EventFilter for MaxPayload {
    fn allow(&self, record: &EventRecord) -> Result<bool, BoxError> {
        Ok(record.payload_len() <= self.0)
    }
}
