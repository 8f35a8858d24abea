//! Event records: the unit of data staged by the engine.

use crate::error::EngineError;
use std::fmt;

/// The closed set of event kinds.
///
/// Discriminants are stable and double as the wire representation used by
/// front ends (`kind: int`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum EventKind {
    /// Application data.
    Data = 0,
    /// A peer connected.
    Connect = 1,
    /// A peer disconnected.
    Disconnect = 2,
    /// An error report.
    Error = 3,
}

impl EventKind {
    /// All kinds in discriminant order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Data,
        EventKind::Connect,
        EventKind::Disconnect,
        EventKind::Error,
    ];

    /// Upper-case name used in log lines and metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Data => "DATA",
            EventKind::Connect => "CONNECT",
            EventKind::Disconnect => "DISCONNECT",
            EventKind::Error => "ERROR",
        }
    }

    /// Wire representation.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for EventKind {
    type Error = EngineError;

    fn try_from(value: i32) -> Result<Self, EngineError> {
        match value {
            0 => Ok(EventKind::Data),
            1 => Ok(EventKind::Connect),
            2 => Ok(EventKind::Disconnect),
            3 => Ok(EventKind::Error),
            other => Err(EngineError::UnknownKind(other)),
        }
    }
}

/// An immutable event held by the queue.
///
/// The record owns copies of the source tag and payload; nothing the
/// producer passed in is aliased after [`EventRecord::copy_from`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    kind: EventKind,
    source: Box<str>,
    payload: Box<[u8]>,
}

impl EventRecord {
    /// Copy `source` and `payload` into a new engine-owned record.
    ///
    /// The payload copy reserves its storage fallibly, so an oversized payload
    /// yields [`EngineError::Allocation`] instead of aborting the process.
    pub fn copy_from(kind: EventKind, source: &str, payload: &[u8]) -> Result<Self, EngineError> {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(payload.len())
            .map_err(|_| EngineError::Allocation {
                requested: payload.len(),
            })?;
        owned.extend_from_slice(payload);

        Ok(Self {
            kind,
            source: source.into(),
            payload: owned.into_boxed_slice(),
        })
    }

    /// The event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The source tag. May be empty.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The opaque payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the payload in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["DATA", "CONNECT", "DISCONNECT", "ERROR"]);
    }

    #[test]
    fn test_kind_from_wire() {
        assert_eq!(EventKind::try_from(3), Ok(EventKind::Error));
        assert_eq!(EventKind::try_from(7), Err(EngineError::UnknownKind(7)));
        assert_eq!(EventKind::try_from(-1), Err(EngineError::UnknownKind(-1)));
    }

    #[test]
    fn test_record_owns_copies() {
        let mut buffer = vec![1_u8, 2, 3];
        let mut source = String::from("sensor");
        let record = EventRecord::copy_from(EventKind::Data, &source, &buffer).unwrap();

        buffer.fill(0);
        source.clear();

        assert_eq!(record.payload(), &[1, 2, 3]);
        assert_eq!(record.source(), "sensor");
        assert_eq!(record.payload_len(), 3);
    }

    #[test]
    fn test_record_empty_source_and_payload() {
        let record = EventRecord::copy_from(EventKind::Connect, "", &[]).unwrap();
        assert_eq!(record.source(), "");
        assert!(record.payload().is_empty());
    }
}
