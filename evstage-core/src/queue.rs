//! Slot-ring FIFO queue.
//!
//! Records live in a ring of `Option<EventRecord>` slots indexed by
//! `head` and `len`. The ring starts small and doubles when every slot is
//! occupied; a bounded queue never grows past its maximum, so the capacity
//! check stays structural without paying for the whole maximum up front.
//! Growth reserves fallibly, and a failed reservation rejects the record
//! instead of aborting.
//!
//! The queue performs no locking; callers serialize access.

use crate::record::EventRecord;
use std::mem;

const INITIAL_SLOTS: usize = 16;

/// Why [`EventQueue::enqueue`] handed a record back.
#[derive(Debug)]
pub enum EnqueueError {
    /// The bounded queue is at its maximum.
    Full(EventRecord),
    /// The ring had to grow and the allocation failed.
    Allocation {
        /// The rejected record.
        record: EventRecord,
        /// Bytes the failed reservation asked for.
        requested: usize,
    },
}

impl EnqueueError {
    /// Take back the rejected record.
    pub fn into_record(self) -> EventRecord {
        match self {
            EnqueueError::Full(record) | EnqueueError::Allocation { record, .. } => record,
        }
    }
}

/// A FIFO of event records, optionally bounded.
#[derive(Debug)]
pub struct EventQueue {
    slots: Vec<Option<EventRecord>>,
    head: usize,
    len: usize,
    max: Option<usize>,
}

impl EventQueue {
    /// Create a queue. `max_size == 0` means unbounded.
    ///
    /// Allocates at most a handful of slots regardless of `max_size`.
    pub fn new(max_size: usize) -> Self {
        let max = (max_size > 0).then_some(max_size);
        let initial = max.map_or(INITIAL_SLOTS, |max| max.min(INITIAL_SLOTS));
        Self {
            slots: std::iter::repeat_with(|| None).take(initial).collect(),
            head: 0,
            len: 0,
            max,
        }
    }

    /// Append a record at the tail.
    ///
    /// A full bounded queue, or a ring that cannot grow, hands the record
    /// back untouched.
    pub fn enqueue(&mut self, record: EventRecord) -> Result<(), EnqueueError> {
        if self.is_full() {
            return Err(EnqueueError::Full(record));
        }
        if self.len == self.slots.len() {
            if let Err(requested) = self.grow() {
                return Err(EnqueueError::Allocation { record, requested });
            }
        }

        let tail = (self.head + self.len) % self.slots.len();
        debug_assert!(self.slots[tail].is_none());
        self.slots[tail] = Some(record);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the head record, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<EventRecord> {
        if self.len == 0 {
            return None;
        }
        let record = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        if self.len == 0 {
            self.head = 0;
        }
        record
    }

    /// Drop every held record without dispatching it. Returns how many were
    /// removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.len;
        while self.len > 0 {
            self.slots[self.head] = None;
            self.head = (self.head + 1) % self.slots.len();
            self.len -= 1;
        }
        self.head = 0;
        removed
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The configured maximum, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.max
    }

    /// Whether the next enqueue would be rejected for capacity.
    pub fn is_full(&self) -> bool {
        self.max.is_some_and(|max| self.len >= max)
    }

    /// Double the ring (capped at the maximum), unwrapping it so the head
    /// lands at index 0. On failure returns the byte count requested.
    fn grow(&mut self) -> Result<(), usize> {
        let old_len = self.slots.len();
        let doubled = old_len.saturating_mul(2).max(1);
        let new_len = self.max.map_or(doubled, |max| doubled.min(max));
        let requested = new_len.saturating_mul(mem::size_of::<Option<EventRecord>>());

        let mut slots = Vec::new();
        slots.try_reserve_exact(new_len).map_err(|_| requested)?;
        for i in 0..self.len {
            slots.push(self.slots[(self.head + i) % old_len].take());
        }
        slots.resize_with(new_len, || None);

        self.slots = slots;
        self.head = 0;
        Ok(())
    }
}
