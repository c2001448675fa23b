//! Per-lane deskew queue.
//!
//! Holds payload entries of one lane until every lane has one, so that the alignment controller can
//! release them together. Filler is dropped on the way in; nothing leaves unless released.

use laneflow::Pointer;
use tracing::warn;

use crate::config::{validate_deskew_capacity, ConfigError};
use crate::types::Entry;

/// Deskew queue.
#[derive(Debug, Clone)]
pub struct DeskewQueue {
    slots: Box<[Entry]>,
    wptr: Pointer,
    rptr: Pointer,
    open: bool,
    overflows: u64,
}

impl DeskewQueue {
    /// Creates an empty, closed queue.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        validate_deskew_capacity(capacity)?;
        Ok(Self {
            slots: vec![Entry::skp(); capacity].into_boxed_slice(),
            wptr: Pointer::new(capacity, 0),
            rptr: Pointer::new(capacity, 0),
            open: false,
            overflows: 0,
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize { self.slots.len() }

    /// Number of stored entries.
    pub fn len(&self) -> usize { self.wptr.value().wrapping_sub(self.rptr.value()) as usize }

    /// Whether the head is valid.
    pub fn not_empty(&self) -> bool { self.wptr.value() != self.rptr.value() }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool { !self.not_empty() }

    /// Starts accepting writes.
    pub fn open(&mut self) { self.open = true; }

    /// Whether writes are accepted.
    pub fn is_open(&self) -> bool { self.open }

    /// Writes dropped because the queue was full.
    pub fn overflows(&self) -> u64 { self.overflows }

    /// Stores `entry` unless it is filler, the queue is closed, or full. Returns whether it was
    /// stored.
    pub fn try_write(&mut self, entry: Entry, filler_set: bool) -> bool {
        if !self.open || filler_set || entry.is_skp() {
            return false;
        }
        if self.len() == self.capacity() {
            self.overflows += 1;
            warn!(capacity = self.capacity(), ?entry, "deskew queue overflow");
            return false;
        }
        self.slots[self.wptr.slot()] = entry;
        self.wptr.advance(1);
        true
    }

    /// Entry at the read pointer.
    pub fn peek_head(&self) -> Option<Entry> { self.not_empty().then(|| self.slots[self.rptr.slot()]) }

    /// Releases the head. Does nothing on an empty queue.
    pub fn advance_on_release(&mut self) {
        if self.not_empty() {
            self.rptr.advance(1);
        }
    }

    /// Empties and closes the queue. The overflow count is kept.
    pub fn reset(&mut self) {
        let capacity = self.capacity();
        self.wptr = Pointer::new(capacity, 0);
        self.rptr = Pointer::new(capacity, 0);
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Character, COM};

    fn data(byte: u8) -> Entry { Entry::valid(Character::data(byte)) }

    fn open_queue(capacity: usize) -> DeskewQueue {
        let mut queue = DeskewQueue::new(capacity).unwrap();
        queue.open();
        queue
    }

    #[test]
    fn closed_queue_drops_writes() {
        let mut queue = DeskewQueue::new(4).unwrap();
        assert!(!queue.try_write(data(1), false));
        assert!(queue.is_empty());
    }

    #[test]
    fn filler_is_never_stored() {
        let mut queue = open_queue(4);
        assert!(!queue.try_write(Entry::skp(), false));
        assert!(!queue.try_write(Entry::valid(COM), true));
        assert!(queue.try_write(Entry::valid(COM), false));
        assert!(queue.try_write(Entry::invalid(), false));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn releases_in_order_only_when_told() {
        let mut queue = open_queue(4);
        for byte in 1..=3 {
            queue.try_write(data(byte), false);
        }
        assert_eq!(queue.peek_head(), Some(data(1)));
        assert_eq!(queue.peek_head(), Some(data(1)));
        queue.advance_on_release();
        assert_eq!(queue.peek_head(), Some(data(2)));
        queue.advance_on_release();
        queue.advance_on_release();
        assert_eq!(queue.peek_head(), None);
        queue.advance_on_release();
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_counts_overflow() {
        let mut queue = open_queue(2);
        assert!(queue.try_write(data(1), false));
        assert!(queue.try_write(data(2), false));
        assert!(!queue.try_write(data(3), false));
        assert_eq!(queue.overflows(), 1);
        assert_eq!(queue.peek_head(), Some(data(1)));
    }

    #[test]
    fn empty_and_closed_after_reset() {
        let mut queue = open_queue(4);
        queue.try_write(data(1), false);
        queue.reset();
        assert!(queue.is_empty());
        assert!(!queue.is_open());
        assert_eq!(queue.peek_head(), None);
    }

    #[test]
    fn rejects_bad_capacity() {
        assert_eq!(DeskewQueue::new(3).err(), Some(ConfigError::DeskewCapacity(3)));
    }
}
