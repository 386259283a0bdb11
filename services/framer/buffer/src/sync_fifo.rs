//! Cross-domain byte FIFO.
//!
//! Producer and consumer run on independent scheduling domains. The only
//! state crossing domains is the pair of monotonic position counters,
//! each written by exactly one side and read by the other with
//! acquire/release ordering. Occupancy in each domain is derived from its
//! own counter plus the last observed value of the remote one, so a torn
//! or stale read can only under-report what the other side has done —
//! never reorder, lose, or duplicate a byte.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Shared {
    slots: Vec<AtomicU8>,
    /// Written only by the producer.
    head: AtomicU64,
    /// Written only by the consumer.
    tail: AtomicU64,
}

impl Shared {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }
}

/// Write half of a cross-domain FIFO. Not cloneable: exactly one producer.
#[derive(Debug)]
pub struct SyncProducer {
    shared: Arc<Shared>,
}

/// Read half of a cross-domain FIFO. Not cloneable: exactly one consumer.
#[derive(Debug)]
pub struct SyncConsumer {
    shared: Arc<Shared>,
}

/// Create a bounded cross-domain FIFO with the given byte capacity
/// (at least 1 slot), split into its producer and consumer halves.
pub fn sync_fifo(capacity: usize) -> (SyncProducer, SyncConsumer) {
    let mut slots = Vec::with_capacity(capacity.max(1));
    slots.resize_with(capacity.max(1), || AtomicU8::new(0));
    let shared = Arc::new(Shared {
        slots,
        head: AtomicU64::new(0),
        tail: AtomicU64::new(0),
    });
    (
        SyncProducer {
            shared: Arc::clone(&shared),
        },
        SyncConsumer { shared },
    )
}

impl SyncProducer {
    /// Write one byte, returning whether it was accepted.
    ///
    /// Rejected only when the FIFO is full as seen from this domain; the
    /// consumer may already have freed slots that are not yet visible
    /// here, in which case a retry will succeed once the tail counter
    /// synchronizes over.
    pub fn push(&mut self, byte: u8) -> bool {
        let shared = &self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);
        if head - tail == shared.capacity() {
            return false;
        }
        let slot = (head % shared.capacity()) as usize;
        shared.slots[slot].store(byte, Ordering::Relaxed);
        // Publishes the slot write to the consumer domain.
        shared.head.store(head + 1, Ordering::Release);
        true
    }

    /// Buffered bytes as seen from the producer domain (may over-report
    /// while the remote counter is in flight).
    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        (head - tail) as usize
    }

    /// True when this domain observes no buffered bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when this domain observes a full ring.
    pub fn is_full(&self) -> bool {
        self.len() == self.shared.slots.len()
    }
}

impl SyncConsumer {
    /// Read one byte, in the exact order it was written.
    ///
    /// Returns `None` when the FIFO is empty as seen from this domain;
    /// bytes the producer has pushed but not yet published will appear
    /// on a later call.
    pub fn pop(&mut self) -> Option<u8> {
        let shared = &self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let slot = (tail % shared.capacity()) as usize;
        let byte = shared.slots[slot].load(Ordering::Relaxed);
        // Frees the slot for the producer domain.
        shared.tail.store(tail + 1, Ordering::Release);
        Some(byte)
    }

    /// Buffered bytes as seen from the consumer domain (may under-report
    /// while the remote counter is in flight).
    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);
        (head - tail) as usize
    }

    /// True when this domain observes no buffered bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
