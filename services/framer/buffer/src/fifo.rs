//! Single-domain payload FIFO with packet boundary tracking.
//!
//! The buffer accepts payload bytes from a producer at its own pace and
//! serves them to the frame encoder in order. Each queued packet is
//! tracked by a descriptor recording its declared length and how much of
//! it has been written and read; a packet becomes eligible for reading
//! only once its final byte has been written.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::BufferError;

/// Default byte capacity of the ring.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Maximum number of packets in flight (descriptor table size).
pub const MAX_PACKETS: usize = 256;

/// Largest representable declared length (11-bit field).
const MAX_DECLARED: u16 = 2047;

#[derive(Debug, Clone, Copy)]
struct PacketDesc {
    declared_len: u16,
    written: u16,
    read: u16,
}

impl PacketDesc {
    fn complete(&self) -> bool {
        self.written == self.declared_len
    }

    fn drained(&self) -> bool {
        self.read == self.declared_len
    }
}

/// Bounded byte queue decoupling payload production from frame encoding.
///
/// The write side is [`offer`](Self::offer), gated by
/// [`ready`](Self::ready); the read side is [`peek`](Self::peek) /
/// [`take`](Self::take). Packets are served strictly in the order they
/// were written.
#[derive(Debug)]
pub struct PayloadBuffer {
    slots: Vec<u8>,
    /// Total bytes ever written; `head % capacity` is the next write slot.
    head: u64,
    /// Total bytes ever read; `tail % capacity` is the next read slot.
    tail: u64,
    packets: VecDeque<PacketDesc>,
    overflow: bool,
    underflow: bool,
}

impl PayloadBuffer {
    /// Create a buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer with an explicit byte capacity (at least 1 slot).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity.max(1)],
            head: 0,
            tail: 0,
            packets: VecDeque::new(),
            overflow: false,
            underflow: false,
        }
    }

    /// Byte capacity of the ring.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of buffered bytes, derived from the position counters.
    pub fn len(&self) -> usize {
        (self.head - self.tail) as usize
    }

    /// True when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// True when every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Open a new packet with the given declared length.
    ///
    /// Fails if the previous packet is still collecting bytes, if the
    /// descriptor table is full, or if the length is not representable.
    pub fn begin_packet(&mut self, declared_len: u16) -> Result<(), BufferError> {
        if declared_len > MAX_DECLARED {
            return Err(BufferError::DeclaredLength(declared_len));
        }
        if let Some(last) = self.packets.back() {
            if !last.complete() {
                return Err(BufferError::PacketOpen);
            }
        }
        if self.packets.len() == MAX_PACKETS {
            return Err(BufferError::PacketTableFull);
        }
        debug!("opening packet {} bytes, {} in flight", declared_len, self.packets.len());
        self.packets.push_back(PacketDesc {
            declared_len,
            written: 0,
            read: 0,
        });
        self.refresh_flags();
        Ok(())
    }

    /// Producer readiness: true only while the ring has capacity and the
    /// current packet's payload is not yet fully received.
    pub fn ready(&self) -> bool {
        self.write_would_accept()
    }

    /// Write one payload byte, returning whether it was accepted.
    ///
    /// A rejected write (ring full, no open packet, or declared length
    /// already reached) sets the sticky overflow flag and leaves the
    /// buffered bytes untouched.
    pub fn offer(&mut self, byte: u8) -> bool {
        if !self.write_would_accept() {
            warn!("payload byte rejected: {}", self.reject_reason());
            self.overflow = true;
            return false;
        }
        let slot = (self.head % self.capacity() as u64) as usize;
        self.slots[slot] = byte;
        self.head += 1;
        if let Some(last) = self.packets.back_mut() {
            last.written += 1;
            if last.complete() {
                trace!("packet complete at {} bytes", last.declared_len);
            }
        }
        self.refresh_flags();
        true
    }

    /// Look at the next readable byte without consuming it.
    ///
    /// Returns `None` while no complete packet has unread bytes. Stable
    /// across repeated calls, so a stalled consumer observes the same
    /// byte until it takes it.
    pub fn peek(&mut self) -> Option<u8> {
        self.pop_drained();
        let front = self.packets.front()?;
        if !front.complete() || front.drained() {
            return None;
        }
        let slot = (self.tail % self.capacity() as u64) as usize;
        Some(self.slots[slot])
    }

    /// Consume the next readable byte.
    ///
    /// A read while nothing is available sets the sticky underflow flag
    /// and returns `None`.
    pub fn take(&mut self) -> Option<u8> {
        let Some(byte) = self.peek() else {
            self.underflow = true;
            return None;
        };
        self.tail += 1;
        if let Some(front) = self.packets.front_mut() {
            front.read += 1;
        }
        self.pop_drained();
        self.refresh_flags();
        Some(byte)
    }

    /// Number of complete-but-unread packets.
    pub fn packets_ready(&self) -> usize {
        self.packets
            .iter()
            .filter(|p| p.complete() && !p.drained())
            .count()
    }

    /// True when the packet at the head of the queue has been fully
    /// written and is ready for the encoder. Fully-drained descriptors
    /// (zero-length packets in particular) are skipped, not counted.
    pub fn next_packet_ready(&self) -> bool {
        self.packets
            .iter()
            .find(|p| !(p.complete() && p.drained()))
            .map_or(false, |p| p.complete())
    }

    /// Sticky overflow diagnostic: a write was rejected and a write would
    /// still be rejected now.
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Sticky underflow diagnostic: a read came up empty and nothing has
    /// become readable since.
    pub fn underflow(&self) -> bool {
        self.underflow
    }

    /// Drop all buffered bytes, descriptors, and diagnostics.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.packets.clear();
        self.overflow = false;
        self.underflow = false;
    }

    fn write_would_accept(&self) -> bool {
        if self.is_full() {
            return false;
        }
        match self.packets.back() {
            Some(last) => !last.complete(),
            None => false,
        }
    }

    fn read_available(&mut self) -> bool {
        self.pop_drained();
        match self.packets.front() {
            Some(front) => front.complete() && !front.drained(),
            None => false,
        }
    }

    fn reject_reason(&self) -> &'static str {
        if self.is_full() {
            "ring full"
        } else if self.packets.back().is_none() {
            "no open packet"
        } else {
            "declared length reached"
        }
    }

    /// Retire fully-read descriptors, including zero-length packets that
    /// never see a `take`.
    fn pop_drained(&mut self) {
        while let Some(front) = self.packets.front() {
            if front.complete() && front.drained() {
                self.packets.pop_front();
            } else {
                break;
            }
        }
    }

    /// Sticky flags clear on their own once the triggering condition
    /// resolves.
    fn refresh_flags(&mut self) {
        if self.overflow && self.write_would_accept() {
            self.overflow = false;
        }
        if self.underflow && self.read_available() {
            self.underflow = false;
        }
    }
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::new()
    }
}
