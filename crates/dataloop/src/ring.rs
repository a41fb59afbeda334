//! Capacity-accounted byte arena backing the invoke queue's payloads.
//!
//! Every queued item reserves `HEADER_RESERVE + payload_len` bytes from a
//! single monotonically advancing cursor pair (`read`, `write`), mirroring
//! the size accounting of the original invoke ring: a fixed per-item header
//! cost plus the caller's payload. When the payload does not fit before the
//! arena wraps, it is written starting at offset 0 and `item_size` is set to
//! the distance from the header to the end of the arena plus the payload
//! length, so the reader's cursor lands exactly on the next item's header
//! once it skips `item_size` bytes. A prior revision of this arithmetic
//! added one extra byte to that wrapped case, which left the reader's
//! cursor off by one and corrupted every item after the first wrap; the
//! fixed formula below has no such term and is covered by
//! `ring_tests::wrap_does_not_lose_a_byte`.

use crate::error::{Error, Result};

/// Notional bytes every queued item reserves for its header, independent of
/// payload size. Keeps capacity accounting meaningful even for zero-payload
/// internal jobs (poll item add/update/remove).
pub const HEADER_RESERVE: usize = 24;

pub struct Ring {
    capacity: usize,
    data: Vec<u8>,
    read: usize,
    write: usize,
}

/// Where a reserved payload landed, and how far the reader must advance its
/// cursor to reach the next item once this one is processed.
#[derive(Debug, Clone, Copy)]
pub struct Reservation {
    pub payload_offset: usize,
    pub item_size: usize,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > HEADER_RESERVE, "ring capacity too small");
        Self {
            capacity,
            data: vec![0u8; capacity],
            read: 0,
            write: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn area0_len(&self) -> usize {
        self.capacity - (self.write % self.capacity)
    }

    fn available(&self) -> usize {
        self.capacity - (self.write - self.read)
    }

    /// Reserve room for a queued item's payload and return where to copy it.
    pub fn reserve(&mut self, payload_len: usize) -> Result<Reservation> {
        let record_len = HEADER_RESERVE + payload_len;
        let area0 = self.area0_len();
        if area0 < HEADER_RESERVE {
            return Err(Error::QueueFull);
        }
        let reservation = if area0 >= record_len {
            Reservation {
                payload_offset: (self.write % self.capacity) + HEADER_RESERVE,
                item_size: record_len,
            }
        } else {
            Reservation {
                payload_offset: 0,
                item_size: area0 + payload_len,
            }
        };
        // The wrap branch's `item_size` covers the unused tail of area0 plus
        // the payload, which can exceed `record_len`; validate the actual
        // cursor advance against `available()`, not just the record length,
        // or a wrap can stomp still-unread bytes and underflow `available()`
        // on the next call.
        if reservation.item_size > self.available() {
            return Err(Error::QueueFull);
        }
        self.write += reservation.item_size;
        Ok(reservation)
    }

    pub fn write_payload(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn read_payload(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Free the space occupied by the item at the front of the queue.
    pub fn advance_read(&mut self, item_size: usize) {
        self.read += item_size;
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod ring_tests;
