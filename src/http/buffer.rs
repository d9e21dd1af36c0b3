//! Byte accumulator
//!
//! Holds input bytes that arrived but were not parsed yet. Bytes are only
//! ever appended at the tail and consumed from the front.

use bytes::{Bytes, BytesMut};

/// Initial capacity, enough for a typical header section
const INITIAL_CAPACITY: usize = 8192;

/// Append-only byte accumulator
///
/// Consumed regions are split off the underlying `BytesMut` rather than
/// copied, so lines and body slices handed out during one pass share the
/// same allocation. The storage is reused once every handle from that pass
/// is dropped.
#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Accumulator {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Add newly arrived bytes to the tail
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Discard the first `n` bytes
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the number of buffered bytes.
    pub fn consume(&mut self, n: usize) {
        let _ = self.buf.split_to(n);
    }

    /// Detach the first `n` bytes as a shared handle
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the number of buffered bytes.
    pub fn split_to(&mut self, n: usize) -> Bytes {
        self.buf.split_to(n).freeze()
    }

    /// Unconsumed bytes, front first
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of unconsumed bytes
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
