//! In-memory accumulation of received body chunks.

use bytes::{Bytes, BytesMut};

/// Ordered, append-only collection of received chunks.
///
/// Chunks are stored as immutable [`Bytes`] handles in arrival order, so a
/// snapshot of the chunk list never observes a partially written chunk.
/// The running length is kept alongside so [`total_length`](Self::total_length)
/// is O(1).
///
/// [`drain`](Self::drain) consumes the accumulator; the whole payload is held
/// in memory until then.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    chunks: Vec<Bytes>,
    total: u64,
}

impl ByteAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty accumulator sized for an expected number of chunks.
    #[must_use]
    pub fn with_chunk_capacity(chunks: usize) -> Self {
        Self {
            chunks: Vec::with_capacity(chunks),
            total: 0,
        }
    }

    /// Appends a chunk after all previously received chunks.
    ///
    /// Empty chunks are accepted and do not change the length.
    pub fn append(&mut self, chunk: Bytes) {
        self.total = self.total.saturating_add(chunk.len() as u64);
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Returns the sum of all appended chunk lengths.
    #[must_use]
    pub fn total_length(&self) -> u64 {
        self.total
    }

    /// Returns the number of non-empty chunks held.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if no bytes have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Consumes the accumulator and returns the chunks concatenated in
    /// arrival order.
    #[must_use]
    pub fn drain(self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            // Single chunk: hand out the existing buffer without copying.
            1 => self.chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let capacity = usize::try_from(self.total).unwrap_or(usize::MAX);
                let mut joined = BytesMut::with_capacity(capacity);
                for chunk in self.chunks {
                    joined.extend_from_slice(&chunk);
                }
                joined.freeze()
            }
        }
    }

    /// Drops every accumulated chunk without producing output.
    pub fn discard(self) {
        drop(self);
    }
}
