//! Per-stream packet buffers.
//!
//! Every stream that has produced a packet owns one [`PacketBuffer`],
//! reused for all of that stream's packets. Buffers only ever grow; when a
//! packet does not fit, the buffer is replaced by one twice the packet's
//! size so that a run of slowly growing packets costs a handful of
//! allocations instead of one per packet.

use std::collections::HashMap;

/// Growable storage for the most recent packet of one stream.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    storage: Vec<u8>,
}

impl PacketBuffer {
    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The bytes written by the last [`fill`](PacketBuffer::fill).
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    /// Make room for `required` bytes.
    ///
    /// Reallocates to at least `2 × required` when short. Previous contents
    /// are discarded, not copied: every read overwrites the buffer in full
    /// before anything looks at it.
    pub fn ensure_capacity(&mut self, required: usize) {
        if self.storage.capacity() < required {
            self.storage = Vec::with_capacity(required.saturating_mul(2));
        }
    }

    /// Replace the contents with `payload`, growing first if needed.
    pub fn fill(&mut self, payload: &[u8]) -> &[u8] {
        self.ensure_capacity(payload.len());
        self.storage.clear();
        self.storage.extend_from_slice(payload);
        &self.storage
    }
}

/// All packet buffers of a session, keyed by stream index.
#[derive(Debug, Default)]
pub struct PacketBufferPool {
    buffers: HashMap<usize, PacketBuffer>,
}

impl PacketBufferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer for `stream_index`, created on first use and grown to hold
    /// at least `required` bytes.
    pub fn ensure_capacity(&mut self, stream_index: usize, required: usize) -> &mut PacketBuffer {
        let buffer = self.buffers.entry(stream_index).or_default();
        buffer.ensure_capacity(required);
        buffer
    }

    /// Copy `payload` into the buffer of `stream_index` and return a view of
    /// it. The view stays valid until the next store for the same stream.
    pub fn store(&mut self, stream_index: usize, payload: &[u8]) -> &[u8] {
        self.ensure_capacity(stream_index, payload.len()).fill(payload)
    }

    /// Capacity of the buffer for `stream_index`, if one exists.
    pub fn capacity(&self, stream_index: usize) -> Option<usize> {
        self.buffers.get(&stream_index).map(PacketBuffer::capacity)
    }

    /// Number of streams that own a buffer.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` when no stream owns a buffer.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Free every buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}
