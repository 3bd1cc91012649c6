//! Per-Client Buffer Management
//!
//! Each connection owns one [`ClientBuffer`]: a fixed-size receive buffer
//! that incoming bytes are drained into, and a dynamic pending-output
//! buffer that encoded responses accumulate in until the next flush.
//!
//! TCP is a stream, so a single read may contain a partial command or many
//! pipelined commands. The receive side therefore works in cycles: drain
//! the socket into the tail, let the parser consume complete commands from
//! the front, then compact the unconsumed remainder back to offset zero so
//! the next read has the full tail available. If a compaction leaves the
//! buffer completely full, no single command can ever fit and the
//! connection is protocol-violating.

use bytes::{Buf, BytesMut};

/// Size of the fixed receive buffer. A command frame larger than this can
/// never be parsed and tears the connection down.
pub const RX_CAPACITY: usize = 4096;

/// Receive accumulator and pending-response accumulator for one client.
#[derive(Debug)]
pub struct ClientBuffer {
    /// Fixed receive buffer; `rx[..filled]` holds received, unconsumed bytes.
    rx: Box<[u8]>,
    filled: usize,
    /// Encoded responses waiting for the next flush.
    tx: BytesMut,
}

impl ClientBuffer {
    pub fn new() -> Self {
        Self {
            rx: vec![0u8; RX_CAPACITY].into_boxed_slice(),
            filled: 0,
            tx: BytesMut::new(),
        }
    }

    /// The writable tail of the receive buffer, for the next socket read.
    pub fn writable_tail(&mut self) -> &mut [u8] {
        &mut self.rx[self.filled..]
    }

    /// Records `n` bytes just read into the tail.
    pub fn advance_filled(&mut self, n: usize) {
        debug_assert!(self.filled + n <= RX_CAPACITY);
        self.filled += n;
    }

    /// True when the receive buffer has no room left for another read.
    pub fn is_full(&self) -> bool {
        self.filled == RX_CAPACITY
    }

    /// Received bytes not yet consumed by the parser.
    pub fn unconsumed(&self) -> &[u8] {
        &self.rx[..self.filled]
    }

    /// Borrows the unconsumed receive region and the pending-output buffer
    /// at the same time, so parsed token views can be dispatched while
    /// responses are appended.
    pub fn split_rx_tx(&mut self) -> (&[u8], &mut BytesMut) {
        (&self.rx[..self.filled], &mut self.tx)
    }

    /// Discards `n` parsed bytes from the front and compacts the unconsumed
    /// tail to offset zero.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.filled);
        if n == 0 {
            return;
        }
        self.rx.copy_within(n..self.filled, 0);
        self.filled -= n;
    }

    /// Encoded response bytes waiting to be written.
    pub fn pending_output(&self) -> &[u8] {
        &self.tx
    }

    pub fn has_pending_output(&self) -> bool {
        !self.tx.is_empty()
    }

    /// Drops `n` bytes from the front of the pending output after a
    /// (possibly partial) successful write.
    pub fn advance_output(&mut self, n: usize) {
        self.tx.advance(n);
    }
}

impl Default for ClientBuffer {
    fn default() -> Self {
        Self::new()
    }
}
