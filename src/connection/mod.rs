//! Connection Management
//!
//! One [`Connection`] per accepted client: the non-blocking stream, the
//! registration token, the per-client [`ClientBuffer`], and the small
//! amount of state the event loop needs (close-after-flush, currently
//! registered interest).
//!
//! The stream is owned here and nowhere else, so the descriptor is released
//! on every teardown path when the `Connection` is dropped. All I/O is
//! non-blocking and edge-triggered: both drains run until the socket
//! reports `WouldBlock`, because a readiness edge is only delivered once.

pub mod buffer;

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

pub use buffer::{ClientBuffer, RX_CAPACITY};

/// How a read drain ended.
#[derive(Debug)]
pub enum ReadDrain {
    /// The socket is exhausted for this readiness cycle.
    WouldBlock,
    /// The receive buffer filled before the socket drained.
    BufferFull,
    /// The peer closed the connection (read returned 0).
    Closed,
    /// A fatal I/O error.
    Failed(io::Error),
}

/// How a write drain ended.
#[derive(Debug)]
pub enum WriteDrain {
    /// The pending output was written completely.
    Flushed,
    /// The kernel buffer filled; the remainder stays queued.
    Partial,
    /// A fatal I/O error.
    Failed(io::Error),
}

/// A single accepted client.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    token: Token,
    buffer: ClientBuffer,
    close_after_flush: bool,
    interest: Interest,
}

impl Connection {
    /// Wraps an accepted stream. The caller has already registered it for
    /// read readiness under `token`.
    pub fn new(stream: TcpStream, addr: SocketAddr, token: Token) -> Self {
        Self {
            stream,
            addr,
            token,
            buffer: ClientBuffer::new(),
            close_after_flush: false,
            interest: Interest::READABLE,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn buffer_mut(&mut self) -> &mut ClientBuffer {
        &mut self.buffer
    }

    pub fn has_pending_output(&self) -> bool {
        self.buffer.has_pending_output()
    }

    /// Marks the connection for teardown once its pending output drains.
    pub fn request_close(&mut self) {
        self.close_after_flush = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_after_flush
    }

    /// Reads from the socket into the receive-buffer tail until the socket
    /// would block, the buffer fills, the peer closes, or an error occurs.
    pub fn drain_read(&mut self) -> ReadDrain {
        loop {
            if self.buffer.is_full() {
                return ReadDrain::BufferFull;
            }
            let tail = self.buffer.writable_tail();
            match self.stream.read(tail) {
                Ok(0) => return ReadDrain::Closed,
                Ok(n) => self.buffer.advance_filled(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return ReadDrain::WouldBlock
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return ReadDrain::Failed(e),
            }
        }
    }

    /// Writes the pending output until it drains or the socket would block.
    /// Unsent bytes always stay queued; nothing is discarded.
    pub fn flush_pending(&mut self) -> WriteDrain {
        while self.buffer.has_pending_output() {
            match self.stream.write(self.buffer.pending_output()) {
                Ok(0) => {
                    return WriteDrain::Failed(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "socket accepted no bytes",
                    ))
                }
                Ok(n) => self.buffer.advance_output(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return WriteDrain::Partial,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return WriteDrain::Failed(e),
            }
        }
        WriteDrain::Flushed
    }

    /// Re-registers the stream so write readiness is only watched while
    /// output is actually queued.
    pub fn update_interest(&mut self, registry: &Registry) -> io::Result<()> {
        let wanted = if self.buffer.has_pending_output() {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };
        if wanted != self.interest {
            registry.reregister(&mut self.stream, self.token, wanted)?;
            self.interest = wanted;
        }
        Ok(())
    }

    /// Removes the stream from the registry ahead of teardown.
    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.stream)
    }
}
