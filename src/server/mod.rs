//! Event Loop Server
//!
//! A single-threaded, readiness-based server. One thread owns everything:
//! the listener, every connection, the keyspace, and the arena. The only
//! blocking call is the poll at the top of each cycle; all socket I/O is
//! non-blocking and registered edge-triggered, so the accept and read paths
//! drain until the kernel reports `WouldBlock`; an edge that is not
//! drained is an edge that never fires again.
//!
//! ## One cycle
//!
//! ```text
//! poll ──> listener readable?  accept until WouldBlock, register clients
//!     ──> client readable?    read until WouldBlock
//!                             parse loop: tokens ──> dispatch ──> responses
//!                             compact receive buffer
//!     ──> client writable?    flush queued output
//!     ──> flush, then re-register for write readiness if output remains
//! ```
//!
//! Pipelined commands arriving in one read are answered in order by one
//! aggregated write. A partial write keeps the remainder queued and adds
//! write interest; nothing is ever discarded.
//!
//! ## Failure policy
//!
//! Per-command errors are answered inline. Peer close, fatal socket
//! errors, and protocol violations (a receive buffer full with no parser
//! progress, meaning no single command can ever fit) cost exactly that
//! connection. Listener and poller failures end the loop.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::commands::{CommandHandler, Disposition};
use crate::config::Config;
use crate::connection::{Connection, ReadDrain, WriteDrain};
use crate::protocol::CommandParser;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
/// Connection tokens are allocated monotonically from here.
const FIRST_CLIENT: usize = 2;

const EVENT_CAPACITY: usize = 1024;

/// Errors that are fatal to the server as a whole.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address {addr}: {source}")]
    Addr {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("readiness facility failure: {0}")]
    Poll(#[source] io::Error),

    #[error("listener failure: {0}")]
    Listener(#[source] io::Error),
}

/// Sets the shutdown flag and wakes the poll, typically from a signal
/// handler thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
        let _ = self.waker.wake();
    }
}

/// The listening endpoint, the connection table, and the command handler,
/// driven by [`Server::run`].
pub struct Server {
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    handler: CommandHandler,
    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Server {
    /// Binds the listener and sets up the readiness facility. Fails on an
    /// unparseable address, a failed bind, or a failed poller creation,
    /// all unrecoverable at startup.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr: SocketAddr = config.bind_address().parse().map_err(|source| {
            ServerError::Addr {
                addr: config.bind_address(),
                source,
            }
        })?;

        let poll = Poll::new().map_err(ServerError::Poll)?;
        let mut listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ServerError::Listener)?;

        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(ServerError::Poll)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER).map_err(ServerError::Poll)?);

        Ok(Self {
            poll,
            listener,
            local_addr,
            connections: HashMap::new(),
            next_token: FIRST_CLIENT,
            handler: CommandHandler::new(config.arena_capacity),
            shutdown: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// The bound address; useful when the configured port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops the loop from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Runs the event loop until shutdown is signalled or the listener or
    /// poller fails.
    pub fn run(&mut self) -> Result<(), ServerError> {
        let mut events = Events::with_capacity(EVENT_CAPACITY);
        info!(addr = %self.local_addr, "listening");

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.poll.poll(&mut events, None) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ServerError::Poll(e)),
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_connections()?,
                    // The waker exists only to interrupt the poll; the
                    // shutdown flag is checked at the top of the loop.
                    WAKER => {}
                    token => self.service_connection(token, event),
                }
            }
        }

        self.teardown();
        Ok(())
    }

    /// Accepts until the listener would block. Edge-triggered: stopping
    /// early would strand queued connections until the next arrival.
    fn accept_connections(&mut self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!(client = %addr, error = %e, "failed to register connection");
                        continue;
                    }

                    debug!(client = %addr, token = token.0, "connection accepted");
                    self.connections
                        .insert(token, Connection::new(stream, addr, token));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ServerError::Listener(e)),
            }
        }
    }

    /// Services one readiness event for one connection: drain writes if
    /// writable, drain reads and run commands if readable, flush, update
    /// interest, and tear down if anything failed.
    fn service_connection(&mut self, token: Token, event: &Event) {
        let Some(conn) = self.connections.get_mut(&token) else {
            // Stale event for a connection already torn down this cycle.
            return;
        };

        let mut teardown = false;

        if event.is_writable() {
            if let WriteDrain::Failed(e) = conn.flush_pending() {
                debug!(client = %conn.peer_addr(), error = %e, "write failed");
                teardown = true;
            }
        }

        if !teardown && event.is_readable() {
            teardown = Self::service_readable(conn, &mut self.handler);
        }

        if !teardown && conn.has_pending_output() {
            if let WriteDrain::Failed(e) = conn.flush_pending() {
                debug!(client = %conn.peer_addr(), error = %e, "write failed");
                teardown = true;
            }
        }

        if !teardown && conn.close_requested() && !conn.has_pending_output() {
            teardown = true;
        }

        if !teardown {
            if let Err(e) = conn.update_interest(self.poll.registry()) {
                warn!(client = %conn.peer_addr(), error = %e, "reregister failed");
                teardown = true;
            }
        }

        if teardown {
            self.close_connection(token);
        }
    }

    /// Drains the socket and runs the parse/dispatch loop over whatever
    /// arrived. Returns true when the connection must be torn down.
    fn service_readable(conn: &mut Connection, handler: &mut CommandHandler) -> bool {
        loop {
            let socket_exhausted = match conn.drain_read() {
                ReadDrain::Closed => {
                    debug!(client = %conn.peer_addr(), "peer closed connection");
                    return true;
                }
                ReadDrain::Failed(e) => {
                    debug!(client = %conn.peer_addr(), error = %e, "read failed");
                    return true;
                }
                ReadDrain::WouldBlock => true,
                ReadDrain::BufferFull => false,
            };

            let (consumed, close) = Self::run_commands(conn, handler);
            if close {
                conn.request_close();
                // Anything still buffered or in flight is discarded; the
                // connection goes away once the reply is flushed.
                return false;
            }

            if conn.buffer_mut().is_full() && consumed == 0 {
                warn!(
                    client = %conn.peer_addr(),
                    "receive buffer full with no parser progress, closing"
                );
                return true;
            }

            if socket_exhausted {
                // Wait for the next readiness edge.
                return false;
            }
            // The buffer filled before the socket drained and compaction
            // freed space; keep draining.
        }
    }

    /// Runs the parser over the unconsumed receive region, dispatching each
    /// complete command, then compacts. Returns bytes consumed and whether
    /// a QUIT was executed.
    fn run_commands(conn: &mut Connection, handler: &mut CommandHandler) -> (usize, bool) {
        let (input, tx) = conn.buffer_mut().split_rx_tx();
        let mut parser = CommandParser::new(input);
        let mut tokens = Vec::with_capacity(8);
        let mut close = false;

        loop {
            let consumed = parser.try_parse_command(&mut tokens);
            if consumed == 0 {
                break;
            }
            trace!(tokens = tokens.len(), bytes = consumed, "command parsed");
            if handler.execute(&tokens, tx) == Disposition::Close {
                close = true;
                break;
            }
        }

        let consumed_total = parser.pos();
        conn.buffer_mut().consume(consumed_total);
        (consumed_total, close)
    }

    fn close_connection(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            if let Err(e) = conn.deregister(self.poll.registry()) {
                debug!(client = %conn.peer_addr(), error = %e, "deregister failed");
            }
            debug!(client = %conn.peer_addr(), "connection closed");
        }
        // Dropping the connection closes the descriptor.
    }

    /// Shutdown path: the listener stops accepting first, then every
    /// connection is released.
    fn teardown(&mut self) {
        info!(connections = self.connections.len(), "shutting down");

        if let Err(e) = self.poll.registry().deregister(&mut self.listener) {
            debug!(error = %e, "listener deregister failed");
        }

        let tokens: Vec<Token> = self.connections.keys().copied().collect();
        for token in tokens {
            self.close_connection(token);
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.connections.len())
            .finish()
    }
}
