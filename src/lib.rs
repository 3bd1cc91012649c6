//! # EmberKV - An Arena-Backed In-Memory Key-Value Server
//!
//! EmberKV is an in-memory key-value store speaking a subset of the RESP
//! protocol over TCP. It targets very high request rates on a single CPU
//! core by keeping the entire request pipeline allocation-free where it
//! matters:
//!
//! - **Single-threaded event loop**: one thread, one blocking poll per
//!   cycle, edge-triggered readiness, non-blocking sockets. No locks
//!   anywhere.
//! - **Zero-copy parsing**: the RESP parser hands out token views into the
//!   per-client receive buffer; request bytes are never copied during
//!   parsing.
//! - **Arena-backed values**: stored values live contiguously in one
//!   pre-reserved region with bump-pointer allocation and no per-object
//!   free.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Event Loop (one thread)                    │
//! │                                                                  │
//! │  ┌──────────┐   ┌──────────────┐   ┌─────────────┐               │
//! │  │ Listener │──>│ ClientBuffer │──>│ CommandParser│              │
//! │  │ (accept) │   │  (rx drain)  │   │ (token views)│              │
//! │  └──────────┘   └──────────────┘   └──────┬──────┘               │
//! │                                           │                      │
//! │                                           ▼                      │
//! │  ┌──────────────┐   ┌────────────────────────────────┐           │
//! │  │ one write per│<──│ CommandHandler ──> Keyspace    │           │
//! │  │  cycle (tx)  │   │                      │         │           │
//! │  └──────────────┘   │                      ▼         │           │
//! │                     │            Arena (bump alloc)  │           │
//! │                     └────────────────────────────────┘           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scale-out across cores is running several independent instances; there
//! is no shared state to coordinate.
//!
//! ## Supported Commands
//!
//! `GET`, `SET`, `PING`, `ECHO`, `DEL`, `EXISTS`, `STRLEN`, `DBSIZE`,
//! `COMMAND`, `QUIT`. The keyspace is ephemeral: no persistence, no TTL,
//! no eviction. It grows until the arena is exhausted, after which writes
//! fail with an out-of-memory error and reads keep working.
//!
//! ## Quick Start
//!
//! ```no_run
//! use emberkv::{Config, Server};
//!
//! let config = Config::default();
//! let mut server = Server::bind(&config).unwrap();
//! server.run().unwrap();
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP request parsing and reply encoding
//! - [`storage`]: the arena allocator and the keyspace
//! - [`commands`]: command dispatch and handlers
//! - [`connection`]: per-client buffers and socket state
//! - [`server`]: the event loop
//! - [`config`]: server configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use protocol::CommandParser;
pub use server::{Server, ServerError, ShutdownHandle};
pub use storage::{Arena, Keyspace};

/// The default port the server listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host the server binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The default value-arena capacity (64 MiB)
pub const DEFAULT_ARENA_CAPACITY: usize = 64 * 1024 * 1024;

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
