//! Command Processing
//!
//! The dispatch layer between the parser and the keyspace: token views in,
//! encoded response frames out.
//!
//! ```text
//! parser tokens ──> CommandHandler ──> keyspace
//!                        │
//!                        └──> response frames into the pending buffer
//! ```
//!
//! Supported verbs: `GET`, `SET`, `PING`, `ECHO`, `DEL`, `EXISTS`,
//! `STRLEN`, `DBSIZE`, `COMMAND`, `QUIT`. Anything else is answered with
//! an error frame and the connection stays open.

pub mod handler;

// Re-export the main command handler
pub use handler::{CommandHandler, Disposition};
