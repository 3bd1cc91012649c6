//! RESP Protocol Implementation
//!
//! The wire protocol has two halves with very different shapes:
//!
//! - `parser`: decodes the array-of-bulk-strings framing clients send into
//!   zero-copy token views over the receive buffer.
//! - `reply`: encodes the full set of response frames (simple string,
//!   error, integer, bulk, null bulk, array header) into a pending-output
//!   buffer.
//!
//! Requests outside the array-of-bulk framing are not decoded; the parser
//! makes no progress on them and the connection is eventually torn down.

pub mod parser;
pub mod reply;

// Re-export commonly used types for convenience
pub use parser::CommandParser;
