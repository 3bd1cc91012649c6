//! Command Handler
//!
//! Receives the token views produced by the parser, matches the verb
//! case-insensitively, executes against the keyspace, and appends the
//! encoded response to the connection's pending-output buffer. Verb and
//! argument tokens are raw byte slices into the receive buffer; nothing is
//! copied except the SET path, which copies key and value into owned
//! storage.
//!
//! Per-command failures (wrong arity, unknown verb, arena exhaustion)
//! are answered inline with an error frame and the connection stays open.

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::protocol::reply;
use crate::storage::Keyspace;

/// What the event loop should do with the connection after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep serving the connection.
    Continue,
    /// Tear the connection down once pending output is flushed (QUIT).
    Close,
}

/// Executes commands against the keyspace it owns.
pub struct CommandHandler {
    store: Keyspace,
}

impl CommandHandler {
    /// Creates a handler with a keyspace backed by `arena_capacity` bytes
    /// of value storage.
    pub fn new(arena_capacity: usize) -> Self {
        Self {
            store: Keyspace::with_arena_capacity(arena_capacity),
        }
    }

    /// The keyspace, for inspection.
    pub fn store(&self) -> &Keyspace {
        &self.store
    }

    /// Executes one parsed command. The first token is the verb; the
    /// response frame is appended to `out`.
    pub fn execute(&mut self, tokens: &[&[u8]], out: &mut BytesMut) -> Disposition {
        let Some(verb) = tokens.first() else {
            reply::error(out, "ERR empty command");
            return Disposition::Continue;
        };
        let args = &tokens[1..];

        if verb.eq_ignore_ascii_case(b"GET") {
            self.cmd_get(args, out);
        } else if verb.eq_ignore_ascii_case(b"SET") {
            self.cmd_set(args, out);
        } else if verb.eq_ignore_ascii_case(b"PING") {
            self.cmd_ping(args, out);
        } else if verb.eq_ignore_ascii_case(b"ECHO") {
            self.cmd_echo(args, out);
        } else if verb.eq_ignore_ascii_case(b"DEL") {
            self.cmd_del(args, out);
        } else if verb.eq_ignore_ascii_case(b"EXISTS") {
            self.cmd_exists(args, out);
        } else if verb.eq_ignore_ascii_case(b"STRLEN") {
            self.cmd_strlen(args, out);
        } else if verb.eq_ignore_ascii_case(b"DBSIZE") {
            self.cmd_dbsize(args, out);
        } else if verb.eq_ignore_ascii_case(b"COMMAND") {
            // Sufficient stub for client handshakes.
            reply::array_header(out, 0);
        } else if verb.eq_ignore_ascii_case(b"QUIT") {
            reply::simple_string(out, "OK");
            return Disposition::Close;
        } else {
            debug!(
                verb = %String::from_utf8_lossy(verb),
                "unknown command"
            );
            reply::error(out, "ERR unknown command");
        }
        Disposition::Continue
    }

    /// SET key value
    fn cmd_set(&mut self, args: &[&[u8]], out: &mut BytesMut) {
        if args.len() != 2 {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        match self.store.set(args[0], args[1]) {
            Ok(()) => reply::simple_string(out, "OK"),
            Err(e) => {
                warn!(
                    requested = e.requested,
                    remaining = e.remaining,
                    "arena exhausted"
                );
                reply::error(out, "ERR out of memory");
            }
        }
    }

    /// GET key
    fn cmd_get(&self, args: &[&[u8]], out: &mut BytesMut) {
        if args.len() != 1 {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        match self.store.get(args[0]) {
            Some(value) => reply::bulk_string(out, value),
            None => reply::null_bulk_string(out),
        }
    }

    /// PING [msg]
    fn cmd_ping(&self, args: &[&[u8]], out: &mut BytesMut) {
        match args {
            [] => reply::simple_string(out, "PONG"),
            [msg] => reply::bulk_string(out, msg),
            _ => reply::error(out, "ERR wrong number of arguments"),
        }
    }

    /// ECHO msg
    fn cmd_echo(&self, args: &[&[u8]], out: &mut BytesMut) {
        match args {
            [msg] => reply::bulk_string(out, msg),
            _ => reply::error(out, "ERR wrong number of arguments"),
        }
    }

    /// DEL key [key ...]
    fn cmd_del(&mut self, args: &[&[u8]], out: &mut BytesMut) {
        if args.is_empty() {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        let removed = args.iter().filter(|key| self.store.remove(key)).count();
        reply::integer(out, removed as i64);
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[&[u8]], out: &mut BytesMut) {
        if args.is_empty() {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        let present = args.iter().filter(|key| self.store.contains(key)).count();
        reply::integer(out, present as i64);
    }

    /// STRLEN key
    fn cmd_strlen(&self, args: &[&[u8]], out: &mut BytesMut) {
        if args.len() != 1 {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        let len = self.store.get(args[0]).map_or(0, <[u8]>::len);
        reply::integer(out, len as i64);
    }

    /// DBSIZE
    fn cmd_dbsize(&self, args: &[&[u8]], out: &mut BytesMut) {
        if !args.is_empty() {
            reply::error(out, "ERR wrong number of arguments");
            return;
        }
        reply::integer(out, self.store.len() as i64);
    }
}
