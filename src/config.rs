//! Server Configuration
//!
//! Centralized configuration with sensible defaults. There is no config
//! file and no environment lookup here; the binary fills this in from
//! command-line arguments.

use crate::{DEFAULT_ARENA_CAPACITY, DEFAULT_HOST, DEFAULT_PORT};

/// Configuration for one server instance.
///
/// Multi-core deployments run several independent instances, each with its
/// own `Config`; instances share nothing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on. Use 0 to let the kernel pick one.
    pub port: u16,

    /// Size in bytes of the value arena. The store accepts writes until
    /// this is exhausted.
    pub arena_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
        }
    }
}

impl Config {
    /// Returns the bind address as a `host:port` string.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:6379");
        assert_eq!(config.arena_capacity, 64 * 1024 * 1024);
    }
}
