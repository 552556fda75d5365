//! Configuration for SetCache
//!
//! Centralized server and client configuration with sensible defaults.

use std::time::Duration;

/// Well-known port the server binds to when not otherwise configured
pub const DEFAULT_PORT: u16 = 4557;

/// Convert a millisecond setting to a socket timeout (0 disables it)
pub(crate) fn timeout_from_ms(ms: u64) -> Option<Duration> {
    if ms > 0 {
        Some(Duration::from_millis(ms))
    } else {
        None
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for a SetCache server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address (host:port, port 0 picks an ephemeral port)
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for a SetCache client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname
    pub hostname: String,

    /// Server port (must match the server's bound port)
    pub port: u16,

    /// Max idle connections kept for reuse
    pub pool_size: usize,

    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Response read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Request write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: DEFAULT_PORT,
            pool_size: 8,
            connect_timeout_ms: 5000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The `host:port` string the client connects to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server hostname
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = hostname.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the number of idle connections kept for reuse
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
