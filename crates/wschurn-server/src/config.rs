//! Server configuration.

use std::time::Duration;

/// Configuration for the echo server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`). `"*"` or an empty string binds all interfaces.
    pub host: String,
    /// Port to bind (default `8080`, `0` for auto-assign).
    pub port: u16,
    /// Upper bound on writing a close frame, in milliseconds.
    pub close_write_timeout_ms: u64,
    /// How long to wait for the peer to acknowledge a close frame, in milliseconds.
    pub close_grace_ms: u64,
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        let host = match self.host.trim() {
            "" | "*" => "0.0.0.0",
            host => host,
        };
        format!("{host}:{}", self.port)
    }

    /// Close-frame write timeout as a `Duration`.
    pub fn close_write_timeout(&self) -> Duration {
        Duration::from_millis(self.close_write_timeout_ms)
    }

    /// Close handshake grace period as a `Duration`.
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            close_write_timeout_ms: 1_000,
            close_grace_ms: 2_000,
        }
    }
}
