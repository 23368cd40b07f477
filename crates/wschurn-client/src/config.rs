//! Connection configuration.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Path of the echo endpoint.
pub const WS_PATH: &str = "/ws";

/// Resolved client configuration.
///
/// Built once by the caller and shared read-only (behind an `Arc`) by every
/// reconnect loop and heartbeat session.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionConfig {
    address: String,
    duration: Option<Duration>,
    reconnects: u32,
    parallel: u32,
}

impl ConnectionConfig {
    /// Validate and build a configuration.
    ///
    /// `duration_secs` of zero means the server should never close the
    /// session on its own.
    pub fn new(
        address: impl Into<String>,
        duration_secs: f64,
        reconnects: u32,
        parallel: u32,
    ) -> Result<Self> {
        let address = address.into().trim().to_owned();
        if address.is_empty() {
            return Err(ClientError::InvalidConfig("address must not be empty".into()));
        }
        let duration = Duration::try_from_secs_f64(duration_secs).map_err(|_| {
            ClientError::InvalidConfig(format!(
                "duration must be a non-negative number of seconds, got {duration_secs}"
            ))
        })?;
        if reconnects == 0 {
            return Err(ClientError::InvalidConfig("reconnects must be at least 1".into()));
        }
        if parallel == 0 {
            return Err(ClientError::InvalidConfig("parallel must be at least 1".into()));
        }

        Ok(Self {
            address,
            duration: (!duration.is_zero()).then_some(duration),
            reconnects,
            parallel,
        })
    }

    /// `host:port` of the server.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Session duration requested from the server, if any.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Sessions each loop runs back to back.
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    /// Loops run concurrently.
    pub fn parallel(&self) -> u32 {
        self.parallel
    }

    /// `ws://<address>/ws`, with `?timeout=<secs>` when a duration is set.
    pub fn target_url(&self) -> String {
        match self.duration {
            Some(duration) => format!(
                "ws://{}{WS_PATH}?timeout={}",
                self.address,
                duration.as_secs_f64()
            ),
            None => format!("ws://{}{WS_PATH}", self.address),
        }
    }
}
