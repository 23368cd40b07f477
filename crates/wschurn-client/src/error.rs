//! Client error types.
//!
//! Only process-terminating failures are errors here. A read or write
//! failure on an established connection ends that session and is reported
//! as a [`SessionEnd`](crate::heartbeat::SessionEnd) instead.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Fatal client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The initial WebSocket dial failed. Never retried.
    #[error("dial {url}: {source}")]
    Dial {
        /// Target that could not be reached.
        url: String,
        /// Underlying WebSocket/HTTP error.
        #[source]
        source: Box<tungstenite::Error>,
    },
    /// A reconnect loop task panicked or was cancelled.
    #[error("reconnect loop failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
