//! Server error types.

use thiserror::Error;

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The accept loop failed.
    #[error("server stopped: {0}")]
    Serve(#[from] std::io::Error),
}

/// The `timeout` query parameter could not be used as a session duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutParamError {
    /// Not a non-negative, finite number of seconds.
    #[error("cannot parse timeout value {0:?}")]
    Invalid(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
