//! # wschurn-server
//!
//! Axum `WebSocket` echo server for connection-churn testing.
//!
//! - `/ws` upgrade with an optional `timeout` query parameter (seconds)
//! - Unbounded sessions echo until the peer leaves
//! - Bounded sessions echo until their deadline, then send a normal-closure
//!   close frame
//! - Graceful shutdown via `CancellationToken`: every live session is closed
//!   with a close frame

#![deny(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod governor;
pub mod server;

pub use config::ServerConfig;
pub use echo::{CloseTimings, EchoSession, SessionEnd};
pub use error::{ServerError, TimeoutParamError};
pub use governor::TimeoutGovernor;
pub use server::EchoServer;
