//! # wschurn-client
//!
//! `WebSocket` churn client.
//!
//! - [`HeartbeatSession`]: one connection sending a timestamp every second
//! - [`ReconnectLoop`]: `reconnects` sessions run back to back
//! - [`Orchestrator`]: `parallel` loops run concurrently
//!
//! A single [`CancellationToken`](tokio_util::sync::CancellationToken) is the
//! interrupt for the whole run: live sessions close gracefully and no new
//! session starts once it fires.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod orchestrator;
pub mod reconnect;

pub use config::ConnectionConfig;
pub use error::{ClientError, Result};
pub use heartbeat::{HeartbeatSession, SessionEnd};
pub use orchestrator::{Orchestrator, RunSummary};
pub use reconnect::{LoopReport, ReconnectLoop};
