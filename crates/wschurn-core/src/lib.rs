//! # wschurn-core
//!
//! Plumbing shared by the `wschurn` echo server and churn client.
//!
//! - [`ids`]: per-connection session identity used for log correlation
//! - [`time`]: wall-clock timestamps for heartbeat payloads
//! - [`logging`]: `tracing` subscriber setup
//! - [`shutdown`]: process-wide shutdown/interrupt coordination via `CancellationToken`

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod shutdown;
pub mod time;

pub use ids::SessionId;
pub use logging::{LogFormat, init_subscriber};
pub use shutdown::ShutdownCoordinator;
