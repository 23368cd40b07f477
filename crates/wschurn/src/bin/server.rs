//! # wschurn-server
//!
//! `WebSocket` echo server binary. Serves `/ws` until ctrl-c, then closes
//! every live session with a close frame before exiting.

#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use wschurn_core::{LogFormat, ShutdownCoordinator, init_subscriber};
use wschurn_server::{EchoServer, ServerConfig};

/// `WebSocket` echo server with client-requested session timeouts.
#[derive(Parser, Debug)]
#[command(name = "wschurn-server", version, about)]
struct Cli {
    /// Host to bind (`*` for all interfaces).
    #[arg(long = "addr", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// How long a closing session waits for the client's close reply, in
    /// milliseconds.
    #[arg(long, default_value_t = 2000)]
    close_grace_ms: u64,

    /// Log level filter, overridden by `RUST_LOG`.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (`compact` or `json`).
    #[arg(long, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            close_grace_ms: self.close_grace_ms,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(&cli.log_level, cli.log_format);

    let config = cli.server_config();
    let drain_timeout =
        config.close_write_timeout() + config.close_grace() + Duration::from_secs(1);

    let shutdown = ShutdownCoordinator::new();
    let server = EchoServer::with_shutdown(config, shutdown.clone());
    let (addr, serve) = server.listen().await.with_context(|| {
        format!("failed to start echo server on {}", server.config().bind_address())
    })?;
    tracing::info!(%addr, "wschurn-server ready");

    let _ = shutdown.listen_for_ctrl_c().await;
    tracing::info!("Shutting down...");

    shutdown.graceful_shutdown(vec![serve], None).await;
    let _ = server.drain_sessions(drain_timeout).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
