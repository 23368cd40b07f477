//! # wschurn-client
//!
//! `WebSocket` churn client binary. Runs `parallel` reconnect loops of
//! `reconnects` heartbeat sessions each; ctrl-c closes live sessions and
//! stops the run.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use wschurn_client::{ConnectionConfig, Orchestrator};
use wschurn_core::{LogFormat, ShutdownCoordinator, init_subscriber};

/// `WebSocket` churn client.
#[derive(Parser, Debug)]
#[command(name = "wschurn-client", version, about)]
struct Cli {
    /// Server `host:port`.
    #[arg(long, env = "ADDR", default_value = "localhost:8080")]
    addr: String,

    /// Seconds the server should keep each session open (0 = until the
    /// client leaves).
    #[arg(long, env = "DURATION", default_value_t = 0.0)]
    duration: f64,

    /// Sessions each loop runs back to back.
    #[arg(
        long,
        env = "RECONNECTS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    reconnects: u32,

    /// Loops run concurrently.
    #[arg(
        long,
        env = "PARALLEL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    parallel: u32,

    /// Log level filter, overridden by `RUST_LOG`.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (`compact` or `json`).
    #[arg(long, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn connection_config(&self) -> Result<ConnectionConfig> {
        ConnectionConfig::new(self.addr.as_str(), self.duration, self.reconnects, self.parallel)
            .context("invalid client configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(&cli.log_level, cli.log_format);

    let config = cli.connection_config()?;
    let shutdown = ShutdownCoordinator::new();
    let ctrl_c = shutdown.listen_for_ctrl_c();

    let result = Orchestrator::new(config).run(shutdown.token()).await;

    // Release the ctrl-c listener.
    shutdown.shutdown();
    let _ = ctrl_c.await;

    let summary = result.context("client run failed")?;
    tracing::info!(
        loops = summary.loops,
        sessions = summary.sessions,
        interrupted = summary.interrupted,
        "done"
    );
    Ok(())
}
