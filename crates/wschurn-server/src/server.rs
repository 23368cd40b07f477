//! `EchoServer`: Axum router and listener.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use wschurn_core::ShutdownCoordinator;

use crate::config::ServerConfig;
use crate::dispatcher::ws_handler;
use crate::echo::CloseTimings;
use crate::error::{Result, ServerError};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cancelled when the server shuts down; every echo session watches it.
    pub shutdown: CancellationToken,
    /// Close handshake bounds applied to every session.
    pub close_timings: CloseTimings,
    /// Live echo sessions.
    pub sessions: TaskTracker,
}

/// The echo server.
pub struct EchoServer {
    config: ServerConfig,
    shutdown: ShutdownCoordinator,
    sessions: TaskTracker,
}

impl EchoServer {
    /// Create a server with its own shutdown coordinator.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_shutdown(config, ShutdownCoordinator::new())
    }

    /// Create a server driven by an existing shutdown coordinator.
    pub fn with_shutdown(config: ServerConfig, shutdown: ShutdownCoordinator) -> Self {
        Self {
            config,
            shutdown,
            sessions: TaskTracker::new(),
        }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        let state = AppState {
            shutdown: self.shutdown.token(),
            close_timings: CloseTimings {
                write_timeout: self.config.close_write_timeout(),
                grace: self.config.close_grace(),
            },
            sessions: self.sessions.clone(),
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>)> {
        let addr = self.config.bind_address();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => return Err(ServerError::Bind { addr, source }),
        };
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "echo server listening");

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            match served {
                Ok(()) => info!("echo server stopped"),
                Err(e) => error!(error = %e, "echo server failed"),
            }
        });

        Ok((local_addr, handle))
    }

    /// Number of echo sessions still running.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Wait up to `timeout` for every live session to finish its close
    /// handshake. Call after [`ShutdownCoordinator::shutdown`]; returns
    /// whether all sessions finished in time.
    pub async fn drain_sessions(&self, timeout: Duration) -> bool {
        let _ = self.sessions.close();
        let drained = tokio::time::timeout(timeout, self.sessions.wait()).await.is_ok();
        if !drained {
            warn!(remaining = self.sessions.len(), "sessions still open after drain timeout");
        }
        drained
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
