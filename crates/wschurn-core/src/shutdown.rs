//! Shutdown and interrupt coordination via `CancellationToken`.
//!
//! One coordinator is installed per process. The client hands its token to
//! every reconnect loop and heartbeat session as the interrupt signal; the
//! server hands it to the listener and to every echo session.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default time to wait for tasks to drain before giving up.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide cancellation source.
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator that has not fired.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A clone of the cancellation token, for handing to tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fire the signal. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether the signal has fired.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fire the signal on the first ctrl-c.
    ///
    /// The listener task exits without firing if the coordinator is
    /// cancelled some other way first.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("interrupt received"),
                        Err(e) => warn!(error = %e, "failed to listen for ctrl-c, shutting down"),
                    }
                    token.cancel();
                }
                () = token.cancelled() => {}
            }
        })
    }

    /// Fire the signal, then wait up to `timeout` for `handles` to finish.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);

        self.shutdown();
        info!(
            task_count = handles.len(),
            timeout = ?timeout,
            "waiting for tasks to drain"
        );

        let drain = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, some tasks may still be running");
        }
    }
}
