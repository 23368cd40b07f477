//! Parallel reconnect loops.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::heartbeat::HEARTBEAT_INTERVAL;
use crate::reconnect::ReconnectLoop;

/// Totals across every loop of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Loops that finished.
    pub loops: u32,
    /// Sessions completed across all loops.
    pub sessions: u32,
    /// Whether the run was cut short by the interrupt.
    pub interrupted: bool,
}

/// Launches `parallel` reconnect loops and waits for all of them.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    config: Arc<ConnectionConfig>,
    heartbeat_interval: Duration,
}

impl Orchestrator {
    /// Orchestrator over a validated configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config: Arc::new(config),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }

    /// Override the heartbeat interval used by every session.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Shared configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Run all loops to completion.
    ///
    /// The first fatal error is returned as soon as it is observed; dropping
    /// the set aborts the loops still running.
    pub async fn run(&self, interrupt: CancellationToken) -> Result<RunSummary> {
        let parallel = self.config.parallel();
        info!(
            url = %self.config.target_url(),
            parallel,
            reconnects = self.config.reconnects(),
            "starting reconnect loops"
        );

        let mut loops = JoinSet::new();
        for id in 0..parallel {
            let reconnect = ReconnectLoop::new(id, Arc::clone(&self.config))
                .with_heartbeat_interval(self.heartbeat_interval);
            let _ = loops.spawn(reconnect.run(interrupt.clone()));
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = loops.join_next().await {
            let report = match joined {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    warn!(error = %e, "reconnect loop failed; aborting the rest");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "reconnect loop task failed; aborting the rest");
                    return Err(e.into());
                }
            };
            summary.loops += 1;
            summary.sessions += report.sessions;
            summary.interrupted |= report.interrupted;
        }

        info!(
            loops = summary.loops,
            sessions = summary.sessions,
            interrupted = summary.interrupted,
            "all reconnect loops finished"
        );
        Ok(summary)
    }
}
