//! Serial reconnects: one session after another against the same target.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::heartbeat::{HEARTBEAT_INTERVAL, HeartbeatSession, SessionEnd};

/// What a finished loop did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Sessions that connected and ran to an end.
    pub sessions: u32,
    /// Whether the loop stopped early because of the interrupt.
    pub interrupted: bool,
}

/// Runs `reconnects` heartbeat sessions back to back.
#[derive(Clone, Debug)]
pub struct ReconnectLoop {
    id: u32,
    config: Arc<ConnectionConfig>,
    heartbeat_interval: Duration,
}

impl ReconnectLoop {
    /// Loop number `id` over the shared configuration.
    pub fn new(id: u32, config: Arc<ConnectionConfig>) -> Self {
        Self {
            id,
            config,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }

    /// Override the heartbeat interval of every session in this loop.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Loop number.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Run every session in order. Stops at the first failed dial or once
    /// `interrupt` fires; sessions never overlap.
    pub async fn run(self, interrupt: CancellationToken) -> Result<LoopReport> {
        let url = self.config.target_url();
        let mut report = LoopReport::default();

        for attempt in 1..=self.config.reconnects() {
            if interrupt.is_cancelled() {
                report.interrupted = true;
                break;
            }

            let session =
                HeartbeatSession::new(url.as_str()).with_interval(self.heartbeat_interval);
            let span = info_span!("session", loop_id = self.id, attempt);
            let end = session.run(&interrupt).instrument(span).await?;

            if end == SessionEnd::Interrupted {
                report.interrupted = true;
                break;
            }
            report.sessions += 1;
        }

        info!(
            loop_id = self.id,
            sessions = report.sessions,
            interrupted = report.interrupted,
            "reconnect loop finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(reconnects: u32) -> Arc<ConnectionConfig> {
        Arc::new(ConnectionConfig::new("127.0.0.1:1", 0.0, reconnects, 1).unwrap())
    }

    #[test]
    fn builder() {
        let l = ReconnectLoop::new(7, config(2)).with_heartbeat_interval(Duration::from_millis(5));
        assert_eq!(l.id(), 7);
        assert_eq!(l.heartbeat_interval, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn interrupted_loop_starts_nothing() {
        let interrupt = CancellationToken::new();
        interrupt.cancel();
        let report = ReconnectLoop::new(0, config(5)).run(interrupt).await.unwrap();
        assert_eq!(
            report,
            LoopReport {
                sessions: 0,
                interrupted: true
            }
        );
    }
}
