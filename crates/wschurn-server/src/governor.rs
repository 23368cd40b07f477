//! Session deadline tracking.

use std::time::Duration;

use tokio::time::{self, Instant};

/// Cap on how far out a deadline is placed. Larger requests would overflow
/// `Instant` and are treated as this far instead.
pub const MAX_DEADLINE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline for a bounded echo session.
///
/// The deadline is fixed when the governor is created and never moves; a new
/// connection gets a new governor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutGovernor {
    requested: Duration,
    deadline: Instant,
}

impl TimeoutGovernor {
    /// Start the clock now.
    pub fn start(requested: Duration) -> Self {
        Self::starting_at(Instant::now(), requested)
    }

    /// Start the clock at `start`.
    ///
    /// The deadline is `start + requested`, capped at [`MAX_DEADLINE`] after
    /// `start`; `requested` is kept as asked.
    pub fn starting_at(start: Instant, requested: Duration) -> Self {
        Self {
            requested,
            deadline: start + requested.min(MAX_DEADLINE),
        }
    }

    /// Duration the client asked for.
    pub fn requested(&self) -> Duration {
        self.requested
    }

    /// Absolute instant at which the session must stop echoing.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the deadline has been reached. Never blocks.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the deadline, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Resolves once the deadline is reached.
    pub async fn expired(&self) {
        time::sleep_until(self.deadline).await;
    }
}

/// Resolves when `governor`'s deadline is reached, or never for an unbounded session.
pub(crate) async fn deadline_reached(governor: Option<&TimeoutGovernor>) {
    match governor {
        Some(governor) => governor.expired().await,
        None => std::future::pending().await,
    }
}
