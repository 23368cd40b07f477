//! Per-connection echo loop.
//!
//! A session reads a frame, writes it back unchanged, and repeats until the
//! peer goes away, an I/O error occurs, the server shuts down, or (for a
//! bounded session) the [`TimeoutGovernor`] deadline is reached.
//!
//! Once the deadline has passed no further message is echoed: the deadline
//! branch is polled before the read branch, and a frame that arrives at the
//! same moment is dropped in favour of the close frame.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wschurn_core::SessionId;

use crate::governor::{TimeoutGovernor, deadline_reached};

/// Close reason sent when a bounded session runs out of time.
pub const FAREWELL_REASON: &str = "time's up; goodbye!";

/// Close reason sent when the server is shutting down.
pub const SHUTDOWN_REASON: &str = "server shutting down";

/// Bounds on the close handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseTimings {
    /// Upper bound on writing the close frame.
    pub write_timeout: Duration,
    /// How long to wait for the peer's close acknowledgement.
    pub grace: Duration,
}

impl Default for CloseTimings {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(1),
            grace: Duration::from_secs(2),
        }
    }
}

/// Why an echo session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The deadline fired and the server sent a close frame.
    Expired,
    /// The server is shutting down and sent a close frame.
    Shutdown,
    /// The peer sent a close frame.
    PeerClosed,
    /// The stream ended without a close frame.
    Disconnected,
    /// Reading from the socket failed.
    ReadFailed,
    /// Writing the echo failed.
    WriteFailed,
}

enum Event {
    Shutdown,
    Expired,
    Frame(Option<Result<Message, axum::Error>>),
}

/// Echo loop for one accepted connection.
#[derive(Debug)]
pub struct EchoSession {
    id: SessionId,
    governor: Option<TimeoutGovernor>,
    shutdown: CancellationToken,
    timings: CloseTimings,
}

impl EchoSession {
    /// Session that echoes until the peer or the network gives up.
    pub fn unbounded(id: SessionId, shutdown: CancellationToken) -> Self {
        Self {
            id,
            governor: None,
            shutdown,
            timings: CloseTimings::default(),
        }
    }

    /// Session that is closed by the server once `governor` expires.
    pub fn bounded(id: SessionId, governor: TimeoutGovernor, shutdown: CancellationToken) -> Self {
        Self {
            governor: Some(governor),
            ..Self::unbounded(id, shutdown)
        }
    }

    /// Override the close handshake bounds.
    #[must_use]
    pub fn with_close_timings(mut self, timings: CloseTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Run the loop to completion on `socket`.
    pub async fn run(self, socket: &mut WebSocket) -> SessionEnd {
        let id = self.id;
        loop {
            if self.deadline_passed() {
                return self.close(socket, FAREWELL_REASON, SessionEnd::Expired).await;
            }

            let event = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => Event::Shutdown,
                () = deadline_reached(self.governor.as_ref()) => Event::Expired,
                frame = socket.recv() => Event::Frame(frame),
            };

            match event {
                Event::Shutdown => {
                    return self.close(socket, SHUTDOWN_REASON, SessionEnd::Shutdown).await;
                }
                Event::Expired => {
                    return self.close(socket, FAREWELL_REASON, SessionEnd::Expired).await;
                }
                Event::Frame(None) => {
                    info!(session_id = %id, "client disconnected");
                    return SessionEnd::Disconnected;
                }
                Event::Frame(Some(Err(e))) => {
                    warn!(session_id = %id, error = %e, "read failed");
                    return SessionEnd::ReadFailed;
                }
                Event::Frame(Some(Ok(Message::Close(frame)))) => {
                    let code = frame.as_ref().map(|f| f.code);
                    info!(session_id = %id, ?code, "client closed the connection");
                    // The protocol layer queues the close reply; the next read flushes it.
                    self.drain(socket).await;
                    return SessionEnd::PeerClosed;
                }
                Event::Frame(Some(Ok(message @ (Message::Text(_) | Message::Binary(_))))) => {
                    if self.deadline_passed() {
                        return self.close(socket, FAREWELL_REASON, SessionEnd::Expired).await;
                    }
                    let remaining = self.governor.as_ref().map(TimeoutGovernor::remaining);
                    info!(session_id = %id, ?remaining, "client still connected");
                    if let Err(e) = socket.send(message).await {
                        warn!(session_id = %id, error = %e, "write failed");
                        return SessionEnd::WriteFailed;
                    }
                }
                // Ping/pong are answered by the protocol layer.
                Event::Frame(Some(Ok(_))) => {}
            }
        }
    }

    fn deadline_passed(&self) -> bool {
        self.governor.as_ref().is_some_and(TimeoutGovernor::is_expired)
    }

    /// Send a normal-closure frame, then wait a bounded time for the peer to answer.
    async fn close(
        &self,
        socket: &mut WebSocket,
        reason: &'static str,
        end: SessionEnd,
    ) -> SessionEnd {
        info!(session_id = %self.id, reason, "closing connection");
        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: reason.into(),
        };
        let sent = socket.send(Message::Close(Some(frame)));
        match time::timeout(self.timings.write_timeout, sent).await {
            Ok(Ok(())) => self.drain(socket).await,
            Ok(Err(e)) => warn!(session_id = %self.id, error = %e, "failed to send close frame"),
            Err(_) => warn!(session_id = %self.id, "timed out sending close frame"),
        }
        end
    }

    /// Read and discard frames until the stream ends or the grace period runs out.
    async fn drain(&self, socket: &mut WebSocket) {
        let drained = time::timeout(self.timings.grace, async {
            while let Some(Ok(message)) = socket.recv().await {
                if let Message::Close(_) = message {
                    debug!(session_id = %self.id, "close acknowledged");
                }
            }
        })
        .await;
        if drained.is_err() {
            debug!(session_id = %self.id, "peer did not finish the close handshake");
        }
    }
}
