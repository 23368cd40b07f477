//! One client connection with a periodic heartbeat.
//!
//! Each session runs two tasks: a reader that logs every inbound frame, and
//! the foreground loop that owns the write half. The reader fires a one-shot
//! completion token (through a drop guard, so every exit path fires it) and
//! the foreground loop stops on whichever comes first:
//!
//! - completion: the server closed the connection or a read failed
//! - heartbeat tick: send the current timestamp; stop if the write fails
//! - interrupt: send a normal-closure close frame and stop

use std::fmt;
use std::time::Duration;

use futures::stream::SplitStream;
use futures::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wschurn_core::time::now_timestamp;

use crate::error::{ClientError, Result};

/// Time between heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// How long an interrupted session waits for the server's close reply.
pub const CLOSE_GRACE: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a heartbeat session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the connection, or reading from it failed.
    PeerClosed,
    /// Sending a heartbeat failed.
    WriteFailed,
    /// The interrupt fired.
    Interrupted,
}

/// A single connection to the echo endpoint.
#[derive(Clone, Debug)]
pub struct HeartbeatSession {
    url: String,
    interval: Duration,
    close_grace: Duration,
}

impl HeartbeatSession {
    /// Session against `url` with the default heartbeat interval.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interval: HEARTBEAT_INTERVAL,
            close_grace: CLOSE_GRACE,
        }
    }

    /// Override the heartbeat interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override how long an interrupted session waits for the close reply.
    #[must_use]
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and run until the session ends.
    ///
    /// A failed dial is returned as [`ClientError::Dial`]; callers treat it
    /// as fatal. Every other failure ends the session and is reported as a
    /// [`SessionEnd`].
    pub async fn run(&self, interrupt: &CancellationToken) -> Result<SessionEnd> {
        info!(url = %self.url, "connecting");
        let connected = tokio::select! {
            biased;
            () = interrupt.cancelled() => {
                info!(url = %self.url, "interrupted before connecting");
                return Ok(SessionEnd::Interrupted);
            }
            connected = connect_async(self.url.as_str()) => connected,
        };
        let (ws, _response) = connected.map_err(|e| ClientError::Dial {
            url: self.url.clone(),
            source: Box::new(e),
        })?;
        info!(url = %self.url, "connected");

        let (mut sink, stream) = ws.split();
        let done = CancellationToken::new();
        let reader = tokio::spawn(read_inbound(stream, done.clone()));

        let end = self.drive(&mut sink, &done, interrupt).await;

        // Releasing both halves closes the socket.
        reader.abort();
        let _ = reader.await;
        drop(sink);

        info!(url = %self.url, ?end, "session ended");
        Ok(end)
    }

    /// Foreground half of a session: send heartbeats on `sink` until `done`
    /// fires, `interrupt` fires, or a write fails.
    async fn drive<S>(
        &self,
        sink: &mut S,
        done: &CancellationToken,
        interrupt: &CancellationToken,
    ) -> SessionEnd
    where
        S: Sink<Message> + Unpin,
        S::Error: fmt::Display,
    {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = done.cancelled() => return SessionEnd::PeerClosed,
                () = interrupt.cancelled() => {
                    info!(url = %self.url, "interrupt");
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    };
                    match sink.send(Message::Close(Some(frame))).await {
                        Ok(()) => {
                            if time::timeout(self.close_grace, done.cancelled()).await.is_err() {
                                debug!(url = %self.url, "server did not acknowledge close");
                            }
                        }
                        Err(e) => warn!(url = %self.url, error = %e, "write close failed"),
                    }
                    return SessionEnd::Interrupted;
                }
                _ = ticker.tick() => {
                    if let Err(e) = sink.send(Message::text(now_timestamp())).await {
                        warn!(url = %self.url, error = %e, "write failed");
                        return SessionEnd::WriteFailed;
                    }
                }
            }
        }
    }
}

/// Log inbound frames until the stream ends or fails.
async fn read_inbound(mut stream: SplitStream<WsStream>, done: CancellationToken) {
    let _done = done.drop_guard();
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => info!(payload = text.as_str(), "recv"),
            Ok(Message::Binary(bytes)) => info!(len = bytes.len(), "recv binary"),
            Ok(Message::Close(frame)) => {
                let code = frame.as_ref().map(|f| u16::from(f.code));
                let reason = frame.as_ref().map(|f| f.reason.as_str().to_owned());
                info!(?code, ?reason, "server closed the connection");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "read failed");
                return;
            }
        }
    }
}
