//! Counting `WebSocket` server used to observe client behaviour.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{RawQuery, State};
use axum::response::Response;
use axum::routing::get;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

/// What the server observed.
#[derive(Debug, Default)]
pub struct Stats {
    pub accepted: u32,
    pub active: u32,
    pub max_active: u32,
    pub heartbeats: u32,
    pub peer_closes: u32,
    pub queries: Vec<Option<String>>,
    /// Text payloads in arrival order, across all connections.
    pub payloads: Vec<String>,
    /// Per connection: accept instant and the instant the server started
    /// closing (or saw the connection end, if the client left first).
    pub windows: Vec<(Instant, Instant)>,
}

#[derive(Clone)]
struct HarnessState {
    stats: Arc<Mutex<Stats>>,
    hold: Option<Duration>,
}

/// A running harness server. Shut down on drop.
pub struct Harness {
    pub addr: SocketAddr,
    pub stats: Arc<Mutex<Stats>>,
    shutdown: CancellationToken,
}

impl Harness {
    /// Start a server that closes each connection after `hold`, or never
    /// when `hold` is `None`.
    pub async fn spawn(hold: Option<Duration>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(Mutex::new(Stats::default()));
        let app = Router::new().route("/ws", get(upgrade)).with_state(HarnessState {
            stats: Arc::clone(&stats),
            hold,
        });

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        drop(tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
        }));

        Self {
            addr,
            stats,
            shutdown,
        }
    }

    /// Poll until `check` holds, for at most five seconds.
    pub async fn wait_for(&self, check: impl Fn(&Stats) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !check(&self.stats.lock()) {
            assert!(Instant::now() < deadline, "condition not reached: {:?}", self.stats.lock());
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn upgrade(
    State(state): State<HarnessState>,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> Response {
    state.stats.lock().queries.push(query);
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve(mut socket: WebSocket, state: HarnessState) {
    let accepted_at = Instant::now();
    let mut closing_at = None;
    {
        let mut stats = state.stats.lock();
        stats.accepted += 1;
        stats.active += 1;
        stats.max_active = stats.max_active.max(stats.active);
    }

    let deadline = state.hold.map(|hold| Instant::now() + hold);
    loop {
        let next = match deadline {
            Some(deadline) => match timeout_at(deadline, socket.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    closing_at = Some(Instant::now());
                    let _ = socket
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::NORMAL,
                            reason: "done".into(),
                        })))
                        .await;
                    while let Some(Ok(_)) = socket.recv().await {}
                    break;
                }
            },
            None => socket.recv().await,
        };
        match next {
            Some(Ok(Message::Text(text))) => {
                let mut stats = state.stats.lock();
                stats.heartbeats += 1;
                stats.payloads.push(text.as_str().to_owned());
            }
            Some(Ok(Message::Close(_))) => {
                state.stats.lock().peer_closes += 1;
                // Reading again flushes the close reply.
                while let Some(Ok(_)) = socket.recv().await {}
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(_)) | None => break,
        }
    }

    let mut stats = state.stats.lock();
    stats.windows.push((accepted_at, closing_at.unwrap_or_else(Instant::now)));
    stats.active -= 1;
}

/// Start a server that completes the `WebSocket` handshake and then drops the
/// TCP stream without a close frame.
pub async fn spawn_dropping() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
    }));
    addr
}
