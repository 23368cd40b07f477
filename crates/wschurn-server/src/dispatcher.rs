//! `/ws` upgrade handling.
//!
//! The optional `timeout` query parameter (seconds, fractional allowed) is
//! validated before the upgrade. A bad value is answered with a plain HTTP
//! 500 and the connection is never upgraded, so no echo traffic can follow.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};
use wschurn_core::SessionId;

use crate::echo::EchoSession;
use crate::error::TimeoutParamError;
use crate::governor::TimeoutGovernor;
use crate::server::AppState;

/// Body of the response to an unparseable `timeout` parameter.
pub const INVALID_TIMEOUT_BODY: &str = "Cannot parse timeout value!";

/// Query parameters accepted on `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Requested session duration in seconds.
    pub timeout: Option<String>,
}

/// Interpret the raw `timeout` value.
///
/// `None` and zero both mean "no deadline".
pub fn parse_timeout(raw: Option<&str>) -> Result<Option<Duration>, TimeoutParamError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let invalid = || TimeoutParamError::Invalid(raw.to_owned());
    let secs: f64 = raw.trim().parse().map_err(|_| invalid())?;
    let duration = Duration::try_from_secs_f64(secs).map_err(|_| invalid())?;
    Ok((!duration.is_zero()).then_some(duration))
}

/// First message sent on every connection.
pub fn greeting(id: &SessionId) -> String {
    format!("Connected! Client ID: {id}")
}

/// Second message on a bounded connection.
pub fn closure_announcement(timeout: Duration) -> String {
    format!("Connection will be closed in {} seconds!", timeout.as_secs_f64())
}

/// GET /ws
pub(crate) async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let timeout = match parse_timeout(params.timeout.as_deref()) {
        Ok(timeout) => timeout,
        Err(e) => {
            warn!(error = %e, "rejecting connection");
            return (StatusCode::INTERNAL_SERVER_ERROR, INVALID_TIMEOUT_BODY).into_response();
        }
    };

    let id = SessionId::new();
    // Held for the life of the session so shutdown can wait for close frames.
    let tracked = state.sessions.token();
    ws.on_failed_upgrade(move |e| warn!(session_id = %id, error = %e, "upgrade failed"))
        .on_upgrade(move |socket| async move {
            let _tracked = tracked;
            serve_connection(socket, id, timeout, state).await;
        })
}

/// Greet the client and run the echo loop until the session ends.
async fn serve_connection(
    mut socket: WebSocket,
    id: SessionId,
    timeout: Option<Duration>,
    state: AppState,
) {
    // The deadline counts from acceptance, not from the end of the greeting.
    let governor = timeout.map(TimeoutGovernor::start);
    info!(session_id = %id, timeout = ?timeout, "client connected");

    if let Err(e) = socket.send(Message::Text(greeting(&id).into())).await {
        warn!(session_id = %id, error = %e, "failed to send greeting");
    }

    let session = match governor {
        Some(governor) => {
            let announcement = closure_announcement(governor.requested());
            if let Err(e) = socket.send(Message::Text(announcement.into())).await {
                warn!(session_id = %id, error = %e, "failed to announce closure");
            }
            EchoSession::bounded(id, governor, state.shutdown.clone())
        }
        None => EchoSession::unbounded(id, state.shutdown.clone()),
    };

    let end = session
        .with_close_timings(state.close_timings)
        .run(&mut socket)
        .await;
    info!(session_id = %id, ?end, "session closed");
}
