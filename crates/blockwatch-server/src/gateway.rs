//! Realtime gateway: WebSocket termination for notification delivery.
//!
//! Per-connection lifecycle: the bearer credential is verified before the
//! upgrade (a failed handshake never leaves partial registration state);
//! on success the connection is registered and confirmed, then two pump
//! tasks move frames until either side closes. Unregistration runs before
//! any other cleanup so the registry never holds a stale entry.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use blockwatch_core::UserId;
use blockwatch_realtime::{ClientFrame, ConnectionHandle, ServerFrame};

use crate::app::AppState;
use crate::auth::{bearer_token, Authenticator};

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer credential; alternative to the Authorization header
    token: Option<String>,
}

/// WebSocket handler for the notification channel
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let credential = params.token.or_else(|| {
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string)
    });

    let Some(credential) = credential else {
        warn!("Realtime handshake without credential");
        return (StatusCode::UNAUTHORIZED, "missing bearer credential").into_response();
    };

    match state.auth.authenticate(&credential).await {
        Ok(user_id) => ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)),
        Err(e) => {
            warn!(error = %e, "Realtime handshake rejected");
            metrics::counter!("blockwatch_handshake_failures_total").increment(1);
            (StatusCode::UNAUTHORIZED, "invalid credential").into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let (handle, mut outbound) = ConnectionHandle::new(user_id);
    let connection_id = handle.id();

    state.registry.register(handle.clone()).await;

    // Confirmation goes through the same channel as every other frame, so
    // it is always the first thing the client observes.
    handle.push(ServerFrame::connected(user_id));

    let (mut sink, mut stream) = socket.split();

    // Outbound pump: registry-fed frames toward the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match serde_json::to_string(&frame) {
                Ok(msg) => {
                    if sink.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to serialize frame");
                }
            }
        }
    });

    // Inbound pump: client frames (liveness probes, close)
    let probe_handle = handle.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Ping) => {
                        probe_handle.push(ServerFrame::pong());
                    }
                    Err(_) => trace!("Ignoring unrecognized client frame"),
                },
                Message::Ping(data) => {
                    // Transport-level pong is handled by axum
                    trace!("Received transport ping: {:?}", data);
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!(connection = %connection_id, "Send task completed");
        }
        _ = &mut recv_task => {
            debug!(connection = %connection_id, "Receive task completed");
        }
    }

    // Unregister before aborting the peer task: no other cleanup may
    // observe a registry that still lists this connection.
    state.registry.unregister(connection_id).await;
    send_task.abort();
    recv_task.abort();

    debug!(user = %user_id, connection = %connection_id, "Connection closed");
}
