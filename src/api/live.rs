//! Live channel: one WebSocket connection is one polling session

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use super::handlers::AppState;
use crate::alerts::AlertError;
use crate::hub::ClientEvent;
use crate::scheduler::SessionId;

/// HTTP handler that upgrades the connection to WebSocket
pub async fn live_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single live connection after upgrade.
///
/// Polling starts on connect and stops on disconnect, together with any
/// alert rules the connection registered.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Join the hub before polling starts so no early reading is missed
    let mut events = state.hub.subscribe();
    let session_id = state.scheduler.start_session();

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward hub events to the WebSocket sink
    let sender_id = session_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(session_id = %sender_id, error = %e, "Failed to encode event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(session_id = %sender_id, "WebSocket sink closed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %sender_id, skipped, "Live viewer lagging, events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Receiver loop: process inbound messages
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_client_message(&state, &session_id, &text) {
                    tracing::warn!(session_id = %session_id, error = %e, "Rejected client message");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: stop polling, drop the session's rules, stop forwarding
    state.scheduler.end_session(&session_id);
    let dropped = state.alerts.registry().drop_owner(&session_id);
    send_task.abort();

    tracing::info!(session_id = %session_id, dropped_alerts = dropped, "Live session disconnected");
}

/// Apply one client-to-server message for a session
pub fn handle_client_message(
    state: &AppState,
    session_id: &SessionId,
    text: &str,
) -> Result<(), LiveError> {
    match serde_json::from_str::<ClientEvent>(text)? {
        ClientEvent::RegisterAlert(request) => {
            state.alerts.register(request.into(), session_id.clone())?;
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("Malformed client message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Alert rejected: {0}")]
    Alert(#[from] AlertError),
}
