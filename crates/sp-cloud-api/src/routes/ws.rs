//! WebSocket endpoint for command and device event streaming.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::events::WsEvent;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    /// Only forward events for this device.
    pub device_id: Option<String>,
}

/// GET /api/v1/ws[?device_id=..]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> impl IntoResponse {
    let rx = state.event_tx.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, rx, params.device_id))
}

fn wanted(event: &WsEvent, device_id: Option<&str>) -> bool {
    device_id.is_none_or(|id| event.device_id() == id)
}

async fn stream_events(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<WsEvent>,
    device_id: Option<String>,
) {
    tracing::info!(device_id = ?device_id, "event stream opened");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) if wanted(&event, device_id.as_deref()) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "event not serializable");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(device_id = ?device_id, "event stream closed");
}
