//! `WebSocket` session: one per connected actor.
//!
//! Clients connect to `GET /ws` (optionally `?color=<tag>` to set a default
//! color for their cells). The session registers a bounded snapshot queue
//! with the [`SubscriberRegistry`](colony_core::SubscriberRegistry) and then
//! multiplexes two directions:
//!
//! - snapshots pushed by the broadcaster are written to the socket, each
//!   write bounded by the configured send timeout;
//! - inbound text frames are parsed and applied through the mutation
//!   gateway, and a rejected message gets an error frame back.
//!
//! A failed or timed-out write, a close frame, or process shutdown ends the
//! session and unregisters it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use colony_core::Snapshot;
use colony_grid::Color;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::protocol::{ClientMessage, Command, ServerFrame};
use crate::state::AppState;

/// Query parameters accepted on `GET /ws`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// Default color for cells this connection creates.
    pub color: Option<String>,
}

/// Upgrade an HTTP request to a `WebSocket` session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, query.color))
}

enum Outcome {
    Continue,
    Disconnect,
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, color: Option<String>) {
    let (tx, mut rx) = mpsc::channel::<Arc<Snapshot>>(state.limits.subscriber_queue.max(1));
    let id = state.registry.register(tx).await;
    debug!(subscriber = %id, "WebSocket client connected");

    let (default_color, warning) = connection_color(color);
    if let Some(frame) = warning {
        warn!(subscriber = %id, "Ignoring invalid connection color");
        if let Outcome::Disconnect = send_frame(&mut socket, &state, &frame).await {
            state.registry.unregister(id).await;
            return;
        }
    }

    let mut shutdown = state.shutdown.clone();
    loop {
        let outcome = tokio::select! {
            () = shutdown.wait() => {
                let _ = socket.send(Message::Close(None)).await;
                Outcome::Disconnect
            }
            snapshot = rx.recv() => match snapshot {
                Some(snapshot) => send_snapshot(&mut socket, &state, &snapshot).await,
                None => {
                    debug!(subscriber = %id, "Snapshot queue closed");
                    Outcome::Disconnect
                }
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match handle_text(&state, text.as_str(), default_color.as_ref()).await {
                        None => Outcome::Continue,
                        Some(frame) => send_frame(&mut socket, &state, &frame).await,
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        Outcome::Disconnect
                    } else {
                        Outcome::Continue
                    }
                }
                Some(Ok(Message::Close(_))) | None => Outcome::Disconnect,
                Some(Err(e)) => {
                    debug!(subscriber = %id, "WebSocket error: {e}");
                    Outcome::Disconnect
                }
                Some(Ok(_)) => Outcome::Continue,
            },
        };
        if let Outcome::Disconnect = outcome {
            break;
        }
    }

    state.registry.unregister(id).await;
    debug!(subscriber = %id, "WebSocket client disconnected");
}

/// Resolve the `?color=` query value. An invalid tag is dropped and
/// reported back as a warning frame.
fn connection_color(raw: Option<String>) -> (Option<Color>, Option<ServerFrame>) {
    match raw.map(Color::new).transpose() {
        Ok(color) => (color, None),
        Err(e) => {
            let frame = ServerFrame::Warning {
                message: format!("default color ignored: {e}"),
            };
            (None, Some(frame))
        }
    }
}

/// Apply one inbound text frame. Returns the error frame to send back when
/// the message is rejected.
async fn handle_text(
    state: &AppState,
    text: &str,
    default_color: Option<&Color>,
) -> Option<ServerFrame> {
    match apply(state, text, default_color).await {
        Ok(()) => None,
        Err(e) => {
            debug!(error = %e, "Rejected client message");
            Some(ServerFrame::Error {
                message: e.to_string(),
            })
        }
    }
}

async fn apply(state: &AppState, text: &str, default_color: Option<&Color>) -> Result<(), ApiError> {
    let command =
        ClientMessage::parse(text)?.into_command(default_color, state.limits.max_spawn_cells)?;
    match command {
        Command::Flip { x, y, color } => {
            state.gateway.flip(x, y, color).await?;
        }
        Command::Spawn {
            x,
            y,
            pattern,
            color,
        } => {
            state.gateway.spawn(x, y, &pattern, color.as_ref()).await?;
        }
    }
    Ok(())
}

async fn send_snapshot(socket: &mut WebSocket, state: &AppState, snapshot: &Snapshot) -> Outcome {
    match snapshot.to_frame() {
        Ok(json) => send_text(socket, state, json).await,
        Err(e) => {
            warn!("Failed to serialize snapshot: {e}");
            Outcome::Continue
        }
    }
}

async fn send_frame(socket: &mut WebSocket, state: &AppState, frame: &ServerFrame) -> Outcome {
    match frame.to_json() {
        Ok(json) => send_text(socket, state, json).await,
        Err(e) => {
            warn!("Failed to serialize frame: {e}");
            Outcome::Continue
        }
    }
}

async fn send_text(socket: &mut WebSocket, state: &AppState, json: String) -> Outcome {
    let send = socket.send(Message::Text(json.into()));
    match tokio::time::timeout(state.limits.send_timeout, send).await {
        Ok(Ok(())) => Outcome::Continue,
        Ok(Err(e)) => {
            debug!("WebSocket send failed: {e}");
            Outcome::Disconnect
        }
        Err(_) => {
            debug!(
                timeout_ms = state.limits.send_timeout.as_millis(),
                "WebSocket send timed out"
            );
            Outcome::Disconnect
        }
    }
}
