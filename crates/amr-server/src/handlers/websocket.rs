//! `GET /ws/:run_id`: streams `snapshot.tick`, `telemetry.received`, and
//! `run.completed` envelopes to a connected dashboard as JSON text frames,
//! mirroring the teacher's session-bound WebSocket push.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::session::SessionManager;

pub async fn ws_handler(
    Path(run_id): Path<String>,
    State(sessions): State<SessionManager>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_run(socket, sessions, run_id))
}

async fn stream_run(mut socket: WebSocket, sessions: SessionManager, run_id: String) {
    let Some(handle) = sessions.get(&run_id).await else {
        let _ = socket
            .send(Message::Text(format!("{{\"error\":\"unknown run_id {run_id}\"}}")))
            .await;
        return;
    };

    let mut rx = handle.bus.subscribe(&["snapshot.tick", "telemetry.received", "run.completed"]);
    info!(run_id, "dashboard websocket attached");

    loop {
        tokio::select! {
            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => {
                        let finished = envelope.event_type == "run.completed";
                        let text = match envelope.to_json() {
                            Ok(text) => text,
                            Err(err) => {
                                warn!(run_id, %err, "failed to serialize envelope for websocket");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                        if finished {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    break;
                }
            }
        }
    }

    info!(run_id, "dashboard websocket detached");
}
