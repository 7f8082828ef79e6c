pub mod handlers;
mod host;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, Directed, DisplayEvent, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use handlers::Session;

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

fn parse_role(role: Option<&str>) -> Role {
    match role {
        Some("host") => Role::Host,
        Some("display") => Role::Display,
        Some("spectator") => Role::Spectator,
        _ => Role::Player,
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let role = parse_role(params.role.as_deref());
    tracing::info!("WebSocket connection request from {}: role={:?}", addr, role);

    ws.on_upgrade(move |socket| handle_socket(socket, Session::new(role, addr.ip()), state))
}

/// Serialize and send one message; false once the socket is gone
async fn send_json<S, T>(sender: &mut S, msg: &T) -> bool
where
    S: SinkExt<Message> + Unpin,
    T: Serialize,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize outgoing message: {}", e);
            true
        }
    }
}

/// Receive from an optional subscription; pending forever when absent
async fn recv_optional<T: Clone>(
    rx: &mut Option<tokio::sync::broadcast::Receiver<T>>,
) -> Result<T, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, mut session: Session, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket connected with role: {:?}", session.role);

    // Subscribe before sending the snapshot so nothing falls in between
    let mut broadcast_rx = state.broadcast.subscribe();
    let mut direct_rx = state.direct.subscribe();
    let mut display_rx = (session.role == Role::Display).then(|| state.display.subscribe());

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role: session.role,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }
    if !send_json(&mut sender, &ServerMessage::Info(state.info().await)).await {
        return;
    }
    if session.role == Role::Display {
        let lobby = DisplayEvent::Lobby {
            players: state.roster().await,
        };
        if !send_json(&mut sender, &lobby).await {
            return;
        }
    }

    loop {
        tokio::select! {
            // Messages for every client
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Client lagged, skipped {} broadcasts", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Messages for one player, kept only if they are for us
            direct_msg = direct_rx.recv() => {
                match direct_msg {
                    Ok(Directed { to, msg }) if session.player_id() == Some(to) => {
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Client lagged, skipped {} direct messages", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Display sink events
            display_msg = recv_optional(&mut display_rx) => {
                match display_msg {
                    Ok(event) => {
                        if !send_json(&mut sender, &event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Display lagged, skipped {} events", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &mut session, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };
                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!(
        "WebSocket connection closed for role: {:?} ({:?})",
        session.role,
        session.participant.map(|p| p.wire_id())
    );
}
