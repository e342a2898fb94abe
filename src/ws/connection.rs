//! WebSocket connection lifecycle: token-checked upgrade, read/write loops,
//! command dispatch, disconnect bookkeeping. No game rule lives here; every
//! command goes straight to the coordinator.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::http::routes::AppState;
use crate::protocol::{ClientToServer, ServerToClient};
use crate::room::manager::Room;
use crate::session::coordinator;
use crate::util::token::verify_token;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(WsQuery { token }): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (tok_room, player_id) =
        verify_token(&token).map_err(|_| (StatusCode::UNAUTHORIZED, "invalid token".to_string()))?;
    if tok_room != room_id {
        return Err((StatusCode::UNAUTHORIZED, "token-room mismatch".to_string()));
    }
    let room = state
        .rooms
        .get(&room_id)
        .ok_or((StatusCode::NOT_FOUND, "room not found".to_string()))?;
    if !room.players.lock().contains_key(&player_id) {
        return Err((StatusCode::UNAUTHORIZED, "unknown player".to_string()));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(room, player_id, socket)))
}

async fn handle_socket(room: Arc<Room>, player_id: Uuid, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sv_tx, mut sv_rx) = mpsc::unbounded_channel::<ServerToClient>();

    room.connect(player_id, sv_tx.clone());
    room.broadcast(&ServerToClient::LobbyUpdate { lobby: room.lobby() });

    // forward server pushes to the socket
    tokio::spawn(async move {
        while let Some(msg) = sv_rx.recv().await {
            let Ok(text) = serde_json::to_string(&msg) else { continue };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let _ = sv_tx.send(ServerToClient::Welcome { player_id, lobby: room.lobby() });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(&text) {
                Ok(ClientToServer::Ping) => {
                    let _ = sv_tx.send(ServerToClient::Pong);
                }
                Ok(ClientToServer::PressStart) => coordinator::press_start(&room, player_id),
                Ok(ClientToServer::SelectRole { role }) => {
                    coordinator::select_role(&room, player_id, role)
                }
                Ok(ClientToServer::SubmitPuzzle { puzzle, answer }) => {
                    coordinator::submit_puzzle(&room, player_id, puzzle, &answer)
                }
                Ok(ClientToServer::MoralChoice { choice }) => {
                    coordinator::make_moral_choice(&room, player_id, choice)
                }
                Ok(ClientToServer::Chat { text }) => {
                    coordinator::relay_chat(&room, player_id, text)
                }
                Err(err) => {
                    let _ = sv_tx.send(ServerToClient::Error {
                        message: format!("bad message: {}", err),
                    });
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    room.disconnect(player_id);
    tracing::debug!(room = %room.id, %player_id, "ws closed");
    room.broadcast(&ServerToClient::LobbyUpdate { lobby: room.lobby() });
}
