//! HTTP routes: health, create room, join room.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::manager::{RoomError, RoomManager};
use crate::session::content::Campaign;
use crate::util::token::issue_token;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub campaign: Arc<Campaign>,
    pub public_url: String,
}

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub share_url: String,
}

pub async fn create_room(State(state): State<AppState>) -> Json<CreateRoomResponse> {
    let room = state.rooms.create(state.campaign.clone());
    tracing::info!(room = %room.id, "room created");
    let share_url = format!("{}/{}", state.public_url.trim_end_matches('/'), room.id);
    Json(CreateRoomResponse { room_id: room.id.clone(), share_url })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub token: String,
    pub player_id: Uuid,
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, (StatusCode, String)> {
    let room = state
        .rooms
        .get(&room_id)
        .ok_or((StatusCode::NOT_FOUND, "room not found".to_string()))?;
    let player_id = room.add_player(req.name).map_err(room_error)?;
    let token = issue_token(&room_id, player_id).map_err(internal_error)?;
    Ok(Json(JoinRoomResponse { token, player_id }))
}

fn room_error(err: RoomError) -> (StatusCode, String) {
    let status = match err {
        RoomError::NotFound => StatusCode::NOT_FOUND,
        RoomError::Full => StatusCode::CONFLICT,
        RoomError::InvalidToken => StatusCode::UNAUTHORIZED,
    };
    (status, err.to_string())
}

pub(crate) fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
