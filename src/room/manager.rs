//! Room registry.
//!
//! A room binds at most two participants to exactly one session. Rooms are
//! ephemeral and memory-resident; the registry is a DashMap keyed by short
//! room id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::{LobbyPlayer, LobbyState, ServerToClient};
use crate::session::content::Campaign;
use crate::session::coordinator::Session;
use crate::session::roles::Role;
use crate::util::id::new_room_id;

#[derive(thiserror::Error, Debug)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
    #[error("room full")]
    Full,
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug)]
pub struct PlayerRecord {
    pub name: String,
    pub connected: bool,
    /// This participant's cumulative communication-style contribution.
    pub comm_contribution: i32,
    pub tx: Option<UnboundedSender<ServerToClient>>,
}

pub struct Room {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub players: Mutex<HashMap<Uuid, PlayerRecord>>,
    pub session: Mutex<Session>,
}

impl Room {
    fn new(campaign: Arc<Campaign>) -> Arc<Self> {
        Arc::new(Self {
            id: new_room_id(),
            created_at: OffsetDateTime::now_utc(),
            players: Mutex::new(HashMap::new()),
            session: Mutex::new(Session::new(campaign)),
        })
    }

    /// Register a participant; at most two per room.
    pub fn add_player(&self, name: String) -> Result<Uuid, RoomError> {
        let mut players = self.players.lock();
        if players.len() >= 2 {
            return Err(RoomError::Full);
        }
        let player_id = Uuid::new_v4();
        players.insert(
            player_id,
            PlayerRecord { name, connected: false, comm_contribution: 0, tx: None },
        );
        Ok(player_id)
    }

    /// Attach a push channel on websocket connect. Reconnecting with the
    /// same player id rebinds the same participant, role intact.
    pub fn connect(&self, player_id: Uuid, tx: UnboundedSender<ServerToClient>) -> bool {
        let mut players = self.players.lock();
        match players.get_mut(&player_id) {
            Some(p) => {
                p.connected = true;
                p.tx = Some(tx);
                true
            }
            None => false,
        }
    }

    pub fn disconnect(&self, player_id: Uuid) {
        let mut players = self.players.lock();
        if let Some(p) = players.get_mut(&player_id) {
            p.connected = false;
            p.tx = None;
        }
    }

    pub fn broadcast(&self, msg: &ServerToClient) {
        let players = self.players.lock();
        for p in players.values() {
            if let Some(tx) = &p.tx {
                let _ = tx.send(msg.clone());
            }
        }
    }

    pub fn send_to(&self, player_id: Uuid, msg: &ServerToClient) {
        let players = self.players.lock();
        if let Some(p) = players.get(&player_id) {
            if let Some(tx) = &p.tx {
                let _ = tx.send(msg.clone());
            }
        }
    }

    /// Role-partitioned push. A no-op while the role is unassigned.
    pub fn send_to_role(&self, role: Role, msg: &ServerToClient) {
        let target = self.session.lock().ledger.participant_with(role);
        if let Some(player_id) = target {
            self.send_to(player_id, msg);
        }
    }

    pub fn participant_ids(&self) -> Vec<Uuid> {
        self.players.lock().keys().copied().collect()
    }

    pub fn add_comm_contribution(&self, player_id: Uuid, delta: i32) {
        if delta == 0 {
            return;
        }
        let mut players = self.players.lock();
        if let Some(p) = players.get_mut(&player_id) {
            p.comm_contribution += delta;
        }
    }

    /// For chat relay: the sender's display name and the other participant.
    pub fn chat_peer(&self, sender: Uuid) -> Option<(String, Uuid)> {
        let players = self.players.lock();
        let from = players.get(&sender)?.name.clone();
        let other = players.keys().copied().find(|pid| *pid != sender)?;
        Some((from, other))
    }

    pub fn lobby(&self) -> LobbyState {
        let ids = self.participant_ids();
        let (roles, first_role_choice) = {
            let session = self.session.lock();
            let roles: Vec<(Uuid, Option<Role>, bool)> = ids
                .into_iter()
                .map(|pid| (pid, session.ledger.role_of(pid), session.pressed_start(pid)))
                .collect();
            (roles, session.ledger.first_choice())
        };
        let players = self.players.lock();
        let players = roles
            .into_iter()
            .filter_map(|(pid, role, pressed_start)| {
                players.get(&pid).map(|p| LobbyPlayer {
                    id: pid,
                    name: p.name.clone(),
                    connected: p.connected,
                    role,
                    pressed_start,
                })
            })
            .collect();
        LobbyState { room_id: self.id.clone(), players, first_role_choice }
    }
}

#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, Arc<Room>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, campaign: Arc<Campaign>) -> Arc<Room> {
        let room = Room::new(campaign);
        self.rooms.insert(room.id.clone(), room.clone());
        room
    }

    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| r.clone())
    }

    /// Drop rooms older than `max_age`; finished matches have no other
    /// teardown path.
    pub fn prune_old(&self, max_age: Duration) {
        let cutoff = OffsetDateTime::now_utc() - max_age;
        self.rooms.retain(|_, room| room.created_at > cutoff);
    }
}
