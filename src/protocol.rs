//! Wire messages: JSON-tagged command/event enums carried over the websocket,
//! plus the replicated read model (`StateSnapshot`) and lobby view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::puzzles::{Answer, PuzzleName};
use crate::session::roles::Role;
use crate::session::story::Ending;
use crate::session::{Act, PuzzleState, StoryFlags};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientToServer {
    Ping,
    PressStart,
    SelectRole { role: Role },
    SubmitPuzzle { puzzle: PuzzleName, answer: Answer },
    MoralChoice { choice: u8 },
    Chat { text: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerToClient {
    Welcome { player_id: Uuid, lobby: LobbyState },
    LobbyUpdate { lobby: LobbyState },
    Pong,
    FirstRoleChosen { role: Role },
    BothRolesChosen,
    EnterStory,
    StoryBeat { text: String, secs: f64 },
    Flashback { lines: Vec<FlashbackLine> },
    ActivatePuzzle { puzzle: PuzzleName, prompt: String },
    PuzzleSolved { puzzle: PuzzleName },
    PuzzleFailed { puzzle: PuzzleName, penalty_secs: f64 },
    MoralConflict,
    AudioCue { cue: String },
    StateChanged {
        #[serde(flatten)]
        snapshot: StateSnapshot,
    },
    Ending { kind: Ending, epilogue: String },
    GameOver { success: bool, timer_secs: u64 },
    Chat { from: String, text: String },
    Error { message: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FlashbackLine {
    pub text: String,
    pub secs: f64,
}

/// Replicated read model. The coordinator recomputes this after every
/// mutation and tick and broadcasts it only when it differs from the last
/// broadcast value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateSnapshot {
    pub act: Act,
    pub state: PuzzleState,
    pub timer_secs: u64,
    pub story_points: i32,
    pub communication_style: i32,
    pub flags: StoryFlags,
    pub completed: Vec<PuzzleName>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LobbyState {
    pub room_id: String,
    pub players: Vec<LobbyPlayer>,
    pub first_role_choice: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LobbyPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    pub role: Option<Role>,
    pub pressed_start: bool,
}
