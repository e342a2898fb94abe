//! Session coordinator.
//!
//! Sole entry point for client-originated commands and sole writer of
//! session state. Command handlers lock the room's session, reduce, compute
//! the outgoing events, drop the lock, then send; nothing awaits while the
//! lock is held. Replication is a snapshot diff: `state_changed` goes out
//! only when a replicated field actually changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::{FlashbackLine, ServerToClient, StateSnapshot};
use crate::room::manager::Room;
use crate::session::content::Campaign;
use crate::session::puzzles::{Answer, CompletionFlags, PuzzleBoard, PuzzleName, SubmitOutcome};
use crate::session::roles::{Role, RoleLedger, RoleOutcome};
use crate::session::story::{self, ending_for, Ending};
use crate::session::timer::BombTimer;
use crate::session::{Act, PuzzleState, StoryFlag, StoryFlags};

/// How often the authoritative timer is decremented.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Loss,
    Win(Ending),
}

/// Canonical per-match state. Owned by a `Room`, mutated only through the
/// functions in this module.
pub struct Session {
    campaign: Arc<Campaign>,
    pub ledger: RoleLedger,
    pub puzzles: PuzzleBoard,
    pub timer: BombTimer,
    start_pressed: Vec<Uuid>,
    pub session_started: bool,
    sequencer_started: bool,
    pub current_act: Act,
    pub puzzle_state: PuzzleState,
    pub story_points: i32,
    pub communication_style: i32,
    pub flags: StoryFlags,
    pub outcome: Option<GameOutcome>,
    last_broadcast: Option<StateSnapshot>,
    completed_tx: watch::Sender<CompletionFlags>,
    expired_tx: watch::Sender<bool>,
}

impl Session {
    pub fn new(campaign: Arc<Campaign>) -> Self {
        let (completed_tx, _) = watch::channel(CompletionFlags::default());
        let (expired_tx, _) = watch::channel(false);
        Self {
            puzzles: PuzzleBoard::new(&campaign.puzzles),
            timer: BombTimer::new(campaign.timer_secs),
            campaign,
            ledger: RoleLedger::new(),
            start_pressed: Vec::with_capacity(2),
            session_started: false,
            sequencer_started: false,
            current_act: Act::Act1Setup,
            puzzle_state: PuzzleState::IntroDialogue,
            story_points: 0,
            communication_style: 0,
            flags: StoryFlags::default(),
            outcome: None,
            last_broadcast: None,
            completed_tx,
            expired_tx,
        }
    }

    pub fn campaign(&self) -> Arc<Campaign> {
        self.campaign.clone()
    }

    pub fn subscribe_completion(&self) -> watch::Receiver<CompletionFlags> {
        self.completed_tx.subscribe()
    }

    pub fn subscribe_expiry(&self) -> watch::Receiver<bool> {
        self.expired_tx.subscribe()
    }

    pub fn pressed_start(&self, participant: Uuid) -> bool {
        self.start_pressed.contains(&participant)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            act: self.current_act,
            state: self.puzzle_state,
            timer_secs: self.timer.display_secs(),
            story_points: self.story_points,
            communication_style: self.communication_style,
            flags: self.flags,
            completed: self.puzzles.completed_flags().names(),
        }
    }
}

// ===== Client commands =====

/// First distinct press records; the second broadcasts `enter_story` exactly
/// once. Repeated presses by the same participant are no-ops.
pub fn press_start(room: &Arc<Room>, participant: Uuid) {
    let entered = {
        let mut session = room.session.lock();
        if session.outcome.is_some()
            || session.session_started
            || session.start_pressed.contains(&participant)
        {
            return;
        }
        session.start_pressed.push(participant);
        if session.start_pressed.len() == 2 {
            session.session_started = true;
            true
        } else {
            false
        }
    };
    room.broadcast(&ServerToClient::LobbyUpdate { lobby: room.lobby() });
    if entered {
        info!(room = %room.id, "both players pressed start");
        room.broadcast(&ServerToClient::EnterStory);
        maybe_start_sequencer(room);
    }
}

pub fn select_role(room: &Arc<Room>, participant: Uuid, role: Role) {
    let outcome = {
        let mut session = room.session.lock();
        if session.outcome.is_some() {
            return;
        }
        session.ledger.choose(participant, role)
    };
    match outcome {
        RoleOutcome::FirstChoiceRecorded(chosen) => {
            debug!(room = %room.id, ?chosen, "first role choice recorded");
            room.broadcast(&ServerToClient::FirstRoleChosen { role: chosen });
            room.broadcast(&ServerToClient::LobbyUpdate { lobby: room.lobby() });
        }
        RoleOutcome::BothChosen => {
            info!(room = %room.id, "both roles chosen");
            room.broadcast(&ServerToClient::BothRolesChosen);
            room.broadcast(&ServerToClient::LobbyUpdate { lobby: room.lobby() });
            maybe_start_sequencer(room);
        }
        RoleOutcome::Rejected => {}
    }
}

pub fn submit_puzzle(room: &Arc<Room>, participant: Uuid, name: PuzzleName, answer: &Answer) {
    let participants = room.participant_ids();
    let (outcome, expired_now, conflict_penalty) = {
        let mut session = room.session.lock();
        if session.outcome.is_some() || !session.session_started {
            return;
        }
        let role = session.ledger.role_of(participant);
        let outcome = session.puzzles.submit(participant, role, name, answer);
        let mut expired_now = false;
        let mut conflict_penalty = 0;
        match &outcome {
            SubmitOutcome::Solved { reward } => {
                session.story_points += reward;
                if name == PuzzleName::MoralChoice {
                    session.flags.moral_choice_complete = true;
                }
                let flags = session.puzzles.completed_flags();
                session.completed_tx.send_replace(flags);
            }
            SubmitOutcome::Failed { penalty_secs, comm_penalty } => {
                expired_now = session.timer.modify(-penalty_secs);
                session.communication_style += comm_penalty;
            }
            SubmitOutcome::AgreementConflict => {
                // the puzzle's comm penalty applies once per participant
                conflict_penalty = session.puzzles.spec(name).comm_penalty;
                session.communication_style += conflict_penalty * participants.len() as i32;
            }
            SubmitOutcome::AgreementPending | SubmitOutcome::Ignored => {}
        }
        (outcome, expired_now, conflict_penalty)
    };

    match outcome {
        SubmitOutcome::Solved { .. } => {
            info!(room = %room.id, puzzle = ?name, "puzzle solved");
            room.broadcast(&ServerToClient::PuzzleSolved { puzzle: name });
            broadcast_state_if_changed(room);
        }
        SubmitOutcome::Failed { penalty_secs, comm_penalty } => {
            debug!(room = %room.id, puzzle = ?name, penalty_secs, "wrong answer");
            room.add_comm_contribution(participant, comm_penalty);
            room.broadcast(&ServerToClient::PuzzleFailed { puzzle: name, penalty_secs });
            if expired_now {
                on_timer_expired(room);
            } else {
                broadcast_state_if_changed(room);
            }
        }
        SubmitOutcome::AgreementConflict => {
            info!(room = %room.id, "moral choice conflict");
            for pid in participants {
                room.add_comm_contribution(pid, conflict_penalty);
            }
            room.broadcast(&ServerToClient::MoralConflict);
            broadcast_state_if_changed(room);
        }
        SubmitOutcome::AgreementPending | SubmitOutcome::Ignored => {}
    }
}

/// Sugar for submitting to the moral-choice puzzle.
pub fn make_moral_choice(room: &Arc<Room>, participant: Uuid, choice: u8) {
    submit_puzzle(room, participant, PuzzleName::MoralChoice, &Answer::Choice(choice));
}

/// Chat bypasses the session state machine entirely: pure relay to the other
/// participant, processed at any phase.
pub fn relay_chat(room: &Arc<Room>, participant: Uuid, text: String) {
    let Some((from, other)) = room.chat_peer(participant) else {
        return;
    };
    room.send_to(other, &ServerToClient::Chat { from, text });
}

// ===== Sequencer and timer plumbing =====

fn maybe_start_sequencer(room: &Arc<Room>) {
    let start = {
        let mut session = room.session.lock();
        if session.session_started
            && session.ledger.both_chosen()
            && !session.sequencer_started
            && session.outcome.is_none()
        {
            session.sequencer_started = true;
            true
        } else {
            false
        }
    };
    if start {
        info!(room = %room.id, "match begins");
        tokio::spawn(story::run(room.clone()));
        tokio::spawn(tick_loop(room.clone()));
        broadcast_state_if_changed(room);
    }
}

/// The only writer of the countdown. Runs from match begin until the
/// session reaches a terminal outcome.
async fn tick_loop(room: Arc<Room>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately; consume it so the countdown
    // starts a full interval after the match begins
    interval.tick().await;
    loop {
        interval.tick().await;
        let expired_now = {
            let mut session = room.session.lock();
            if session.outcome.is_some() {
                break;
            }
            session.timer.tick(TICK_INTERVAL.as_secs_f64())
        };
        if expired_now {
            on_timer_expired(&room);
            break;
        }
        broadcast_state_if_changed(&room);
    }
}

fn on_timer_expired(room: &Arc<Room>) {
    {
        let mut session = room.session.lock();
        if session.outcome.is_some() {
            return;
        }
        session.outcome = Some(GameOutcome::Loss);
        session.puzzle_state = PuzzleState::GameEnd;
        session.expired_tx.send_replace(true);
    }
    info!(room = %room.id, "bomb timer expired, match lost");
    room.broadcast(&ServerToClient::GameOver { success: false, timer_secs: 0 });
    broadcast_state_if_changed(room);
}

// ===== Sequencer-facing helpers =====

pub fn begin_act(room: &Arc<Room>, act: Act) {
    {
        let mut session = room.session.lock();
        session.current_act = act;
        session.puzzle_state = PuzzleState::ActTransition;
    }
    broadcast_state_if_changed(room);
}

pub fn set_puzzle_state(room: &Arc<Room>, state: PuzzleState) {
    room.session.lock().puzzle_state = state;
    broadcast_state_if_changed(room);
}

pub fn set_story_flag(room: &Arc<Room>, flag: StoryFlag) {
    room.session.lock().flags.raise(flag);
    broadcast_state_if_changed(room);
}

pub fn emit_beat(room: &Arc<Room>, text: &str, target: Option<Role>, secs: f64) {
    let msg = ServerToClient::StoryBeat { text: text.to_string(), secs };
    match target {
        Some(role) => room.send_to_role(role, &msg),
        None => room.broadcast(&msg),
    }
}

pub fn show_flashback(room: &Arc<Room>, lines: &[(&str, f64)]) {
    let lines = lines
        .iter()
        .map(|(text, secs)| FlashbackLine { text: text.to_string(), secs: *secs })
        .collect();
    room.broadcast(&ServerToClient::Flashback { lines });
}

pub fn emit_audio_cue(room: &Arc<Room>, cue: &str) {
    room.broadcast(&ServerToClient::AudioCue { cue: cue.to_string() });
}

pub fn activate_puzzle(room: &Arc<Room>, name: PuzzleName) {
    let (office_prompt, bomb_prompt) = {
        let mut session = room.session.lock();
        let spec = session.puzzles.activate(name);
        (spec.office_prompt, spec.bomb_prompt)
    };
    debug!(room = %room.id, puzzle = ?name, "puzzle activated");
    room.send_to_role(
        Role::Office,
        &ServerToClient::ActivatePuzzle { puzzle: name, prompt: office_prompt.to_string() },
    );
    room.send_to_role(
        Role::Bomb,
        &ServerToClient::ActivatePuzzle { puzzle: name, prompt: bomb_prompt.to_string() },
    );
}

/// Returns false when the delta drove the timer to zero and ended the match.
pub fn apply_timer_delta(room: &Arc<Room>, delta: f64) -> bool {
    let expired_now = room.session.lock().timer.modify(delta);
    if expired_now {
        on_timer_expired(room);
        false
    } else {
        broadcast_state_if_changed(room);
        true
    }
}

pub fn finish_campaign(room: &Arc<Room>) {
    let (ending, timer_secs) = {
        let mut session = room.session.lock();
        if session.outcome.is_some() {
            return;
        }
        let ending = ending_for(session.story_points);
        session.puzzle_state = PuzzleState::GameEnd;
        session.timer.pause();
        session.outcome = Some(GameOutcome::Win(ending));
        (ending, session.timer.display_secs())
    };
    info!(room = %room.id, ?ending, "campaign complete");
    room.broadcast(&ServerToClient::Ending {
        kind: ending,
        epilogue: ending.epilogue().to_string(),
    });
    room.broadcast(&ServerToClient::GameOver { success: true, timer_secs });
    broadcast_state_if_changed(room);
}

/// Recompute the replicated snapshot and broadcast it only if it differs
/// from the last broadcast value.
///
/// The push channels are enqueued while the session lock is still held:
/// the commit to `last_broadcast` and the delivery order on each player
/// channel must agree, otherwise concurrent callers (tick loop, sequencer,
/// socket tasks) could hand a client an older snapshot after a newer one.
/// The sends are non-blocking, so nothing awaits under the lock.
pub fn broadcast_state_if_changed(room: &Arc<Room>) {
    let mut session = room.session.lock();
    let snapshot = session.snapshot();
    if session.last_broadcast.as_ref() == Some(&snapshot) {
        return;
    }
    session.last_broadcast = Some(snapshot.clone());
    room.broadcast(&ServerToClient::StateChanged { snapshot });
}
