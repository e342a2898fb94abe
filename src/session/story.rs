//! Act sequencer.
//!
//! A single spawned task drives the four acts strictly in order, executing
//! the injected script. Every wait races timer expiry, so a countdown hitting
//! zero stops the story wherever it is suspended. The task never holds the
//! session lock across an await; all mutation goes through coordinator
//! helpers that lock briefly.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::session::content::StoryStep;
use crate::session::coordinator;
use crate::session::puzzles::{CompletionFlags, PuzzleName};
use crate::room::manager::Room;

/// Narrative ending, a pure function of final story points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Redemption,
    Revenge,
    Neutral,
}

impl Ending {
    pub fn epilogue(self) -> &'static str {
        match self {
            Ending::Redemption => {
                "Zipho's message was delivered, but no one was hurt. Sometimes understanding is enough."
            }
            Ending::Revenge => "The symbolic message was left, but the cycle of hurt continues...",
            Ending::Neutral => "The bomb was defused. The past remains in the past.",
        }
    }
}

pub const REDEMPTION_THRESHOLD: i32 = 5;
pub const REVENGE_THRESHOLD: i32 = -5;

pub fn ending_for(story_points: i32) -> Ending {
    if story_points >= REDEMPTION_THRESHOLD {
        Ending::Redemption
    } else if story_points <= REVENGE_THRESHOLD {
        Ending::Revenge
    } else {
        Ending::Neutral
    }
}

/// Run the campaign for one room. Spawned by the coordinator once both
/// participants have pressed start and taken distinct roles.
pub async fn run(room: Arc<Room>) {
    let (campaign, mut completed_rx, mut expired_rx) = {
        let session = room.session.lock();
        (
            session.campaign(),
            session.subscribe_completion(),
            session.subscribe_expiry(),
        )
    };

    for script in &campaign.acts {
        coordinator::begin_act(&room, script.act);
        info!(room = %room.id, act = script.act.number(), "act begins");
        for step in &script.steps {
            match step {
                StoryStep::Beat { text, target, secs } => {
                    coordinator::emit_beat(&room, text, *target, *secs);
                }
                StoryStep::Pause { secs } => {
                    if !sleep_or_expire(*secs, &mut expired_rx).await {
                        return;
                    }
                }
                StoryStep::SetState(state) => coordinator::set_puzzle_state(&room, *state),
                StoryStep::Activate(name) => coordinator::activate_puzzle(&room, *name),
                StoryStep::AwaitComplete(name) => {
                    if !await_puzzle(*name, &mut completed_rx, &mut expired_rx).await {
                        return;
                    }
                }
                StoryStep::TimerDelta(delta) => {
                    if !coordinator::apply_timer_delta(&room, *delta) {
                        return;
                    }
                }
                StoryStep::AudioCue(cue) => coordinator::emit_audio_cue(&room, cue),
                StoryStep::Flashback(lines) => coordinator::show_flashback(&room, lines),
                StoryStep::SetFlag(flag) => coordinator::set_story_flag(&room, *flag),
            }
        }
    }

    coordinator::finish_campaign(&room);
}

/// Returns false if the timer expired before the delay elapsed.
async fn sleep_or_expire(secs: f64, expired_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs_f64(secs)) => true,
        _ = expired_rx.wait_for(|expired| *expired) => false,
    }
}

/// Suspend until `name` completes, racing timer expiry. Returns false on
/// expiry (or if the session was torn down).
async fn await_puzzle(
    name: PuzzleName,
    completed_rx: &mut watch::Receiver<CompletionFlags>,
    expired_rx: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        done = completed_rx.wait_for(|flags| flags.is_complete(name)) => done.is_ok(),
        _ = expired_rx.wait_for(|expired| *expired) => false,
    }
}
