//! Server-authoritative session core: role ledger, puzzle engine, bomb timer,
//! act sequencer and the coordinator that composes them.

pub mod content;
pub mod coordinator;
pub mod puzzles;
pub mod roles;
pub mod story;
pub mod timer;

use serde::{Deserialize, Serialize};

/// One of the four ordered phases of the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Act {
    Act1Setup,
    Act2Reaction,
    Act3Action,
    Act4Resolution,
}

impl Act {
    pub fn number(self) -> u8 {
        match self {
            Act::Act1Setup => 1,
            Act::Act2Reaction => 2,
            Act::Act3Action => 3,
            Act::Act4Resolution => 4,
        }
    }
}

/// Pacing state replicated to both clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleState {
    IntroDialogue,
    PuzzleSolving,
    StoryReveal,
    ActTransition,
    GameEnd,
}

/// Story-progress flags set by the sequencer as revelations land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoryFlags {
    pub flashback_revealed: bool,
    pub motivation_known: bool,
    pub final_choice_unlocked: bool,
    pub moral_choice_complete: bool,
}

/// A single flag the act script can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryFlag {
    FlashbackRevealed,
    MotivationKnown,
    FinalChoiceUnlocked,
}

impl StoryFlags {
    pub fn raise(&mut self, flag: StoryFlag) {
        match flag {
            StoryFlag::FlashbackRevealed => self.flashback_revealed = true,
            StoryFlag::MotivationKnown => self.motivation_known = true,
            StoryFlag::FinalChoiceUnlocked => self.final_choice_unlocked = true,
        }
    }
}
