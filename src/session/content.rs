//! Injected campaign data: puzzle definitions and the four-act script.
//!
//! This is content, not logic. The sequencer and puzzle engine consume it
//! blindly; swapping the campaign swaps the game.

use crate::session::puzzles::{Expected, PuzzleName, PuzzleSpec};
use crate::session::roles::Role;
use crate::session::{Act, PuzzleState, StoryFlag};

/// Default countdown: ten minutes.
pub const DEFAULT_TIMER_SECS: f64 = 600.0;

/// One step of an act script. Beats are fire-and-forget: the display
/// auto-hides downstream after `secs`, the sequencer only waits where the
/// script says `Pause`.
#[derive(Debug, Clone)]
pub enum StoryStep {
    Beat {
        text: &'static str,
        target: Option<Role>,
        secs: f64,
    },
    Pause {
        secs: f64,
    },
    SetState(PuzzleState),
    Activate(PuzzleName),
    AwaitComplete(PuzzleName),
    TimerDelta(f64),
    AudioCue(&'static str),
    Flashback(&'static [(&'static str, f64)]),
    SetFlag(StoryFlag),
}

#[derive(Debug, Clone)]
pub struct ActScript {
    pub act: Act,
    pub steps: Vec<StoryStep>,
}

#[derive(Debug, Clone)]
pub struct Campaign {
    pub timer_secs: f64,
    pub puzzles: Vec<PuzzleSpec>,
    pub acts: Vec<ActScript>,
}

const FLASHBACK_LINES: &[(&str, f64)] = &[
    ("10 years ago...", 2.0),
    (
        "'You'll never amount to anything, Zipho. You're just not smart enough.'",
        4.0,
    ),
    ("- Mr. Du Plessis", 2.0),
];

impl Campaign {
    /// The St Francis College bomb scenario.
    pub fn standard() -> Self {
        Self {
            timer_secs: DEFAULT_TIMER_SECS,
            puzzles: puzzle_specs(),
            acts: vec![act1_setup(), act2_reaction(), act3_action(), act4_resolution()],
        }
    }
}

fn puzzle_specs() -> Vec<PuzzleSpec> {
    vec![
        PuzzleSpec {
            name: PuzzleName::LightSwitch,
            submitter: Some(Role::Bomb),
            expected: Expected::Sequence(&[2, 4, 1, 3]),
            reward: 1,
            penalty_secs: 5.0,
            comm_penalty: 0,
            office_prompt: "The breaker panel shows the restore order: 2, 4, 1, 3. Your partner is in the dark.",
            bomb_prompt: "Four switches, no labels. Flip them in the order your partner reads out.",
        },
        PuzzleSpec {
            name: PuzzleName::AnagramAct1,
            submitter: Some(Role::Office),
            expected: Expected::Text("NOTSMARTENOUGH"),
            reward: 1,
            penalty_secs: 10.0,
            comm_penalty: -1,
            office_prompt: "Unscramble the message your partner reads from the bomb casing and type it in.",
            bomb_prompt: "Letters scratched into the casing: TRAMSOUTHENONG. Read them to your partner.",
        },
        PuzzleSpec {
            name: PuzzleName::PeriodicTable,
            submitter: Some(Role::Office),
            expected: Expected::Text("GENIUS"),
            reward: 1,
            penalty_secs: 10.0,
            comm_penalty: 0,
            office_prompt: "Mr. Du Plessis's access code is spelled by element symbols. You have the periodic table.",
            bomb_prompt: "The bomb display cycles four numbers: 32, 28, 92, 16. Atomic numbers, maybe.",
        },
        PuzzleSpec {
            name: PuzzleName::WireCut,
            submitter: Some(Role::Bomb),
            expected: Expected::Text("RED"),
            reward: 1,
            penalty_secs: 20.0,
            comm_penalty: 0,
            office_prompt: "The defusal manual: cut the wire matching the colour of Zipho's old school tie.",
            bomb_prompt: "Four wires: red, blue, yellow, green. Cut exactly one.",
        },
        PuzzleSpec {
            name: PuzzleName::ChalkCode,
            submitter: Some(Role::Bomb),
            expected: Expected::Text("ZIPHO"),
            reward: 1,
            penalty_secs: 5.0,
            comm_penalty: -1,
            office_prompt: "A phrase is chalked on the classroom board, one letter circled per word. Read the circles.",
            bomb_prompt: "The keypad wants a five-letter name. Your partner can see the board.",
        },
        PuzzleSpec {
            name: PuzzleName::BombRiddle,
            submitter: Some(Role::Bomb),
            expected: Expected::Sequence(&[3, 1, 4, 2]),
            reward: 1,
            penalty_secs: 15.0,
            comm_penalty: 0,
            office_prompt: "The riddle's answer orders the buttons: third, first, fourth, second.",
            bomb_prompt: "Four buttons and a riddle you can't read from your side. Press them in your partner's order.",
        },
        PuzzleSpec {
            name: PuzzleName::MoralChoice,
            submitter: None,
            expected: Expected::Agreement,
            reward: 0, // weight comes from the agreed choice index
            penalty_secs: 0.0,
            comm_penalty: -1,
            office_prompt: "Choose together: neutralize everything (1) or leave Zipho's message for Mr. Du Plessis (2).",
            bomb_prompt: "Choose together: neutralize everything (1) or leave Zipho's message for Mr. Du Plessis (2).",
        },
    ]
}

fn act1_setup() -> ActScript {
    ActScript {
        act: Act::Act1Setup,
        steps: vec![
            StoryStep::SetState(PuzzleState::IntroDialogue),
            StoryStep::Beat {
                text: "A bomb has been planted at St Francis College...",
                target: Some(Role::Office),
                secs: 3.0,
            },
            StoryStep::Beat {
                text: "You must work together to defuse it before time runs out.",
                target: Some(Role::Bomb),
                secs: 3.0,
            },
            StoryStep::Pause { secs: 4.0 },
            StoryStep::SetState(PuzzleState::PuzzleSolving),
            StoryStep::Beat {
                text: "The security system has been tampered with. Restore power to see the bomb clearly.",
                target: Some(Role::Office),
                secs: 2.0,
            },
            StoryStep::Activate(PuzzleName::LightSwitch),
            StoryStep::AwaitComplete(PuzzleName::LightSwitch),
            StoryStep::SetState(PuzzleState::StoryReveal),
            StoryStep::Beat {
                text: "Security footage shows a figure entering the building... someone familiar with the layout.",
                target: Some(Role::Office),
                secs: 4.0,
            },
            StoryStep::Beat {
                text: "There's a message scratched on the bomb... 'TRAMSOUTHENONG'",
                target: Some(Role::Bomb),
                secs: 3.0,
            },
            StoryStep::SetState(PuzzleState::PuzzleSolving),
            StoryStep::Activate(PuzzleName::AnagramAct1),
            StoryStep::AwaitComplete(PuzzleName::AnagramAct1),
            StoryStep::SetFlag(StoryFlag::MotivationKnown),
            StoryStep::Beat {
                text: "NOT SMART ENOUGH... This isn't random. Someone has a personal vendetta.",
                target: Some(Role::Office),
                secs: 4.0,
            },
            StoryStep::AudioCue("suspense_build"),
        ],
    }
}

fn act2_reaction() -> ActScript {
    ActScript {
        act: Act::Act2Reaction,
        steps: vec![
            StoryStep::SetState(PuzzleState::StoryReveal),
            StoryStep::Flashback(FLASHBACK_LINES),
            StoryStep::Pause { secs: 8.0 },
            StoryStep::SetState(PuzzleState::PuzzleSolving),
            StoryStep::Beat {
                text: "The bomb is connected to Mr. Du Plessis's classroom computer. You need his access code.",
                target: Some(Role::Office),
                secs: 3.0,
            },
            StoryStep::Beat {
                text: "I see numbers on the bomb display: 32, 28, 92, 16",
                target: Some(Role::Bomb),
                secs: 2.0,
            },
            StoryStep::Activate(PuzzleName::PeriodicTable),
            StoryStep::AwaitComplete(PuzzleName::PeriodicTable),
            StoryStep::SetFlag(StoryFlag::FlashbackRevealed),
            StoryStep::SetState(PuzzleState::StoryReveal),
            StoryStep::Beat {
                text: "GeNiUS... The same word that destroyed a young student's confidence years ago.",
                target: Some(Role::Office),
                secs: 4.0,
            },
            StoryStep::Beat {
                text: "This is about Zipho... Mr. Du Plessis's former student.",
                target: Some(Role::Office),
                secs: 3.0,
            },
            StoryStep::AudioCue("revelation_theme"),
            // dramatic pacing penalty
            StoryStep::TimerDelta(-30.0),
        ],
    }
}

fn act3_action() -> ActScript {
    ActScript {
        act: Act::Act3Action,
        steps: vec![
            StoryStep::SetState(PuzzleState::PuzzleSolving),
            StoryStep::Activate(PuzzleName::WireCut),
            StoryStep::AwaitComplete(PuzzleName::WireCut),
            StoryStep::Activate(PuzzleName::ChalkCode),
            StoryStep::AwaitComplete(PuzzleName::ChalkCode),
            StoryStep::Activate(PuzzleName::BombRiddle),
            StoryStep::AwaitComplete(PuzzleName::BombRiddle),
            StoryStep::SetState(PuzzleState::StoryReveal),
            StoryStep::Beat {
                text: "The bomb is more complex than initially thought. Zipho planned this meticulously.",
                target: Some(Role::Office),
                secs: 3.0,
            },
            StoryStep::Beat {
                text: "There are multiple wire sequences... each one seems to represent something personal.",
                target: Some(Role::Bomb),
                secs: 3.0,
            },
            StoryStep::SetFlag(StoryFlag::FinalChoiceUnlocked),
            StoryStep::AudioCue("climax_resolution"),
        ],
    }
}

fn act4_resolution() -> ActScript {
    ActScript {
        act: Act::Act4Resolution,
        steps: vec![
            StoryStep::SetState(PuzzleState::StoryReveal),
            StoryStep::Beat {
                text: "The bomb is defused... but Zipho left one final choice.",
                target: Some(Role::Office),
                secs: 4.0,
            },
            StoryStep::Beat {
                text: "You can either:",
                target: Some(Role::Bomb),
                secs: 2.0,
            },
            StoryStep::Beat {
                text: "1. Completely neutralize everything, or",
                target: Some(Role::Office),
                secs: 2.0,
            },
            StoryStep::Beat {
                text: "2. Leave a harmless but symbolic message for Mr. Du Plessis",
                target: Some(Role::Bomb),
                secs: 3.0,
            },
            StoryStep::SetState(PuzzleState::PuzzleSolving),
            StoryStep::Activate(PuzzleName::MoralChoice),
            StoryStep::AwaitComplete(PuzzleName::MoralChoice),
        ],
    }
}
