//! Puzzle engine.
//!
//! Seven puzzle kinds as a closed enum, each with an exact-match predicate,
//! a role restriction and a one-shot completion flag. Submissions before
//! activation, after completion, or from the wrong role are silent no-ops.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleName {
    LightSwitch,
    AnagramAct1,
    PeriodicTable,
    WireCut,
    ChalkCode,
    BombRiddle,
    MoralChoice,
}

pub const PUZZLE_COUNT: usize = 7;

impl PuzzleName {
    pub const ALL: [PuzzleName; PUZZLE_COUNT] = [
        PuzzleName::LightSwitch,
        PuzzleName::AnagramAct1,
        PuzzleName::PeriodicTable,
        PuzzleName::WireCut,
        PuzzleName::ChalkCode,
        PuzzleName::BombRiddle,
        PuzzleName::MoralChoice,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|n| *n == self).unwrap_or(0)
    }
}

/// Answer payload as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Sequence(Vec<u8>),
    Choice(u8),
}

/// Validation predicate baked in at puzzle-definition time.
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    /// Case-insensitive, whitespace-ignoring text match.
    Text(&'static str),
    /// Exact ordered sequence match (switch/button indices).
    Sequence(&'static [u8]),
    /// Both participants must submit the same choice index.
    Agreement,
}

/// Story-point weights for the moral choice, by choice index.
pub const MORAL_CHOICE_WEIGHTS: [i32; 2] = [5, -15];

/// Static definition of one puzzle: predicate, role restriction,
/// reward/penalty policy and the role-partitioned activation prompts.
#[derive(Debug, Clone)]
pub struct PuzzleSpec {
    pub name: PuzzleName,
    /// Role allowed to submit; `None` means either participant.
    pub submitter: Option<Role>,
    pub expected: Expected,
    pub reward: i32,
    pub penalty_secs: f64,
    pub comm_penalty: i32,
    pub office_prompt: &'static str,
    pub bomb_prompt: &'static str,
}

/// Result of reducing one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Solved { reward: i32 },
    Failed { penalty_secs: f64, comm_penalty: i32 },
    /// Moral choice: this participant's pick is recorded, the other is
    /// still outstanding.
    AgreementPending,
    /// Moral choice: the two picks disagree. Both are cleared for retry.
    AgreementConflict,
    /// Not activated, already complete, wrong role, or malformed payload.
    Ignored,
}

/// Bit set of completed puzzles, published over a watch channel so the act
/// sequencer can await a specific completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionFlags([bool; PUZZLE_COUNT]);

impl CompletionFlags {
    pub fn is_complete(&self, name: PuzzleName) -> bool {
        self.0[name.index()]
    }

    pub fn names(&self) -> Vec<PuzzleName> {
        PuzzleName::ALL
            .iter()
            .copied()
            .filter(|n| self.0[n.index()])
            .collect()
    }
}

/// Runtime state for all puzzles of a session.
#[derive(Debug)]
pub struct PuzzleBoard {
    specs: Vec<PuzzleSpec>,
    activated: [bool; PUZZLE_COUNT],
    completed: [bool; PUZZLE_COUNT],
    moral_picks: Vec<(Uuid, u8)>,
}

impl PuzzleBoard {
    pub fn new(specs: &[PuzzleSpec]) -> Self {
        debug_assert_eq!(specs.len(), PUZZLE_COUNT);
        debug_assert!(specs.iter().zip(PuzzleName::ALL).all(|(s, n)| s.name == n));
        Self {
            specs: specs.to_vec(),
            activated: [false; PUZZLE_COUNT],
            completed: [false; PUZZLE_COUNT],
            moral_picks: Vec::with_capacity(2),
        }
    }

    pub fn spec(&self, name: PuzzleName) -> &PuzzleSpec {
        &self.specs[name.index()]
    }

    /// Server-side activation; the coordinator fans out the role-partitioned
    /// prompts from the returned spec.
    pub fn activate(&mut self, name: PuzzleName) -> &PuzzleSpec {
        self.activated[name.index()] = true;
        self.spec(name)
    }

    pub fn is_activated(&self, name: PuzzleName) -> bool {
        self.activated[name.index()]
    }

    pub fn is_complete(&self, name: PuzzleName) -> bool {
        self.completed[name.index()]
    }

    pub fn completed_flags(&self) -> CompletionFlags {
        CompletionFlags(self.completed)
    }

    /// Reduce one submission against the puzzle's predicate.
    pub fn submit(
        &mut self,
        participant: Uuid,
        role: Option<Role>,
        name: PuzzleName,
        answer: &Answer,
    ) -> SubmitOutcome {
        let i = name.index();
        if !self.activated[i] || self.completed[i] {
            return SubmitOutcome::Ignored;
        }
        let spec = &self.specs[i];
        if let Some(required) = spec.submitter {
            if role != Some(required) {
                return SubmitOutcome::Ignored;
            }
        }
        match (&spec.expected, answer) {
            (Expected::Text(want), Answer::Text(got)) => {
                if normalize(got) == normalize(want) {
                    self.completed[i] = true;
                    SubmitOutcome::Solved { reward: spec.reward }
                } else {
                    SubmitOutcome::Failed {
                        penalty_secs: spec.penalty_secs,
                        comm_penalty: spec.comm_penalty,
                    }
                }
            }
            (Expected::Sequence(want), Answer::Sequence(got)) => {
                if got.as_slice() == *want {
                    self.completed[i] = true;
                    SubmitOutcome::Solved { reward: spec.reward }
                } else {
                    SubmitOutcome::Failed {
                        penalty_secs: spec.penalty_secs,
                        comm_penalty: spec.comm_penalty,
                    }
                }
            }
            (Expected::Agreement, Answer::Choice(idx)) => {
                self.reduce_agreement(participant, *idx, name)
            }
            // Payload kind does not fit the puzzle: malformed, tolerate.
            _ => SubmitOutcome::Ignored,
        }
    }

    fn reduce_agreement(&mut self, participant: Uuid, idx: u8, name: PuzzleName) -> SubmitOutcome {
        if idx as usize >= MORAL_CHOICE_WEIGHTS.len() {
            return SubmitOutcome::Ignored;
        }
        match self.moral_picks.iter_mut().find(|(pid, _)| *pid == participant) {
            Some((_, prev)) => *prev = idx,
            None => self.moral_picks.push((participant, idx)),
        }
        if self.moral_picks.len() < 2 {
            return SubmitOutcome::AgreementPending;
        }
        let (first, second) = (self.moral_picks[0].1, self.moral_picks[1].1);
        if first == second {
            self.completed[name.index()] = true;
            SubmitOutcome::Solved {
                reward: MORAL_CHOICE_WEIGHTS[first as usize],
            }
        } else {
            self.moral_picks.clear();
            SubmitOutcome::AgreementConflict
        }
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
