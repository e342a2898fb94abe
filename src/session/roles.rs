//! Role assignment ledger.
//!
//! A pure reducer over role-selection commands from the two participants.
//! Whichever selection reaches the server first wins the requested role; the
//! second participant may only take the other role. The ledger never errors:
//! every meaningless call is a `Rejected` no-op.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two mutually exclusive player assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Office,
    Bomb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    /// The session's first role choice was just recorded; broadcast it so the
    /// other client can grey out the taken role.
    FirstChoiceRecorded(Role),
    /// The second, different role was just bound. Fires at most once.
    BothChosen,
    /// Duplicate, conflicting or over-capacity pick. No state changed.
    Rejected,
}

#[derive(Debug, Default)]
pub struct RoleLedger {
    first_choice: Option<Role>,
    assignments: Vec<(Uuid, Role)>,
    both_announced: bool,
}

impl RoleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce one role-selection command. A participant's role is set exactly
    /// once; a second pick by the same participant is rejected even if the
    /// other role is still free.
    pub fn choose(&mut self, participant: Uuid, requested: Role) -> RoleOutcome {
        if self.role_of(participant).is_some() || self.assignments.len() >= 2 {
            return RoleOutcome::Rejected;
        }
        match self.first_choice {
            None => {
                self.first_choice = Some(requested);
                self.assignments.push((participant, requested));
                RoleOutcome::FirstChoiceRecorded(requested)
            }
            Some(first) if requested != first => {
                self.assignments.push((participant, requested));
                if self.both_announced {
                    RoleOutcome::Rejected
                } else {
                    self.both_announced = true;
                    RoleOutcome::BothChosen
                }
            }
            Some(_) => RoleOutcome::Rejected,
        }
    }

    pub fn role_of(&self, participant: Uuid) -> Option<Role> {
        self.assignments
            .iter()
            .find(|(pid, _)| *pid == participant)
            .map(|(_, role)| *role)
    }

    pub fn participant_with(&self, role: Role) -> Option<Uuid> {
        self.assignments
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(pid, _)| *pid)
    }

    /// Monotonic first-choice value, replicated for UI gating.
    pub fn first_choice(&self) -> Option<Role> {
        self.first_choice
    }

    pub fn both_chosen(&self) -> bool {
        self.assignments.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_then_second_distinct_role() {
        let mut ledger = RoleLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            ledger.choose(a, Role::Office),
            RoleOutcome::FirstChoiceRecorded(Role::Office)
        );
        assert_eq!(ledger.choose(b, Role::Bomb), RoleOutcome::BothChosen);
        assert_eq!(ledger.role_of(a), Some(Role::Office));
        assert_eq!(ledger.role_of(b), Some(Role::Bomb));
        assert!(ledger.both_chosen());
    }

    #[test]
    fn same_role_twice_is_rejected() {
        let mut ledger = RoleLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        ledger.choose(a, Role::Bomb);
        assert_eq!(ledger.choose(b, Role::Bomb), RoleOutcome::Rejected);
        assert_eq!(ledger.role_of(b), None);
        assert!(!ledger.both_chosen());
    }

    #[test]
    fn participant_cannot_switch_roles() {
        let mut ledger = RoleLedger::new();
        let a = Uuid::new_v4();
        ledger.choose(a, Role::Office);
        assert_eq!(ledger.choose(a, Role::Bomb), RoleOutcome::Rejected);
        assert_eq!(ledger.role_of(a), Some(Role::Office));
    }

    #[test]
    fn never_converges_to_duplicate_roles() {
        // Every interleaving of picks from two participants must end with
        // zero, one, or two distinct roles assigned.
        let picks = [Role::Office, Role::Bomb];
        for first in picks {
            for second in picks {
                let mut ledger = RoleLedger::new();
                let a = Uuid::new_v4();
                let b = Uuid::new_v4();
                ledger.choose(a, first);
                ledger.choose(b, second);
                ledger.choose(a, second);
                ledger.choose(b, first);
                if let (Some(ra), Some(rb)) = (ledger.role_of(a), ledger.role_of(b)) {
                    assert_ne!(ra, rb);
                }
            }
        }
    }

    #[test]
    fn third_participant_is_rejected() {
        let mut ledger = RoleLedger::new();
        ledger.choose(Uuid::new_v4(), Role::Office);
        ledger.choose(Uuid::new_v4(), Role::Bomb);
        assert_eq!(ledger.choose(Uuid::new_v4(), Role::Office), RoleOutcome::Rejected);
    }

    #[test]
    fn both_chosen_fires_once() {
        let mut ledger = RoleLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        ledger.choose(a, Role::Office);
        assert_eq!(ledger.choose(b, Role::Bomb), RoleOutcome::BothChosen);
        assert_eq!(ledger.choose(b, Role::Bomb), RoleOutcome::Rejected);
    }
}
