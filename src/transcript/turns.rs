//! Turn assembly: projecting the utterance list into display pairs.

use serde::Serialize;

use super::{Role, Utterance};

/// A display-only pairing of at most one user and one assistant utterance.
///
/// Never persisted; recomputed from scratch from the utterance list on
/// every call to [`assemble_turns`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Turn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Utterance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant: Option<Utterance>,
}

impl Turn {
    fn slot_mut(&mut self, role: Role) -> &mut Option<Utterance> {
        match role {
            Role::User => &mut self.user,
            Role::Assistant => &mut self.assistant,
        }
    }

    fn seeded(utterance: &Utterance) -> Self {
        let mut turn = Self::default();
        *turn.slot_mut(utterance.role) = Some(utterance.clone());
        turn
    }
}

/// Group utterances into alternating user/assistant turns.
///
/// Utterances are ordered by their monotonic creation sequence (stable, so
/// ties keep list order), then walked with a current-turn accumulator:
/// an utterance fills its role's empty slot; a duplicate for an
/// already-filled slot while the other is still empty is skipped (first
/// instance wins); once both slots are filled, the next utterance of
/// either role starts a new turn. No emitted turn has both slots empty.
pub fn assemble_turns(utterances: &[Utterance]) -> Vec<Turn> {
    let mut ordered: Vec<&Utterance> = utterances.iter().collect();
    ordered.sort_by_key(|u| u.seq);

    let mut turns = Vec::new();
    let mut current: Option<Turn> = None;

    for utterance in ordered {
        let Some(turn) = current.as_mut() else {
            current = Some(Turn::seeded(utterance));
            continue;
        };
        let slot_taken = turn.slot_mut(utterance.role).is_some();
        let other_taken = match utterance.role {
            Role::User => turn.assistant.is_some(),
            Role::Assistant => turn.user.is_some(),
        };
        if slot_taken && !other_taken {
            // duplicate same-role entry before the turn closed
            continue;
        }
        if !slot_taken {
            *turn.slot_mut(utterance.role) = Some(utterance.clone());
        } else if let Some(done) = current.take() {
            turns.push(done);
            current = Some(Turn::seeded(utterance));
        }
    }

    if let Some(turn) = current {
        turns.push(turn);
    }
    turns
}
