//! The transcript aggregation state machine.
//!
//! Maintains the ordered utterance list as the single source of truth for
//! a session, driven by the four transcript event kinds. Streaming data is
//! best-effort: a delta that cannot be matched to a live utterance opens a
//! new one, a completion with no live target is a silent no-op, and
//! nothing in here returns an error or panics on out-of-order or duplicate
//! delivery.

use tracing::debug;
use uuid::Uuid;

use crate::events::TranscriptEvent;
use super::{assemble_turns, Role, Turn, Utterance};

/// Consumes normalized transcript events and accumulates utterances.
///
/// Single-writer: all mutation happens synchronously inside [`apply`],
/// one event at a time, so a reader that runs between calls always
/// observes a fully-applied event.
///
/// [`apply`]: TranscriptAggregator::apply
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    utterances: Vec<Utterance>,
    next_seq: u64,
    split_user_sentences: bool,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize a live user utterance as soon as a delta ends in
    /// sentence-final punctuation (`.`, `!`, `?`), so the next delta opens
    /// a fresh one. Off by default; with it off, user utterances close
    /// only on their completion event.
    pub fn with_sentence_segmentation(mut self, enabled: bool) -> Self {
        self.split_user_sentences = enabled;
        self
    }

    /// The accumulated utterance list, in creation order.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Project the current history into display turns.
    pub fn turns(&self) -> Vec<Turn> {
        assemble_turns(&self.utterances)
    }

    /// Clear all accumulated state. Called when a new connection is
    /// established; events from the old session must never land in the
    /// new one.
    pub fn reset(&mut self) {
        self.utterances.clear();
        self.next_seq = 0;
    }

    /// Apply one transcript event to the utterance list.
    pub fn apply(&mut self, event: &TranscriptEvent) {
        match event {
            TranscriptEvent::UserDelta { delta, timestamp } => {
                self.apply_user_delta(delta, timestamp);
            }
            TranscriptEvent::AssistantDelta {
                delta,
                response_id,
                timestamp,
            } => {
                self.apply_assistant_delta(delta, response_id.as_deref(), timestamp);
            }
            TranscriptEvent::UserCompleted { timestamp } => match self.live_user_index() {
                Some(index) => self.utterances[index].finalize(timestamp.clone()),
                None => debug!("user completion with no live user utterance; ignoring"),
            },
            TranscriptEvent::AssistantCompleted {
                response_id,
                timestamp,
            } => {
                match response_id
                    .as_deref()
                    .and_then(|rid| self.live_assistant_index(rid))
                {
                    Some(index) => self.utterances[index].finalize(timestamp.clone()),
                    None => debug!(
                        response_id = response_id.as_deref(),
                        "assistant completion with no live matching utterance; ignoring"
                    ),
                }
            }
            TranscriptEvent::Unknown { event_type } => {
                debug!(%event_type, "non-transcript server event");
            }
        }
    }

    fn apply_user_delta(&mut self, delta: &str, timestamp: &str) {
        match self.live_user_index() {
            Some(index) => self.utterances[index].text.push_str(delta),
            None => self.push_utterance(Role::User, delta, timestamp, None),
        }
        if self.split_user_sentences && ends_sentence(delta) {
            if let Some(index) = self.live_user_index() {
                self.utterances[index].finalize(timestamp.to_string());
            }
        }
    }

    fn apply_assistant_delta(&mut self, delta: &str, response_id: Option<&str>, timestamp: &str) {
        if let Some(index) = response_id.and_then(|rid| self.live_assistant_index(rid)) {
            self.utterances[index].text.push_str(delta);
            return;
        }
        let correlation = response_id
            .map(ToString::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.push_utterance(Role::Assistant, delta, timestamp, Some(correlation));
    }

    /// Index of the live user utterance, if one exists. There is at most
    /// one at any time; it need not be last in the list when assistant
    /// deltas have arrived since the user started speaking.
    fn live_user_index(&self) -> Option<usize> {
        self.utterances
            .iter()
            .rposition(|u| u.is_live && u.role == Role::User)
    }

    /// Backward scan for the most recent live assistant utterance carrying
    /// this response id. Anchoring correlation on the utterance itself,
    /// rather than on a mutable "current response" pointer, keeps
    /// interleaved responses from cross-contaminating.
    fn live_assistant_index(&self, response_id: &str) -> Option<usize> {
        self.utterances.iter().rposition(|u| {
            u.is_live && u.role == Role::Assistant && u.response_id.as_deref() == Some(response_id)
        })
    }

    fn push_utterance(
        &mut self,
        role: Role,
        text: &str,
        timestamp: &str,
        response_id: Option<String>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.utterances.push(Utterance {
            id: Uuid::new_v4(),
            role,
            text: text.to_string(),
            timestamp: timestamp.to_string(),
            seq,
            is_live: true,
            response_id,
        });
    }
}

fn ends_sentence(delta: &str) -> bool {
    delta
        .trim_end()
        .ends_with(|c| matches!(c, '.' | '!' | '?'))
}
