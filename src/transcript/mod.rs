//! Transcript reconstruction: utterances, aggregation, and turn assembly.

pub mod aggregator;
pub mod turns;

pub use aggregator::TranscriptAggregator;
pub use turns::{assemble_turns, Turn};

use serde::Serialize;
use uuid::Uuid;

/// Which side of the conversation produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One contiguous piece of speech, user or assistant side.
///
/// Utterances are created by the first delta of a new speech segment, grow
/// by append while live, and are frozen in place by the corresponding
/// completion event. They are never deleted or reordered; the utterance
/// list is the session's single source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    /// Stable opaque identifier, assigned at creation.
    pub id: Uuid,
    pub role: Role,
    /// Accumulated text; append-only while live, immutable once finalized.
    pub text: String,
    /// Wall-clock time-of-day string, captured at creation and overwritten
    /// at finalization with the completing event's stamp.
    pub timestamp: String,
    /// Monotonic creation sequence number; the presentation ordering key.
    pub seq: u64,
    /// True while more deltas are expected.
    pub is_live: bool,
    /// Correlation key for assistant utterances; absent on user speech.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl Utterance {
    fn finalize(&mut self, timestamp: String) {
        self.is_live = false;
        self.text = self.text.trim().to_string();
        if !timestamp.is_empty() {
            self.timestamp = timestamp;
        }
    }
}
