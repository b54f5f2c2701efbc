//! Inbound realtime event model.
//!
//! Raw server payloads arrive as untyped JSON; [`TranscriptEvent`] is the
//! closed-enum view the aggregator consumes. Event kinds outside the
//! transcript contract parse to [`TranscriptEvent::Unknown`] and are routed
//! to the observability sink instead of being accumulated.

pub mod normalize;

pub use normalize::{local_timestamp, normalize_timestamp};

use serde_json::Value;

/// Transcript-relevant events in a realtime session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Incremental fragment of the user's transcribed speech.
    UserDelta { delta: String, timestamp: String },
    /// Incremental fragment of the assistant's spoken transcript,
    /// correlated to one in-flight response.
    AssistantDelta {
        delta: String,
        response_id: Option<String>,
        timestamp: String,
    },
    /// The user's current utterance is final.
    UserCompleted { timestamp: String },
    /// The assistant response identified by `response_id` is final.
    AssistantCompleted {
        response_id: Option<String>,
        timestamp: String,
    },
    /// Anything outside the transcript contract; logged, never accumulated.
    Unknown { event_type: String },
}

impl TranscriptEvent {
    /// Parse a normalized server payload into a typed transcript event.
    ///
    /// Returns `None` for payloads that are not event objects at all
    /// (no `type` field) and for delta events missing their `delta`
    /// fragment — streaming data is best-effort, so both are dropped
    /// rather than raised as faults.
    pub fn from_server_payload(payload: &Value) -> Option<Self> {
        let event_type = payload.get("type")?.as_str()?;
        let timestamp = string_field(payload, "timestamp").unwrap_or_default();
        match event_type {
            "conversation.item.input_audio_transcription.delta" => {
                string_field(payload, "delta").map(|delta| Self::UserDelta { delta, timestamp })
            }
            "response.audio_transcript.delta" => {
                string_field(payload, "delta").map(|delta| Self::AssistantDelta {
                    delta,
                    response_id: string_field(payload, "response_id"),
                    timestamp,
                })
            }
            // The console historically listened for the short form; the
            // protocol documents the long one. Accept both.
            "conversation.item.input_audio_transcription.completed"
            | "conversation.item.audio_transcription.completed" => {
                Some(Self::UserCompleted { timestamp })
            }
            "response.audio_transcript.completed" => Some(Self::AssistantCompleted {
                response_id: string_field(payload, "response_id"),
                timestamp,
            }),
            _ => Some(Self::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
