//! Convenience re-exports for common use.

pub use crate::auth::{mint_client_secret, ClientSecret};
pub use crate::config::SessionConfig;
pub use crate::error::{ColloquyError, Result};
pub use crate::events::TranscriptEvent;
pub use crate::session::ConversationSession;
pub use crate::transcript::{assemble_turns, Role, TranscriptAggregator, Turn, Utterance};
