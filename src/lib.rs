//! Colloquy — realtime voice conversation console
//!
//! Consumes the transcript-delta stream of an OpenAI Realtime session and
//! reconstructs it into a displayable conversation: user and assistant
//! speech fragments are reassembled into discrete utterances, assistant
//! utterances are correlated to their in-flight response by identifier,
//! and the resulting history is projected into alternating conversational
//! turns for rendering.
//!
//! # Quick Start
//!
//! ```no_run
//! use colloquy::prelude::*;
//!
//! # async fn example() -> colloquy::error::Result<()> {
//! let config = SessionConfig::from_env()?;
//! let mut session = ConversationSession::new(config);
//! session.connect().await?;
//!
//! while let Some(event) = session.next_event().await {
//!     println!("{event:?}");
//!     for turn in session.turns() {
//!         // hand off to the renderer
//!         let _ = (&turn.user, &turn.assistant);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod prelude;
pub mod session;
pub mod transcript;
