//! Session configuration.

use std::env;
use std::time::Duration;

use crate::error::{ColloquyError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";
pub const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Configuration for a realtime conversation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub voice: Option<String>,
    /// System instructions sent when minting the session credential.
    pub instructions: Option<String>,
    /// Model used for transcribing the user's input audio.
    pub transcription_model: String,
    /// Server-VAD activation threshold (0.0–1.0).
    pub vad_threshold: f64,
    /// Silence duration before the server considers a user turn done.
    pub vad_silence: Duration,
    pub api_key: Option<String>,
    pub base_url: String,
    pub realtime_url: String,
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            voice: Some("echo".to_string()),
            instructions: None,
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            vad_threshold: 0.4,
            vad_silence: Duration::from_millis(600),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
            heartbeat_interval: Duration::from_secs(20),
        }
    }
}

impl SessionConfig {
    /// Defaults plus `OPENAI_API_KEY` from the environment (loading `.env`
    /// if present). Errors if no key is found.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let config = Self {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            ..Self::default()
        };
        if config.api_key.is_none() {
            return Err(ColloquyError::Authentication("Missing OPENAI_API_KEY".into()));
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub(crate) fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ColloquyError::Authentication("Missing OPENAI_API_KEY".into()))
    }
}
