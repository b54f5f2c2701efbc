//! Ephemeral credential minting for realtime sessions.
//!
//! The realtime WebSocket is authorized with a short-lived client secret
//! minted from the standing API key via `POST {base}/realtime/sessions`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::SessionConfig;
use crate::error::{ColloquyError, Result};

/// The short-lived credential returned by the sessions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    client_secret: ClientSecret,
}

/// Mint an ephemeral client secret for a realtime session.
pub async fn mint_client_secret(config: &SessionConfig) -> Result<ClientSecret> {
    let api_key = config.require_api_key()?;
    let url = format!("{}/realtime/sessions", config.base_url.trim_end_matches('/'));

    let mut body = Map::new();
    body.insert("model".into(), Value::String(config.model.clone()));
    if let Some(voice) = &config.voice {
        body.insert("voice".into(), Value::String(voice.clone()));
    }
    if let Some(instructions) = &config.instructions {
        body.insert("instructions".into(), Value::String(instructions.clone()));
    }

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(api_key)
        .json(&Value::Object(body))
        .send()
        .await?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let message = response.text().await.unwrap_or_default();
        return Err(status_to_error(status, &message));
    }

    let session: SessionResponse = response.json().await?;
    Ok(session.client_secret)
}

fn status_to_error(status: u16, body: &str) -> ColloquyError {
    if matches!(status, 401 | 403) {
        ColloquyError::Authentication(format!(
            "Realtime session minting rejected with status {status}: {body}"
        ))
    } else {
        ColloquyError::api(status, format!("Realtime session minting failed: {body}"))
    }
}
