//! Realtime conversation session over WebSocket.
//!
//! The session owns the transcript aggregator and a background socket
//! runtime. The runtime only reads frames and forwards parsed JSON
//! payloads over a channel; every state transition happens synchronously
//! in [`ConversationSession::next_event`] on the consumer's task, one
//! event at a time, so readers of the utterance list always observe a
//! fully-applied event.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::warn;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{ColloquyError, Result};
use crate::events::{local_timestamp, normalize_timestamp, TranscriptEvent};
use crate::transcript::{TranscriptAggregator, Turn, Utterance};

type SessionWebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct SessionRuntime {
    shutdown_tx: watch::Sender<bool>,
    outbound_tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

/// A live realtime conversation: socket runtime plus transcript state.
pub struct ConversationSession {
    config: SessionConfig,
    aggregator: TranscriptAggregator,
    payloads_rx: Option<mpsc::UnboundedReceiver<Value>>,
    runtime: Option<SessionRuntime>,
}

impl ConversationSession {
    /// Create a new session (does not connect yet).
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            aggregator: TranscriptAggregator::new(),
            payloads_rx: None,
            runtime: None,
        }
    }

    /// Finalize user utterances on sentence-final punctuation instead of
    /// waiting for the upstream completion event.
    pub fn with_sentence_segmentation(mut self, enabled: bool) -> Self {
        self.aggregator = TranscriptAggregator::new().with_sentence_segmentation(enabled);
        self
    }

    /// Connect to the realtime endpoint and send the session bootstrap.
    ///
    /// A new connection is a new session: all previously accumulated
    /// transcript state is cleared before the first event can arrive.
    pub async fn connect(&mut self) -> Result<()> {
        if self.runtime.is_some() {
            return Err(ColloquyError::InvalidState(
                "Session is already connected".into(),
            ));
        }

        let api_key = self.config.require_api_key()?.to_string();
        let url = build_realtime_url(&self.config.realtime_url, &self.config.model)?;
        let bootstrap_payload = build_session_bootstrap_payload(&self.config)?;

        let mut socket = connect_realtime_socket(&url, &api_key).await?;
        send_text(&mut socket, &bootstrap_payload).await?;

        self.aggregator.reset();

        let (payloads_tx, payloads_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_socket_loop(
            socket,
            payloads_tx,
            outbound_rx,
            shutdown_rx,
            self.config.heartbeat_interval,
        ));

        self.payloads_rx = Some(payloads_rx);
        self.runtime = Some(SessionRuntime {
            shutdown_tx,
            outbound_tx,
            task,
        });
        Ok(())
    }

    /// Receive, normalize, and apply the next transcript event.
    ///
    /// Returns `None` once the session is closed; payloads from a closed
    /// session are discarded unconditionally (the channel is gone).
    /// Payloads that do not parse to an event are skipped.
    pub async fn next_event(&mut self) -> Option<TranscriptEvent> {
        loop {
            let payload = self.payloads_rx.as_mut()?.recv().await?;
            if let Some(event) = self.ingest(payload) {
                return Some(event);
            }
        }
    }

    /// Apply one raw inbound payload to the transcript.
    ///
    /// Exposed so transports other than the built-in WebSocket runtime
    /// (a WebRTC data channel, a replay log) can drive the same state
    /// machine. The payload is stamped with an arrival timestamp if it
    /// carries none, parsed, and applied as one atomic update.
    pub fn ingest(&mut self, mut payload: Value) -> Option<TranscriptEvent> {
        normalize_timestamp(&mut payload);
        let event = TranscriptEvent::from_server_payload(&payload)?;
        self.aggregator.apply(&event);
        Some(event)
    }

    /// Send a client event, stamping `event_id` and `timestamp` if absent.
    pub fn send_event(&self, mut event: Value) -> Result<()> {
        let runtime = self.runtime.as_ref().ok_or_else(|| {
            ColloquyError::InvalidState("Cannot send on a disconnected session".into())
        })?;
        if let Some(object) = event.as_object_mut() {
            object
                .entry("event_id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            object
                .entry("timestamp")
                .or_insert_with(|| Value::String(local_timestamp()));
        }
        let text = serde_json::to_string(&event)?;
        runtime
            .outbound_tx
            .send(text)
            .map_err(|_| ColloquyError::Stream("Session runtime is gone".into()))
    }

    /// The accumulated utterance history, in creation order.
    pub fn utterances(&self) -> &[Utterance] {
        self.aggregator.utterances()
    }

    /// Project the current history into display turns.
    pub fn turns(&self) -> Vec<Turn> {
        self.aggregator.turns()
    }

    pub fn is_connected(&self) -> bool {
        self.runtime.is_some()
    }

    /// Close the session gracefully. Accumulated history stays readable
    /// until the next `connect`.
    pub async fn close(&mut self) -> Result<()> {
        self.payloads_rx = None;
        if let Some(runtime) = self.runtime.take() {
            let _ = runtime.shutdown_tx.send(true);
            runtime
                .task
                .await
                .map_err(|error| ColloquyError::Stream(format!("Session task failed: {error}")))?;
        }
        Ok(())
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = runtime.shutdown_tx.send(true);
            runtime.task.abort();
        }
    }
}

async fn run_socket_loop(
    mut socket: SessionWebSocket,
    payloads_tx: mpsc::UnboundedSender<Value>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
    heartbeat_interval: Duration,
) {
    let mut heartbeat = time::interval(heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if let Err(error) = socket.send(Message::Text(text.into())).await {
                            warn!(%error, "client event send failed; closing session");
                            break;
                        }
                    }
                    // session handle dropped
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if let Err(error) = socket.send(Message::Ping(Default::default())).await {
                    warn!(%error, "heartbeat failed; closing session");
                    break;
                }
            }
            frame = socket.next() => {
                match frame {
                    Some(Ok(message)) => {
                        if let Err(error) = handle_server_message(&mut socket, &payloads_tx, message).await {
                            if !matches!(error, WsError::ConnectionClosed) {
                                warn!(%error, "websocket frame handling failed; closing session");
                            }
                            break;
                        }
                    }
                    Some(Err(error)) => {
                        warn!(%error, "websocket receive failed; closing session");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
    // payloads_tx drops here; the consumer sees end-of-stream
}

async fn handle_server_message(
    socket: &mut SessionWebSocket,
    payloads_tx: &mpsc::UnboundedSender<Value>,
    message: Message,
) -> std::result::Result<(), WsError> {
    match message {
        Message::Text(text) => parse_and_forward_payload(text.as_ref(), payloads_tx),
        Message::Binary(bytes) => {
            if let Ok(text) = String::from_utf8(bytes.to_vec()) {
                parse_and_forward_payload(&text, payloads_tx);
            }
        }
        Message::Ping(payload) => socket.send(Message::Pong(payload)).await?,
        Message::Pong(_) => {}
        Message::Close(_) => return Err(WsError::ConnectionClosed),
        Message::Frame(_) => {}
    }
    Ok(())
}

fn parse_and_forward_payload(payload: &str, payloads_tx: &mpsc::UnboundedSender<Value>) {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            let _ = payloads_tx.send(value);
        }
        Err(error) => {
            // streaming data is best-effort; a bad frame is dropped, not fatal
            warn!(%error, "unparseable event payload dropped");
        }
    }
}

fn build_realtime_url(realtime_url: &str, model: &str) -> Result<String> {
    let trimmed = realtime_url.trim();
    if trimmed.is_empty() {
        return Err(ColloquyError::Configuration(
            "Realtime URL cannot be empty".into(),
        ));
    }
    // A request-target needs a path: "ws://host:port?query" is not a
    // valid URI, so normalize an authority-only URL to a "/" path.
    let after_scheme = trimmed.find("://").map_or(0, |index| index + 3);
    let rest = &trimmed[after_scheme..];
    let base = match (rest.find('/'), rest.find('?')) {
        (None, None) => format!("{trimmed}/"),
        (None, Some(query_offset)) => {
            let split = after_scheme + query_offset;
            format!("{}/{}", &trimmed[..split], &trimmed[split..])
        }
        _ => trimmed.to_string(),
    };
    let separator = if base.contains('?') { "&" } else { "?" };
    Ok(format!("{base}{separator}model={model}"))
}

/// The `session.update` sent right after connecting: enables input audio
/// transcription and server-side voice activity detection with the
/// console's tuning.
fn build_session_bootstrap_payload(config: &SessionConfig) -> Result<String> {
    let mut session = Map::new();
    session.insert(
        "input_audio_transcription".into(),
        json!({ "model": config.transcription_model }),
    );
    session.insert(
        "turn_detection".into(),
        json!({
            "type": "server_vad",
            "threshold": config.vad_threshold,
            "silence_duration_ms": config.vad_silence.as_millis() as u64,
        }),
    );
    if let Some(voice) = &config.voice {
        session.insert("voice".into(), Value::String(voice.clone()));
    }

    serde_json::to_string(&json!({
        "type": "session.update",
        "session": Value::Object(session),
    }))
    .map_err(ColloquyError::from)
}

async fn connect_realtime_socket(url: &str, api_key: &str) -> Result<SessionWebSocket> {
    let mut request = url.into_client_request().map_err(|error| {
        ColloquyError::Configuration(format!("Invalid realtime websocket URL: {error}"))
    })?;
    let auth_value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|error| {
        ColloquyError::Configuration(format!("Invalid realtime auth header: {error}"))
    })?;
    request.headers_mut().insert("Authorization", auth_value);
    request
        .headers_mut()
        .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

    connect_async(request)
        .await
        .map(|(socket, _)| socket)
        .map_err(map_connect_error)
}

async fn send_text(socket: &mut SessionWebSocket, payload: &str) -> Result<()> {
    socket
        .send(Message::Text(payload.into()))
        .await
        .map_err(|error| ColloquyError::Stream(format!("Session bootstrap send failed: {error}")))
}

fn map_connect_error(error: WsError) -> ColloquyError {
    match error {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            if matches!(status, 401 | 403) {
                ColloquyError::Authentication(format!(
                    "Realtime websocket authentication failed with status {status}"
                ))
            } else {
                ColloquyError::api(
                    status,
                    format!("Realtime websocket handshake failed with status {status}"),
                )
            }
        }
        WsError::Io(error) => ColloquyError::Io(error),
        WsError::Url(error) => {
            ColloquyError::Configuration(format!("Invalid realtime websocket URL: {error}"))
        }
        other => ColloquyError::Stream(format!("Realtime websocket connect failed: {other}")),
    }
}
