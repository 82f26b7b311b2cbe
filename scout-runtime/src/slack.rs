//! Slack Events API server
//!
//! Receives channel messages on `POST /slack/events`, acknowledges them right
//! away and answers on a background task with `chat.postMessage`. Each channel
//! gets its own [`Session`].

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use scout_agents::Agent;

use crate::{is_greeting, Session, SessionConfig, ACKNOWLEDGEMENT, GREETING_REPLY};

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Requests older than this are treated as replays
const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

/// Slack app credentials and listen port
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub signing_secret: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Api(String),
}

/// Shared server state
pub struct SlackState {
    agent: Arc<Agent>,
    session_config: SessionConfig,
    sessions: DashMap<String, Arc<Session>>,
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackState {
    pub fn new(agent: Arc<Agent>, session_config: SessionConfig, config: SlackConfig) -> Self {
        Self {
            agent,
            session_config,
            sessions: DashMap::new(),
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Session for a channel, created on first use
    pub fn session(&self, channel: &str) -> Arc<Session> {
        self.sessions
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(Session::new(self.agent.clone(), &self.session_config)))
            .clone()
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let response: serde_json::Value = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.config.bot_token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if response["ok"].as_bool() != Some(true) {
            let reason = response["error"].as_str().unwrap_or("unknown error");
            return Err(SlackError::Api(reason.to_string()));
        }
        Ok(())
    }
}

/// Envelope of an Events API request
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackPayload {
    UrlVerification { challenge: String },
    EventCallback { event: MessageEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
}

impl MessageEvent {
    /// Channel and text of a plain user message; bot posts and edits are skipped
    fn user_message(&self) -> Option<(&str, &str)> {
        if self.kind != "message" || self.bot_id.is_some() || self.subtype.is_some() {
            return None;
        }
        let text = self.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some((self.channel.as_deref()?, text))
    }
}

/// Build the events router
pub fn router(state: Arc<SlackState>) -> Router {
    Router::new()
        .route("/slack/events", post(slack_events))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve the Slack events endpoint until the process is stopped
pub async fn serve(state: Arc<SlackState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening for Slack events on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn slack_events(
    State(state): State<Arc<SlackState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, (StatusCode, String)> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let timestamp = header("x-slack-request-timestamp")
        .ok_or((StatusCode::UNAUTHORIZED, "Missing request timestamp".to_string()))?;
    let signature = header("x-slack-signature")
        .ok_or((StatusCode::UNAUTHORIZED, "Missing request signature".to_string()))?;

    if !timestamp_is_fresh(timestamp, chrono::Utc::now().timestamp()) {
        return Err((StatusCode::UNAUTHORIZED, "Stale request".to_string()));
    }
    if !verify_signature(&state.config.signing_secret, timestamp, &body, signature) {
        return Err((StatusCode::UNAUTHORIZED, "Invalid request signature".to_string()));
    }

    let payload: SlackPayload = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid JSON payload: {}", e)))?;

    match payload {
        SlackPayload::UrlVerification { challenge } => {
            Ok(Json(serde_json::json!({ "challenge": challenge })).into_response())
        }
        SlackPayload::EventCallback { event } => {
            // Slack redelivers when the first ack is slow; the first delivery is already being answered
            if let Some(retry) = header("x-slack-retry-num") {
                debug!("Ignoring Slack retry #{}", retry);
                return Ok(StatusCode::OK.into_response());
            }

            if let Some((channel, text)) = event.user_message() {
                let channel = channel.to_string();
                let text = text.to_string();
                tokio::spawn(answer_message(state, channel, text));
            }
            Ok(StatusCode::OK.into_response())
        }
        SlackPayload::Other => Ok(StatusCode::OK.into_response()),
    }
}

async fn answer_message(state: Arc<SlackState>, channel: String, text: String) {
    info!("Message in {}: {}", channel, text);

    let replies: Vec<String> = if is_greeting(&text) {
        vec![GREETING_REPLY.to_string()]
    } else {
        if let Err(e) = state.post_message(&channel, ACKNOWLEDGEMENT).await {
            warn!("Failed to acknowledge in {}: {}", channel, e);
        }
        let session = state.session(&channel);
        vec![session.reply(&text).await]
    };

    for reply in replies {
        if let Err(e) = state.post_message(&channel, &reply).await {
            error!("Failed to reply in {}: {}", channel, e);
        }
    }
}

/// Check `v0=<hex>` against HMAC-SHA256 of `v0:{timestamp}:{body}`
pub fn verify_signature(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    let Some(expected) = signature
        .trim()
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{}:", timestamp).as_bytes());
    mac.update(body);

    mac.verify_slice(&expected).is_ok()
}

/// Whether a request timestamp is within the replay window of `now`
pub fn timestamp_is_fresh(timestamp: &str, now: i64) -> bool {
    timestamp
        .trim()
        .parse::<i64>()
        .is_ok_and(|ts| (now - ts).abs() <= MAX_REQUEST_AGE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scout_agents::{
        AgentSettings, LlmBackend, LlmError, PromptTemplate, ToolConfig, Toolbox,
    };
    use scout_web::{FetchError, PageFetcher};

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    struct SilentBackend;

    #[async_trait]
    impl LlmBackend for SilentBackend {
        async fn complete(&self, _prompt: &str, _stop: &[String]) -> Result<String, LlmError> {
            Ok("Final Answer: ok".to_string())
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    struct NoFetcher;

    #[async_trait]
    impl PageFetcher for NoFetcher {
        async fn fetch(&self, url: &str, _headers: reqwest::header::HeaderMap) -> Result<String, FetchError> {
            Err(FetchError::InvalidHeader(format!("offline: {}", url)))
        }
    }

    fn state() -> Arc<SlackState> {
        let agent = Agent::new(
            Arc::new(SilentBackend),
            Toolbox::new(Arc::new(NoFetcher), ToolConfig::default()),
            PromptTemplate::load_embedded().unwrap(),
            AgentSettings::default(),
        );
        Arc::new(SlackState::new(
            Arc::new(agent),
            SessionConfig::default(),
            SlackConfig {
                bot_token: "xoxb-test".to_string(),
                signing_secret: SECRET.to_string(),
                port: 0,
            },
        ))
    }

    fn sign(timestamp: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("v0:{}:", timestamp).as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn signed_headers(body: &[u8]) -> HeaderMap {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut headers = HeaderMap::new();
        headers.insert("x-slack-request-timestamp", timestamp.parse().unwrap());
        headers.insert("x-slack-signature", sign(&timestamp, body).parse().unwrap());
        headers
    }

    #[test]
    fn test_verify_signature() {
        let body = br#"{"type":"url_verification","challenge":"abc"}"#;
        let signature = sign("1531420618", body);

        assert!(verify_signature(SECRET, "1531420618", body, &signature));
        assert!(!verify_signature(SECRET, "1531420619", body, &signature));
        assert!(!verify_signature("other-secret", "1531420618", body, &signature));
        assert!(!verify_signature(SECRET, "1531420618", body, "v0=zz"));
        assert!(!verify_signature(SECRET, "1531420618", body, "missing-prefix"));
    }

    #[test]
    fn test_timestamp_is_fresh() {
        assert!(timestamp_is_fresh("1000", 1000));
        assert!(timestamp_is_fresh("1000", 1300));
        assert!(!timestamp_is_fresh("1000", 1301));
        assert!(!timestamp_is_fresh("not-a-number", 1000));
    }

    #[test]
    fn test_user_message_filtering() {
        let parse = |json: &str| match serde_json::from_str::<SlackPayload>(json).unwrap() {
            SlackPayload::EventCallback { event } => event,
            other => panic!("unexpected {:?}", other),
        };

        let user = parse(r#"{"type":"event_callback","event":{"type":"message","channel":"C1","text":" grills? "}}"#);
        assert_eq!(user.user_message(), Some(("C1", "grills?")));

        let bot = parse(r#"{"type":"event_callback","event":{"type":"message","channel":"C1","text":"hi","bot_id":"B1"}}"#);
        assert_eq!(bot.user_message(), None);

        let edit = parse(r#"{"type":"event_callback","event":{"type":"message","channel":"C1","subtype":"message_changed"}}"#);
        assert_eq!(edit.user_message(), None);

        let other: SlackPayload = serde_json::from_str(r#"{"type":"app_rate_limited"}"#).unwrap();
        assert!(matches!(other, SlackPayload::Other));
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let body = Bytes::from_static(br#"{"type":"url_verification","challenge":"3eZbrw1aB"}"#);
        let headers = signed_headers(&body);

        let response = slack_events(State(state()), headers, body).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["challenge"], "3eZbrw1aB");
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let body = Bytes::from_static(br#"{"type":"url_verification","challenge":"x"}"#);
        let mut headers = signed_headers(&body);
        headers.insert("x-slack-signature", "v0=00".parse().unwrap());

        let err = slack_events(State(state()), headers, body).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_session_per_channel() {
        let state = state();
        let a = state.session("C1");
        let b = state.session("C1");
        let c = state.session("C2");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
