//! Slash-command webhook endpoint.
//!
//! Every request is verified against the Slack signing secret before the body
//! is parsed, so a rejected request never reaches the score file.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use pikabot_core::config::AppConfig;
use pikabot_core::ScoreFile;
use pikabot_slack::commands::{CommandRouteError, CommandRouter, PayloadError, SlashCommandPayload};
use pikabot_slack::signature::{
    SignatureError, SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::scoreboard::FileScoreboard;

#[derive(Clone)]
pub struct SlashState {
    router: Arc<CommandRouter<FileScoreboard>>,
    signing_secret: SecretString,
    timestamp_tolerance_secs: u64,
}

impl SlashState {
    pub fn new(config: &AppConfig, score_file: Arc<ScoreFile>) -> Self {
        let router = CommandRouter::new(FileScoreboard::new(score_file))
            .with_top_count(config.scores.top_count);
        Self {
            router: Arc::new(router),
            signing_secret: config.slack.signing_secret.clone(),
            timestamp_tolerance_secs: config.slack.timestamp_tolerance_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum SlashError {
    #[error("request verification failed: {0}")]
    Verification(#[from] SignatureError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error("response serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlashError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Verification(error) if !error.is_setup_failure() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SlashError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::UNAUTHORIZED {
            warn!(event_name = "slack.request.rejected", error = %self, "slack request rejected");
        } else {
            error!(event_name = "slack.request.failed", error = %self, "slack request failed");
        }
        status.into_response()
    }
}

pub fn router(state: SlashState) -> Router {
    Router::new()
        .route("/", post(slash_command))
        .route("/slack/commands", post(slash_command))
        .with_state(state)
}

pub async fn slash_command(
    State(state): State<SlashState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, SlashError> {
    let span = tracing::info_span!("slack.request", correlation_id = %Uuid::new_v4());
    handle(state, headers, body).instrument(span).await
}

async fn handle(
    state: SlashState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, SlashError> {
    let verifier =
        SignatureVerifier::new(state.signing_secret.clone(), state.timestamp_tolerance_secs)?;
    verifier.verify(
        header_value(&headers, TIMESTAMP_HEADER),
        header_value(&headers, SIGNATURE_HEADER),
        &body,
        Utc::now().timestamp(),
    )?;

    let payload = SlashCommandPayload::from_form(&body)?;
    let reply = state.router.route(&payload).await?;
    let json = reply.to_json()?;

    info!(
        event_name = "slack.request.completed",
        command = %payload.command,
        "slash command answered"
    );
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], json).into_response())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::Utc;
    use pikabot_core::config::AppConfig;
    use pikabot_core::ScoreFile;
    use pikabot_slack::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
    use secrecy::SecretString;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::{router, SlashState};

    const SECRET: &str = "pikabot-test-signing-secret";

    fn app(scores: &Path, secret: &str) -> Router {
        let mut config = AppConfig::default();
        config.slack.signing_secret = SecretString::from(secret.to_string());
        config.scores.path = scores.to_path_buf();
        router(SlashState::new(&config, Arc::new(ScoreFile::new(scores))))
    }

    fn form(command: &str, text: &str) -> String {
        let command = command.replace('/', "%2F");
        let text = text.replace('+', "%2B").replace(' ', "+");
        format!(
            "token=t&team_id=T1&channel_id=C1&user_id=U1&user_name=ash\
             &command={command}&text={text}"
        )
    }

    fn signed_request(path: &str, body: &str) -> Request<Body> {
        let timestamp = Utc::now().timestamp().to_string();
        let verifier = SignatureVerifier::new(SecretString::from(SECRET.to_string()), 300)
            .expect("verifier");
        let signature = verifier.sign(&timestamp, body.as_bytes()).expect("sign");

        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body").to_vec();
        (status, content_type, body)
    }

    async fn reply_text(app: &Router, command: &str, text: &str) -> String {
        let request = signed_request("/", &form(command, text));
        let (status, content_type, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value["response_type"], "in_channel");
        value["text"].as_str().expect("text field").to_owned()
    }

    #[tokio::test]
    async fn score_votes_accumulate_across_requests() {
        let dir = TempDir::new().expect("temp dir");
        let scores = dir.path().join("scores.csv");
        let app = app(&scores, SECRET);

        assert_eq!(reply_text(&app, "/score", "foo++").await, "foo: 1");
        assert_eq!(reply_text(&app, "/score", "foo++").await, "foo: 2");
        assert_eq!(reply_text(&app, "/score", "foo--").await, "foo: 1");
        assert_eq!(fs::read_to_string(&scores).expect("score file"), "foo,1\n");
    }

    #[tokio::test]
    async fn top_with_few_entries_returns_only_existing_ones() {
        let dir = TempDir::new().expect("temp dir");
        let scores = dir.path().join("scores.csv");
        fs::write(&scores, "alice,3\nbob,5\n").expect("seed scores");
        let app = app(&scores, SECRET);

        assert_eq!(reply_text(&app, "/score", "top").await, "bob: 5\nalice: 3");
        assert_eq!(fs::read_to_string(&scores).expect("score file"), "alice,3\nbob,5\n");
    }

    #[tokio::test]
    async fn top_on_missing_file_reports_no_scores() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(&dir.path().join("scores.csv"), SECRET);
        assert_eq!(reply_text(&app, "/score", "top").await, "no scores yet");
    }

    #[tokio::test]
    async fn invalid_score_text_is_a_successful_reply() {
        let dir = TempDir::new().expect("temp dir");
        let scores = dir.path().join("scores.csv");
        let app = app(&scores, SECRET);

        assert_eq!(reply_text(&app, "/score", "pikachu").await, "invalid command");
        assert!(!scores.exists(), "invalid commands must not write the score file");
    }

    #[tokio::test]
    async fn shout_replies_on_the_alternate_path() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(&dir.path().join("scores.csv"), SECRET);

        let (status, _, body) =
            send(&app, signed_request("/slack/commands", &form("/mark", "thunder shock"))).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value["text"].as_str().map(str::to_lowercase).as_deref(), Some("thunder shock"));
    }

    #[tokio::test]
    async fn unknown_command_is_an_internal_error() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(&dir.path().join("scores.csv"), SECRET);

        let (status, _, body) = send(&app, signed_request("/", &form("/pokedex", "25"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn tampered_body_is_rejected_without_mutation() {
        let dir = TempDir::new().expect("temp dir");
        let scores = dir.path().join("scores.csv");
        let app = app(&scores, SECRET);

        let mut request = signed_request("/", &form("/score", "foo++"));
        *request.body_mut() = Body::from(form("/score", "mallory++"));

        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
        assert!(!scores.exists(), "rejected requests must not write the score file");
    }

    #[tokio::test]
    async fn missing_or_wrong_signature_is_unauthorized() {
        let dir = TempDir::new().expect("temp dir");
        let scores = dir.path().join("scores.csv");
        let app = app(&scores, SECRET);

        let mut missing = signed_request("/", &form("/score", "foo++"));
        missing.headers_mut().remove(SIGNATURE_HEADER);
        assert_eq!(send(&app, missing).await.0, StatusCode::UNAUTHORIZED);

        let mut wrong = signed_request("/", &form("/score", "foo++"));
        wrong.headers_mut().insert(
            SIGNATURE_HEADER,
            "v0=0000000000000000000000000000000000000000000000000000000000000000"
                .parse()
                .expect("header value"),
        );
        assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

        let mut stale = signed_request("/", &form("/score", "foo++"));
        stale.headers_mut().insert(TIMESTAMP_HEADER, "1000".parse().expect("header value"));
        assert_eq!(send(&app, stale).await.0, StatusCode::UNAUTHORIZED);

        assert!(!scores.exists());
    }

    #[tokio::test]
    async fn empty_signing_secret_is_a_setup_failure() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(&dir.path().join("scores.csv"), "");

        let (status, _, _) = send(&app, signed_request("/", &form("/score", "foo++"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unparseable_payload_is_an_internal_error() {
        let dir = TempDir::new().expect("temp dir");
        let app = app(&dir.path().join("scores.csv"), SECRET);

        let (status, _, _) = send(&app, signed_request("/", "text=no-command-here")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
