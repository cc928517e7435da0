use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pikabot_core::ScoreFile;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    score_file: Arc<ScoreFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub score_file: HealthCheck,
    pub checked_at: String,
}

pub fn router(score_file: Arc<ScoreFile>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { score_file })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let file = Arc::clone(&state.score_file);
    let score_file = tokio::task::spawn_blocking(move || score_file_check(&file))
        .await
        .unwrap_or_else(|error| HealthCheck {
            status: "degraded",
            detail: format!("score file check failed: {error}"),
        });
    let ready = score_file.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "pikabot-server runtime initialized".to_string(),
        },
        score_file,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn score_file_check(score_file: &ScoreFile) -> HealthCheck {
    match score_file.readiness() {
        Ok(readiness) => HealthCheck { status: "ready", detail: readiness.to_string() },
        Err(error) => HealthCheck { status: "degraded", detail: error.to_string() },
    }
}
