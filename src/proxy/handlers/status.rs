// Health and upstream status handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tokio::time::Duration;

use crate::proxy::server::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upstream reachability as seen from the relay
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamStatus {
    pub url: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: String,
}

/// Health check handler
pub async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}

/// Probe upstream; 401 still counts as online since the server answered
pub async fn handle_upstream_status(State(state): State<AppState>) -> Json<UpstreamStatus> {
    let outcome = state
        .upstream
        .probe(&state.config.status_probe_path, PROBE_TIMEOUT)
        .await;

    let (online, error) = match (outcome.status, outcome.error) {
        (Some(code), _) if is_online(code) => (true, None),
        (Some(code), _) => (false, Some(format!("HTTP {}", code.as_u16()))),
        (None, err) => (false, err),
    };

    if !online {
        tracing::warn!(
            "Upstream {} is offline: {}",
            state.upstream.base_url(),
            error.as_deref().unwrap_or("unknown")
        );
    }

    Json(UpstreamStatus {
        url: state.upstream.base_url().to_string(),
        status: if online { "online" } else { "offline" },
        http_status: outcome.status.map(|s| s.as_u16()),
        response_time_ms: outcome.elapsed.as_millis() as u64,
        error,
        checked_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn is_online(code: StatusCode) -> bool {
    code.is_success() || code == StatusCode::UNAUTHORIZED
}
