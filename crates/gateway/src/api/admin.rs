//! Health and runtime log-level endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/health: lightweight health probe
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mock_device": state.mock_address.is_some(),
        "timezone": state.timezone().name(),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PUT /v1/admin/log-level: swap the tracing filter at runtime
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct LogLevelRequest {
    /// An `EnvFilter` directive, e.g. `"debug"` or `"info,bc_sessions=trace"`.
    pub filter: String,
}

pub async fn set_log_level(
    State(state): State<AppState>,
    Json(req): Json<LogLevelRequest>,
) -> Response {
    let Some(handle) = &state.log_reload else {
        return api_error(StatusCode::SERVICE_UNAVAILABLE, "log level is not adjustable");
    };
    let filter = match EnvFilter::try_new(&req.filter) {
        Ok(f) => f,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, format!("invalid filter: {e}")),
    };
    if let Err(e) = handle.reload(filter) {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    tracing::info!(filter = %req.filter, "log filter changed");
    Json(serde_json::json!({ "filter": req.filter })).into_response()
}
