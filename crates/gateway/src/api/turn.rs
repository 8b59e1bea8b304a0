use axum::extract::State;
use axum::response::Json;
use tracing::Instrument;

use crate::state::AppState;
use crate::turn::{run_turn, TurnRequest, TurnResponse};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/turn: answer one conversational turn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Domain failures are reported in the body with a 200; the front-end
/// speaks the remediation either way.
pub async fn turn(State(state): State<AppState>, Json(req): Json<TurnRequest>) -> Json<TurnResponse> {
    let span = tracing::info_span!(
        "turn",
        request_id = %uuid::Uuid::new_v4(),
        user_id = %req.user_id,
        intent = ?req.intent,
    );
    let response = run_turn(&state, req, chrono::Utc::now())
        .instrument(span)
        .await;
    Json(response)
}
