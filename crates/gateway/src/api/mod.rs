pub mod admin;
pub mod turn;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(admin::health))
        .route("/v1/turn", post(turn::turn))
        .route("/v1/admin/log-level", put(admin::set_log_level))
}
