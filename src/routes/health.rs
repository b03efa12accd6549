use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing::debug;

use crate::services::dashboard_service::LoadStatus;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/ready", get(ready))
}

async fn health() -> &'static str {
    debug!("GET /health - Health check");
    "OK"
}

/// 200 once the selected symbol has loaded, 503 while loading or after a failure.
async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.session.status().status {
        LoadStatus::Loaded => (StatusCode::OK, "READY"),
        LoadStatus::Failed => (StatusCode::SERVICE_UNAVAILABLE, "LOAD FAILED"),
        LoadStatus::Idle | LoadStatus::Loading => (StatusCode::SERVICE_UNAVAILABLE, "LOADING"),
    }
}
