use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::models::SymbolInfo;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_symbols))
}

pub async fn list_symbols(State(state): State<AppState>) -> Json<Vec<SymbolInfo>> {
    info!("GET /api/symbols - Listing configured symbols");
    Json(state.session.symbols().all().to_vec())
}
