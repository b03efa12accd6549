use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{dashboard, health, jobs, symbols};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/symbols", symbols::router())
        .nest("/api/dashboard", dashboard::router())
        .nest("/api/jobs", jobs::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
