use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::services::job_scheduler_service::JobRun;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/recent", get(recent_job_runs))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

/// GET /api/jobs/recent - Most recent job runs, newest first
async fn recent_job_runs(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<JobRun>> {
    Json(state.job_runs.recent(query.limit.unwrap_or(20)))
}
