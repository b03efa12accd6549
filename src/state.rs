use std::sync::Arc;

use crate::render::Layout;
use crate::services::dashboard_service::DashboardSession;
use crate::services::job_scheduler_service::JobRunLog;

#[derive(Clone)]
pub struct AppState {
    pub session: DashboardSession,
    pub layout: Layout,
    pub job_runs: Arc<JobRunLog>,
}
