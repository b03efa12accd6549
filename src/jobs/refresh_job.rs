//! Daily Dashboard Refresh Job
//!
//! The indicator pipeline republishes every CSV resource once a day
//! (07:00 JST). This job reloads the currently selected symbol so the
//! dashboard picks up the new rows without a restart.
//!
//! # Job Schedule
//!
//! - **Production**: `REFRESH_CRON`, default `0 0 22 * * *` (22:00 UTC)

use crate::errors::AppError;
use crate::services::dashboard_service::LoadStatus;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::{info, warn};

/// Main entry point for the refresh job.
pub async fn refresh_dashboard(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("🔄 Refreshing dashboard data...");

    let pending = match ctx.session.reload() {
        Ok(pending) => pending,
        Err(AppError::Validation(_)) => {
            info!("No symbol selected, nothing to refresh");
            return Ok(JobResult {
                items_processed: 0,
                items_failed: 0,
            });
        }
        Err(e) => return Err(e),
    };
    let symbol = pending.symbol.clone();

    if !pending.wait().await {
        warn!("Refresh of {} was superseded by a newer load", symbol);
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    }

    let status = ctx.session.status();
    match status.status {
        LoadStatus::Loaded => Ok(JobResult {
            items_processed: 1,
            items_failed: 0,
        }),
        _ => Err(AppError::LoadFailed(
            status.message.unwrap_or_else(|| format!("Refresh of {} did not complete", symbol)),
        )),
    }
}
