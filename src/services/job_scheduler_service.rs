use crate::errors::AppError;
use crate::jobs::refresh_job;
use crate::services::dashboard_service::DashboardSession;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

const MAX_RECORDED_RUNS: usize = 50;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub session: DashboardSession,
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRun {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub items_processed: Option<i32>,
    pub items_failed: Option<i32>,
    pub duration_ms: i64,
}

/// Most recent job runs, newest first. Bounded; older runs fall off.
#[derive(Debug, Default)]
pub struct JobRunLog {
    runs: RwLock<VecDeque<JobRun>>,
}

impl JobRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, run: JobRun) {
        let mut runs = self.runs.write();
        runs.push_front(run);
        runs.truncate(MAX_RECORDED_RUNS);
    }

    pub fn recent(&self, limit: usize) -> Vec<JobRun> {
        self.runs.read().iter().take(limit).cloned().collect()
    }
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    runs: Arc<JobRunLog>,
}

impl JobSchedulerService {
    pub async fn new(session: DashboardSession, runs: Arc<JobRunLog>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context: JobContext { session },
            runs,
        })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self, refresh_cron: &str) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        // format: sec min hour day month weekday, evaluated in UTC
        self.schedule_job(
            refresh_cron,
            "refresh_dashboard",
            "Daily data refresh",
            refresh_job::refresh_dashboard,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let runs = self.runs.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let runs = runs.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(&runs, job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::Config(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

// Job tracking wrapper
pub(crate) async fn execute_job_with_tracking<F, Fut>(
    runs: &JobRunLog,
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    let run = match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
            JobRun {
                job_name: job_name.to_string(),
                started_at,
                status: JobStatus::Success,
                error_message: None,
                items_processed: Some(job_result.items_processed),
                items_failed: Some(job_result.items_failed),
                duration_ms,
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);
            JobRun {
                job_name: job_name.to_string(),
                started_at,
                status: JobStatus::Failed,
                error_message: Some(e.to_string()),
                items_processed: None,
                items_failed: None,
                duration_ms,
            }
        }
    };
    runs.record(run);
}
