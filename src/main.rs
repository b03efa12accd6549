use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use marketvision::app;
use marketvision::config::AppConfig;
use marketvision::logging::{init_logging, LoggingConfig};
use marketvision::services::dashboard_service::DashboardSession;
use marketvision::services::job_scheduler_service::{JobRunLog, JobSchedulerService};
use marketvision::services::market_data_service::MarketDataLoader;
use marketvision::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logging before config so config errors are visible
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().context("Invalid configuration")?;
    config.log_summary();

    let source = config.data_base.source();
    tracing::info!("📊 Reading market data from {}", source.describe());

    let loader = MarketDataLoader::new(source, config.fetch_timeout);
    let session = DashboardSession::new(loader, config.symbol_registry());
    session
        .select_symbol(config.default_symbol.as_str())
        .context("Default symbol could not be selected")?;

    let job_runs = Arc::new(JobRunLog::new());
    let mut scheduler = JobSchedulerService::new(session.clone(), job_runs.clone()).await?;
    scheduler.start(&config.refresh_cron).await?;

    let state = AppState {
        session: session.clone(),
        layout: config.layout(),
        job_runs,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 MarketVision running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("🛑 Shutting down");
    session.shutdown();
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler did not stop cleanly: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
