pub mod csv_loader;
pub mod market_data_service;
pub mod load_tracker;
pub mod period_filter;
pub mod series_join;
pub mod view_cache;
pub mod dashboard_service;
pub mod job_scheduler_service;
