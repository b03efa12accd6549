//! Background Jobs Module
//!
//! Jobs registered with the job scheduler service. They run outside request
//! handling and only touch the dashboard through its public session API.
//!
//! # Available Jobs
//!
//! - `refresh_job` - Reloads the selected symbol after the upstream pipeline
//!   has published the day's CSV files

pub mod refresh_job;
