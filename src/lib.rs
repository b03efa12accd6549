pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;
