pub mod series_source;
pub mod http_source;
pub mod fs_source;
