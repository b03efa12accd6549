use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::Symbol;

/// The five CSV resources published per symbol by the indicator pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Price,
    Sma,
    Rsi,
    Macd,
    Bollinger,
}

impl SeriesKind {
    /// Path of the resource relative to the configured data base.
    pub fn relative_path(&self, symbol: &Symbol) -> String {
        match self {
            SeriesKind::Price => format!("data/price/{}.csv", symbol),
            SeriesKind::Sma => format!("data/indicators/{}_sma.csv", symbol),
            SeriesKind::Rsi => format!("data/indicators/{}_rsi.csv", symbol),
            SeriesKind::Macd => format!("data/indicators/{}_macd.csv", symbol),
            SeriesKind::Bollinger => format!("data/indicators/{}_bb.csv", symbol),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::Price => "price",
            SeriesKind::Sma => "SMA",
            SeriesKind::Rsi => "RSI",
            SeriesKind::Macd => "MACD",
            SeriesKind::Bollinger => "BB",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("status {status} for {location}")]
    Status { status: u16, location: String },

    #[error("resource not found: {0}")]
    Missing(String),

    #[error("io error reading {location}: {message}")]
    Io { location: String, message: String },

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Read-only access to the published CSV resources.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, symbol: &Symbol, kind: SeriesKind) -> Result<String, SourceError>;

    /// Human-readable location used in log lines.
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_follow_pipeline_layout() {
        let symbol = Symbol::new("9501.T");
        assert_eq!(SeriesKind::Price.relative_path(&symbol), "data/price/9501.T.csv");
        assert_eq!(SeriesKind::Sma.relative_path(&symbol), "data/indicators/9501.T_sma.csv");
        assert_eq!(SeriesKind::Rsi.relative_path(&symbol), "data/indicators/9501.T_rsi.csv");
        assert_eq!(SeriesKind::Macd.relative_path(&symbol), "data/indicators/9501.T_macd.csv");
        assert_eq!(SeriesKind::Bollinger.relative_path(&symbol), "data/indicators/9501.T_bb.csv");
    }
}
