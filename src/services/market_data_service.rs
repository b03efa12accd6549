use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::series_source::{SeriesKind, SeriesSource, SourceError};
use crate::models::{MarketData, Symbol};
use crate::services::csv_loader::{self, ParseReport};

/// A complete dataset plus the row anomalies hit while parsing it.
#[derive(Debug, Clone)]
pub struct LoadedMarketData {
    pub data: MarketData,
    pub reports: Vec<ParseReport>,
}

impl LoadedMarketData {
    /// Rows dropped across all five resources.
    pub fn dropped_rows(&self) -> usize {
        self.reports.iter().map(|r| r.anomalies.len()).sum()
    }
}

/// Fetches and parses the five resources of a symbol as one unit.
pub struct MarketDataLoader {
    source: Arc<dyn SeriesSource>,
    timeout: Option<Duration>,
}

impl MarketDataLoader {
    pub fn new(source: Arc<dyn SeriesSource>, timeout: Option<Duration>) -> Self {
        Self { source, timeout }
    }

    async fn fetch(&self, symbol: &Symbol, kind: SeriesKind) -> Result<String, SourceError> {
        let request = self.source.fetch(symbol, kind);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(SourceError::Timeout(limit.as_secs()))),
            None => request.await,
        }
    }

    /// Loads all five series concurrently. Waits for every request to settle;
    /// if any failed, the first failure in resource order is returned and no
    /// data is exposed.
    pub async fn load(&self, symbol: &Symbol) -> Result<LoadedMarketData, AppError> {
        info!("📥 Loading market data for {} from {}", symbol, self.source.describe());

        let (price, sma, rsi, macd, bollinger) = futures::join!(
            self.fetch(symbol, SeriesKind::Price),
            self.fetch(symbol, SeriesKind::Sma),
            self.fetch(symbol, SeriesKind::Rsi),
            self.fetch(symbol, SeriesKind::Macd),
            self.fetch(symbol, SeriesKind::Bollinger),
        );

        let require = |kind: SeriesKind, result: Result<String, SourceError>| {
            result.map_err(|reason| {
                error!("✗ Failed to fetch {} data for {}: {}", kind, symbol, reason);
                AppError::Fetch { kind, reason }
            })
        };
        let price = require(SeriesKind::Price, price)?;
        let sma = require(SeriesKind::Sma, sma)?;
        let rsi = require(SeriesKind::Rsi, rsi)?;
        let macd = require(SeriesKind::Macd, macd)?;
        let bollinger = require(SeriesKind::Bollinger, bollinger)?;

        let price = csv_loader::parse_price(&price);
        let sma = csv_loader::parse_sma(&sma);
        let rsi = csv_loader::parse_rsi(&rsi);
        let macd = csv_loader::parse_macd(&macd);
        let bollinger = csv_loader::parse_bollinger(&bollinger);

        let reports = vec![price.report, sma.report, rsi.report, macd.report, bollinger.report];
        for report in reports.iter().filter(|r| !r.is_clean()) {
            warn!(
                "CSV anomalies in {} data for {}: {} row(s) dropped, {} kept",
                report.kind,
                symbol,
                report.anomalies.len(),
                report.accepted
            );
            for anomaly in &report.anomalies {
                warn!("  {} line {}: {}", report.kind, anomaly.line, anomaly.reason);
            }
        }

        let data = MarketData {
            symbol: symbol.clone(),
            price: price.rows,
            sma: sma.rows,
            rsi: rsi.rows,
            macd: macd.rows,
            bollinger: bollinger.rows,
        };

        info!(
            "✓ Loaded {} price rows for {} (last update {})",
            data.price.len(),
            symbol,
            data.last_update().map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
        );

        Ok(LoadedMarketData { data, reports })
    }
}
