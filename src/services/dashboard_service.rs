use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{PeriodFilter, Symbol, SymbolRegistry};
use crate::services::load_tracker::{LoadSnapshot, LoadState, LoadTicket, LoadTracker};
use crate::services::market_data_service::MarketDataLoader;
use crate::services::view_cache::{ChartView, ViewCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatus {
    pub symbol: Option<Symbol>,
    pub status: LoadStatus,
    pub message: Option<String>,
    pub last_update: Option<NaiveDate>,
    /// CSV rows skipped while parsing the loaded dataset.
    pub dropped_rows: usize,
    pub generation: u64,
}

/// A load running in the background. Dropping it does not cancel the load.
pub struct PendingLoad {
    pub symbol: Symbol,
    handle: JoinHandle<bool>,
}

impl PendingLoad {
    /// Waits for the load to finish; `true` if its result became visible.
    pub async fn wait(self) -> bool {
        match self.handle.await {
            Ok(committed) => committed,
            Err(e) => {
                error!("Load task for {} panicked: {}", self.symbol, e);
                false
            }
        }
    }
}

struct SessionInner {
    loader: MarketDataLoader,
    tracker: LoadTracker,
    views: ViewCache,
    symbols: SymbolRegistry,
}

/// The single dashboard shared by every request: the selected symbol, its
/// load state and the period views derived from it.
#[derive(Clone)]
pub struct DashboardSession {
    inner: Arc<SessionInner>,
}

impl DashboardSession {
    pub fn new(loader: MarketDataLoader, symbols: SymbolRegistry) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                loader,
                tracker: LoadTracker::new(),
                views: ViewCache::new(),
                symbols,
            }),
        }
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.inner.symbols
    }

    /// Switches the dashboard to `raw` and starts loading it. Any load still
    /// in flight for the previous selection will be discarded when it ends.
    pub fn select_symbol(&self, raw: &str) -> Result<PendingLoad, AppError> {
        let symbol = self.inner.symbols.resolve(raw)?;
        info!("🔄 Switching dashboard to {}", symbol);
        Ok(self.start(symbol))
    }

    /// Reloads the currently selected symbol.
    pub fn reload(&self) -> Result<PendingLoad, AppError> {
        let symbol = self
            .inner
            .tracker
            .snapshot()
            .symbol
            .ok_or_else(|| AppError::Validation("No symbol selected".to_string()))?;
        info!("🔄 Reloading {}", symbol);
        Ok(self.start(symbol))
    }

    fn start(&self, symbol: Symbol) -> PendingLoad {
        let ticket = self.inner.tracker.begin(symbol.clone());
        let session = self.clone();
        let handle = tokio::spawn(async move { session.run_load(ticket).await });
        PendingLoad { symbol, handle }
    }

    async fn run_load(&self, ticket: LoadTicket) -> bool {
        let result = self
            .inner
            .loader
            .load(ticket.symbol())
            .await
            .map(Arc::new)
            .map_err(|e| e.to_string());

        let committed = self.inner.tracker.commit(&ticket, result);
        if committed {
            self.inner.views.retain_generation(ticket.generation());
        }
        committed
    }

    pub fn status(&self) -> DashboardStatus {
        let snapshot = self.inner.tracker.snapshot();
        let (status, message, last_update, dropped_rows) = match (&snapshot.symbol, &snapshot.state) {
            (None, _) => (LoadStatus::Idle, None, None, 0),
            (Some(_), LoadState::Loading) => (LoadStatus::Loading, None, None, 0),
            (Some(_), LoadState::Loaded(loaded)) => {
                (LoadStatus::Loaded, None, loaded.data.last_update(), loaded.dropped_rows())
            }
            (Some(_), LoadState::Failed(message)) => (LoadStatus::Failed, Some(message.clone()), None, 0),
        };

        DashboardStatus {
            symbol: snapshot.symbol,
            status,
            message,
            last_update,
            dropped_rows,
            generation: snapshot.generation,
        }
    }

    /// The loaded dataset filtered to `period` as of `today`.
    pub fn view(&self, period: PeriodFilter, today: NaiveDate) -> Result<Arc<ChartView>, AppError> {
        self.view_of(self.inner.tracker.snapshot(), period, today)
    }

    fn view_of(&self, snapshot: LoadSnapshot, period: PeriodFilter, today: NaiveDate) -> Result<Arc<ChartView>, AppError> {
        let loaded = match snapshot.state {
            LoadState::Loading => return Err(AppError::Loading),
            LoadState::Failed(message) => return Err(AppError::LoadFailed(message)),
            LoadState::Loaded(loaded) => loaded,
        };

        let view = self.inner.views.get_or_build(snapshot.generation, &loaded.data, period, today);

        // A load that began after the snapshot may already have pruned the
        // cache; the entry just built would then outlive its generation.
        if self.inner.tracker.snapshot().generation != snapshot.generation {
            self.inner.views.evict_generation(snapshot.generation);
        }
        Ok(view)
    }

    /// Makes in-flight loads stale so nothing commits after shutdown starts.
    pub fn shutdown(&self) {
        self.inner.tracker.invalidate();
        info!("Dashboard session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::external::series_source::SeriesKind;
    use crate::models::SymbolInfo;
    use crate::services::market_data_service::tests::StubSource;

    fn session(source: StubSource) -> DashboardSession {
        let symbols = SymbolRegistry::new(vec![
            SymbolInfo { symbol: Symbol::new("9501.T"), name: None },
            SymbolInfo { symbol: Symbol::new("9502.T"), name: None },
        ]);
        DashboardSession::new(MarketDataLoader::new(Arc::new(source), None), symbols)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_select_symbol_loads_dataset() {
        let session = session(StubSource::default().with_symbol("9501.T", 100.0));

        assert!(session.select_symbol("9501.T").unwrap().wait().await);

        let status = session.status();
        assert_eq!(status.status, LoadStatus::Loaded);
        assert_eq!(status.last_update, NaiveDate::from_ymd_opt(2025, 1, 7));

        let view = session.view(PeriodFilter::OneMonth, today()).unwrap();
        assert_eq!(view.combined.len(), 2);
        assert_eq!(view.data.symbol.as_str(), "9501.T");
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_rejected() {
        let session = session(StubSource::default());
        assert!(matches!(session.select_symbol("7203.T"), Err(AppError::Validation(_))));
        assert_eq!(session.status().status, LoadStatus::Idle);
    }

    #[tokio::test]
    async fn test_slow_earlier_load_is_discarded() {
        let source = StubSource::default()
            .with_symbol("9501.T", 100.0)
            .with_symbol("9502.T", 200.0)
            .delayed("9501.T", Duration::from_millis(100));
        let session = session(source);

        let first = session.select_symbol("9501.T").unwrap();
        let second = session.select_symbol("9502.T").unwrap();

        assert!(second.wait().await);
        assert!(!first.wait().await);

        let status = session.status();
        assert_eq!(status.symbol, Some(Symbol::new("9502.T")));
        assert_eq!(status.status, LoadStatus::Loaded);
        let view = session.view(PeriodFilter::Custom, today()).unwrap();
        assert_eq!(view.data.price[0].close, 200.0);
    }

    #[tokio::test]
    async fn test_view_reports_loading_then_failure() {
        let source = StubSource::default()
            .with_symbol("9501.T", 100.0)
            .without("9501.T", SeriesKind::Rsi)
            .delayed("9501.T", Duration::from_millis(50));
        let session = session(source);

        let pending = session.select_symbol("9501.T").unwrap();
        assert!(matches!(session.view(PeriodFilter::OneYear, today()), Err(AppError::Loading)));

        assert!(pending.wait().await);
        let status = session.status();
        assert_eq!(status.status, LoadStatus::Failed);
        assert!(status.message.unwrap().contains("RSI"));
        assert!(matches!(session.view(PeriodFilter::OneYear, today()), Err(AppError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_reload_keeps_symbol_and_evicts_old_views() {
        let session = session(StubSource::default().with_symbol("9501.T", 100.0));
        assert!(matches!(session.reload(), Err(AppError::Validation(_))));

        session.select_symbol("9501.T").unwrap().wait().await;
        session.view(PeriodFilter::OneYear, today()).unwrap();
        assert_eq!(session.inner.views.len(), 1);

        assert!(session.reload().unwrap().wait().await);
        assert_eq!(session.status().symbol, Some(Symbol::new("9501.T")));
        assert!(session.inner.views.is_empty());
    }

    #[tokio::test]
    async fn test_view_built_from_superseded_load_is_not_cached() {
        let session = session(StubSource::default().with_symbol("9501.T", 100.0));
        session.select_symbol("9501.T").unwrap().wait().await;

        let before_reload = session.inner.tracker.snapshot();
        assert!(session.reload().unwrap().wait().await);
        assert!(session.inner.views.is_empty());

        let view = session.view_of(before_reload, PeriodFilter::Custom, today()).unwrap();
        assert_eq!(view.data.symbol.as_str(), "9501.T");
        assert!(session.inner.views.is_empty());

        session.view(PeriodFilter::Custom, today()).unwrap();
        assert_eq!(session.inner.views.len(), 1);
    }

    #[tokio::test]
    async fn test_status_counts_dropped_rows() {
        let mut source = StubSource::default().with_symbol("9501.T", 100.0);
        source.files.insert(
            ("9501.T".to_string(), SeriesKind::Rsi),
            "date,rsi\n2025-01-06,45\nnot-a-date,50\n2025-01-07,55\n".to_string(),
        );
        let session = session(source);
        assert_eq!(session.status().dropped_rows, 0);

        session.select_symbol("9501.T").unwrap().wait().await;
        assert_eq!(session.status().dropped_rows, 1);
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_load() {
        let source = StubSource::default()
            .with_symbol("9501.T", 100.0)
            .delayed("9501.T", Duration::from_millis(50));
        let session = session(source);

        let pending = session.select_symbol("9501.T").unwrap();
        session.shutdown();

        assert!(!pending.wait().await);
        assert_eq!(session.status().status, LoadStatus::Loading);
    }
}
