use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::models::Symbol;
use crate::services::market_data_service::LoadedMarketData;

/// What the dashboard can show for the selected symbol.
#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Loaded(Arc<LoadedMarketData>),
    Failed(String),
}

/// Proof that a load was started. Only the ticket of the most recent load
/// may commit a result.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    symbol: Symbol,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

#[derive(Debug, Clone)]
pub struct LoadSnapshot {
    pub generation: u64,
    pub symbol: Option<Symbol>,
    pub state: LoadState,
}

#[derive(Debug)]
struct TrackerInner {
    generation: u64,
    symbol: Option<Symbol>,
    state: LoadState,
}

/// Guards the visible load state against results of superseded loads.
///
/// There is no network cancellation: an old load keeps running, but its
/// result is discarded at commit time because its generation is stale.
#[derive(Debug)]
pub struct LoadTracker {
    inner: RwLock<TrackerInner>,
}

impl Default for LoadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadTracker {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TrackerInner {
                generation: 0,
                symbol: None,
                state: LoadState::Loading,
            }),
        }
    }

    pub fn begin(&self, symbol: Symbol) -> LoadTicket {
        let mut inner = self.inner.write();
        inner.generation += 1;
        inner.symbol = Some(symbol.clone());
        inner.state = LoadState::Loading;
        debug!("Load #{} started for {}", inner.generation, symbol);

        LoadTicket {
            generation: inner.generation,
            symbol,
        }
    }

    /// Applies `result` if `ticket` is still the latest load. Returns whether
    /// the result became visible.
    pub fn commit(&self, ticket: &LoadTicket, result: Result<Arc<LoadedMarketData>, String>) -> bool {
        let mut inner = self.inner.write();
        if inner.generation != ticket.generation {
            info!(
                "Discarding stale load #{} for {} (current load is #{})",
                ticket.generation, ticket.symbol, inner.generation
            );
            return false;
        }

        inner.state = match result {
            Ok(data) => LoadState::Loaded(data),
            Err(message) => {
                warn!("Load #{} for {} failed: {}", ticket.generation, ticket.symbol, message);
                LoadState::Failed(message)
            }
        };
        true
    }

    /// Makes every outstanding ticket stale, e.g. on shutdown.
    pub fn invalidate(&self) {
        let mut inner = self.inner.write();
        inner.generation += 1;
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        let inner = self.inner.read();
        LoadSnapshot {
            generation: inner.generation,
            symbol: inner.symbol.clone(),
            state: inner.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::MarketData;

    fn data(symbol: &str) -> Arc<LoadedMarketData> {
        Arc::new(LoadedMarketData {
            data: MarketData::empty(Symbol::new(symbol)),
            reports: Vec::new(),
        })
    }

    #[test]
    fn test_current_ticket_commits() {
        let tracker = LoadTracker::new();
        let ticket = tracker.begin(Symbol::new("9501.T"));

        assert!(tracker.commit(&ticket, Ok(data("9501.T"))));
        assert!(matches!(tracker.snapshot().state, LoadState::Loaded(ref d) if d.data.symbol.as_str() == "9501.T"));
    }

    #[test]
    fn test_stale_result_after_newer_commit_is_discarded() {
        let tracker = LoadTracker::new();
        let first = tracker.begin(Symbol::new("9501.T"));
        let second = tracker.begin(Symbol::new("9502.T"));

        assert!(tracker.commit(&second, Ok(data("9502.T"))));
        assert!(!tracker.commit(&first, Ok(data("9501.T"))));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.symbol, Some(Symbol::new("9502.T")));
        assert!(matches!(snapshot.state, LoadState::Loaded(ref d) if d.data.symbol.as_str() == "9502.T"));
    }

    #[test]
    fn test_stale_result_does_not_replace_pending_load() {
        let tracker = LoadTracker::new();
        let first = tracker.begin(Symbol::new("9501.T"));
        let _second = tracker.begin(Symbol::new("9502.T"));

        assert!(!tracker.commit(&first, Err("boom".to_string())));
        assert!(matches!(tracker.snapshot().state, LoadState::Loading));
    }

    #[test]
    fn test_failure_is_visible_for_current_ticket() {
        let tracker = LoadTracker::new();
        let ticket = tracker.begin(Symbol::new("9501.T"));

        assert!(tracker.commit(&ticket, Err("Failed to fetch MACD data".to_string())));
        assert!(matches!(tracker.snapshot().state, LoadState::Failed(ref m) if m.contains("MACD")));
    }

    #[test]
    fn test_invalidate_discards_in_flight_load() {
        let tracker = LoadTracker::new();
        let ticket = tracker.begin(Symbol::new("9501.T"));
        tracker.invalidate();

        assert!(!tracker.commit(&ticket, Ok(data("9501.T"))));
    }
}
