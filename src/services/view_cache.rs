use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::debug;

use crate::models::{CombinedChartPoint, MarketData, PeriodFilter};
use crate::services::period_filter::{cutoff_date, filter_market_data};
use crate::services::series_join::join_series;

/// A dataset filtered to one period, with price/SMA/BB joined for charting.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub period: PeriodFilter,
    pub cutoff: Option<NaiveDate>,
    pub data: MarketData,
    pub combined: Vec<CombinedChartPoint>,
}

impl ChartView {
    pub fn build(source: &MarketData, period: PeriodFilter, cutoff: Option<NaiveDate>) -> Self {
        let data = filter_market_data(source, cutoff);
        let combined = join_series(&data.price, &data.sma, &data.bollinger);
        Self {
            period,
            cutoff,
            data,
            combined,
        }
    }
}

type ViewKey = (u64, PeriodFilter, Option<NaiveDate>);

/// Memoizes [`ChartView`]s by load generation, period and cutoff date so the
/// filter and join only rerun when one of them changes.
#[derive(Debug, Default)]
pub struct ViewCache {
    views: DashMap<ViewKey, Arc<ChartView>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        generation: u64,
        source: &MarketData,
        period: PeriodFilter,
        today: NaiveDate,
    ) -> Arc<ChartView> {
        let cutoff = cutoff_date(period, today);
        self.views
            .entry((generation, period, cutoff))
            .or_insert_with(|| {
                debug!("Building {} view for {} (cutoff {:?})", period, source.symbol, cutoff);
                Arc::new(ChartView::build(source, period, cutoff))
            })
            .clone()
    }

    /// Drops views built from any other load.
    pub fn retain_generation(&self, generation: u64) {
        self.views.retain(|(g, _, _), _| *g == generation);
    }

    /// Drops views built from `generation`.
    pub fn evict_generation(&self, generation: u64) {
        self.views.retain(|(g, _, _), _| *g != generation);
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
