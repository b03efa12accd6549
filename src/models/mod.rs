mod price_point;
mod indicator;
mod chart_point;
mod market_data;
mod period;
mod symbol;
mod display;

use chrono::NaiveDate;

pub use price_point::PricePoint;
pub use indicator::{BollingerBand, MacdPoint, MovingAverageSet, RsiPoint};
pub use chart_point::{CombinedChartPoint, OverlaySeries};
pub use market_data::MarketData;
pub use period::PeriodFilter;
pub use symbol::{Symbol, SymbolInfo, SymbolRegistry};
pub use display::DisplayOptions;

/// Rows keyed by trading day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}
