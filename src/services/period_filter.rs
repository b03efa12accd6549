use chrono::{Months, NaiveDate, Utc};

use crate::models::{Dated, MarketData, PeriodFilter};

/// First date (inclusive) that a period keeps, or `None` for no filtering.
///
/// Months and years are stepped back on the UTC calendar date. When the
/// target month is shorter than `now`'s day of month the result is clamped to
/// that month's last day, so 2024-03-31 minus one month is 2024-02-29.
pub fn cutoff_date(period: PeriodFilter, now: NaiveDate) -> Option<NaiveDate> {
    let months = period.months_back()?;
    now.checked_sub_months(Months::new(months))
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Rows dated on or after `cutoff`; everything when `cutoff` is `None`.
pub fn filter_series<T: Dated + Clone>(rows: &[T], cutoff: Option<NaiveDate>) -> Vec<T> {
    match cutoff {
        Some(cutoff) => rows.iter().filter(|row| row.date() >= cutoff).cloned().collect(),
        None => rows.to_vec(),
    }
}

/// Applies the same cutoff to all five series so later joins line up.
pub fn filter_market_data(data: &MarketData, cutoff: Option<NaiveDate>) -> MarketData {
    MarketData {
        symbol: data.symbol.clone(),
        price: filter_series(&data.price, cutoff),
        sma: filter_series(&data.sma, cutoff),
        rsi: filter_series(&data.rsi, cutoff),
        macd: filter_series(&data.macd, cutoff),
        bollinger: filter_series(&data.bollinger, cutoff),
    }
}
