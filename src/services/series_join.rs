use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{BollingerBand, CombinedChartPoint, MovingAverageSet, PricePoint};

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Left-joins SMA and Bollinger rows onto the price series by exact date.
///
/// Output has one point per price row, in price order. A date missing from
/// an indicator series leaves that indicator's fields `None`.
pub fn join_series(
    price: &[PricePoint],
    sma: &[MovingAverageSet],
    bands: &[BollingerBand],
) -> Vec<CombinedChartPoint> {
    let sma_by_date: HashMap<NaiveDate, &MovingAverageSet> = sma.iter().map(|s| (s.date, s)).collect();
    let band_by_date: HashMap<NaiveDate, &BollingerBand> = bands.iter().map(|b| (b.date, b)).collect();

    price
        .iter()
        .map(|p| {
            let sma = sma_by_date.get(&p.date);
            let band = band_by_date.get(&p.date);

            CombinedChartPoint {
                date: p.date,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
                volume: p.volume,
                sma5: sma.and_then(|s| finite(s.sma5)),
                sma25: sma.and_then(|s| finite(s.sma25)),
                sma50: sma.and_then(|s| finite(s.sma50)),
                sma75: sma.and_then(|s| finite(s.sma75)),
                bb_upper: band.and_then(|b| finite(b.upper)),
                bb_middle: band.and_then(|b| finite(b.middle)),
                bb_lower: band.and_then(|b| finite(b.lower)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn price(d: &str, close: f64) -> PricePoint {
        PricePoint::new(date(d), close - 1.0, close + 2.0, close - 2.0, close, 1_000)
    }

    #[test]
    fn test_join_preserves_price_length_and_order() {
        let prices = vec![price("2025-01-06", 100.0), price("2025-01-07", 101.0), price("2025-01-08", 99.0)];
        let sma = vec![MovingAverageSet { date: date("2025-01-08"), sma5: Some(100.0), ..Default::default() }];

        let joined = join_series(&prices, &sma, &[]);

        assert_eq!(joined.len(), prices.len());
        let dates: Vec<NaiveDate> = joined.iter().map(|p| p.date).collect();
        assert_eq!(dates, prices.iter().map(|p| p.date).collect::<Vec<_>>());
        assert_eq!(joined[2].sma5, Some(100.0));
    }

    #[test]
    fn test_missing_indicator_dates_stay_absent_not_zero() {
        let prices = vec![price("2025-01-06", 100.0), price("2025-01-07", 101.0)];
        let sma = vec![MovingAverageSet { date: date("2025-01-07"), sma5: Some(100.5), sma25: None, ..Default::default() }];
        let bands = vec![BollingerBand { date: date("2025-01-07"), upper: Some(105.0), middle: Some(100.0), lower: Some(95.0) }];

        let joined = join_series(&prices, &sma, &bands);

        let first = &joined[0];
        assert_eq!(first.sma5, None);
        assert_eq!(first.sma25, None);
        assert_eq!(first.bb_upper, None);
        assert_eq!(first.bb_middle, None);
        assert_eq!(first.bb_lower, None);

        let second = &joined[1];
        assert_eq!(second.sma5, Some(100.5));
        assert_eq!(second.sma25, None);
        assert_eq!(second.bb_upper, Some(105.0));
        assert_eq!(second.bb_lower, Some(95.0));
    }

    #[test]
    fn test_indicator_dates_without_price_are_ignored() {
        let prices = vec![price("2025-01-07", 101.0)];
        let sma = vec![
            MovingAverageSet { date: date("2025-01-06"), sma5: Some(1.0), ..Default::default() },
            MovingAverageSet { date: date("2025-01-07"), sma5: Some(2.0), ..Default::default() },
        ];

        let joined = join_series(&prices, &sma, &[]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].sma5, Some(2.0));
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let prices = vec![price("2025-01-06", 100.0)];
        let bands = vec![BollingerBand { date: date("2025-01-06"), upper: Some(f64::NAN), middle: Some(100.0), lower: Some(f64::INFINITY) }];

        let joined = join_series(&prices, &[], &bands);
        assert_eq!(joined[0].bb_upper, None);
        assert_eq!(joined[0].bb_middle, Some(100.0));
        assert_eq!(joined[0].bb_lower, None);
    }

    #[test]
    fn test_empty_price_series_yields_empty_join() {
        let sma = vec![MovingAverageSet { date: date("2025-01-06"), sma5: Some(1.0), ..Default::default() }];
        assert!(join_series(&[], &sma, &[]).is_empty());
    }
}
