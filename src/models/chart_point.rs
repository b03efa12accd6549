use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Dated;

/// A price row with the SMA and Bollinger values recorded for the same date.
/// Indicator fields stay `None` when the indicator series has no value for
/// the date; they are never defaulted or interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedChartPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub sma5: Option<f64>,
    pub sma25: Option<f64>,
    pub sma50: Option<f64>,
    pub sma75: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl Dated for CombinedChartPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Series that can be drawn over the candlesticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySeries {
    Sma5,
    Sma25,
    Sma50,
    Sma75,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
}

impl OverlaySeries {
    pub const MOVING_AVERAGES: [OverlaySeries; 4] = [
        OverlaySeries::Sma5,
        OverlaySeries::Sma25,
        OverlaySeries::Sma50,
        OverlaySeries::Sma75,
    ];

    pub const BOLLINGER: [OverlaySeries; 3] = [
        OverlaySeries::BollingerUpper,
        OverlaySeries::BollingerMiddle,
        OverlaySeries::BollingerLower,
    ];

    pub fn value(&self, point: &CombinedChartPoint) -> Option<f64> {
        match self {
            OverlaySeries::Sma5 => point.sma5,
            OverlaySeries::Sma25 => point.sma25,
            OverlaySeries::Sma50 => point.sma50,
            OverlaySeries::Sma75 => point.sma75,
            OverlaySeries::BollingerUpper => point.bb_upper,
            OverlaySeries::BollingerMiddle => point.bb_middle,
            OverlaySeries::BollingerLower => point.bb_lower,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverlaySeries::Sma5 => "SMA5",
            OverlaySeries::Sma25 => "SMA25",
            OverlaySeries::Sma50 => "SMA50",
            OverlaySeries::Sma75 => "SMA75",
            OverlaySeries::BollingerUpper => "BB upper",
            OverlaySeries::BollingerMiddle => "BB middle",
            OverlaySeries::BollingerLower => "BB lower",
        }
    }
}
