use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Dated;

/// Simple moving averages for one date. A window that has not filled yet
/// (the warm-up at the start of history) is `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovingAverageSet {
    pub date: NaiveDate,
    pub sma5: Option<f64>,
    pub sma25: Option<f64>,
    pub sma50: Option<f64>,
    pub sma75: Option<f64>,
}

/// 14-day RSI, bounded to `[0, 100]` by the producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RsiPoint {
    pub date: NaiveDate,
    pub rsi: Option<f64>,
}

/// MACD line, signal line and histogram (`macd - signal`, computed upstream).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MacdPoint {
    pub date: NaiveDate,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Bollinger envelope; `lower <= middle <= upper` whenever all three are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BollingerBand {
    pub date: NaiveDate,
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

impl Dated for MovingAverageSet {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for RsiPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for MacdPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for BollingerBand {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
