use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BollingerBand, MacdPoint, MovingAverageSet, PricePoint, RsiPoint, Symbol};

/// The five series loaded for one symbol. Built once per load and never
/// mutated afterwards; filtered views are new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: Symbol,
    pub price: Vec<PricePoint>,
    pub sma: Vec<MovingAverageSet>,
    pub rsi: Vec<RsiPoint>,
    pub macd: Vec<MacdPoint>,
    pub bollinger: Vec<BollingerBand>,
}

impl MarketData {
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            price: Vec::new(),
            sma: Vec::new(),
            rsi: Vec::new(),
            macd: Vec::new(),
            bollinger: Vec::new(),
        }
    }

    /// Date of the most recent price row, shown as the dashboard's last update.
    pub fn last_update(&self) -> Option<NaiveDate> {
        self.price.last().map(|p| p.date)
    }
}
