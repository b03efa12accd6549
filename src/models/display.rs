use serde::{Deserialize, Serialize};

use super::OverlaySeries;

/// Which indicators the dashboard draws. Passed by value down the render
/// path; a toggle that is on for a series without data draws nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub sma5: bool,
    pub sma25: bool,
    pub sma50: bool,
    pub sma75: bool,
    pub bollinger: bool,
    pub rsi: bool,
    pub macd: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            sma5: true,
            sma25: true,
            sma50: false,
            sma75: false,
            bollinger: false,
            rsi: false,
            macd: false,
        }
    }
}

impl DisplayOptions {
    /// Overlays to draw on the price panel, Bollinger first so the moving
    /// averages end up on top.
    pub fn enabled_overlays(&self) -> Vec<OverlaySeries> {
        let mut overlays = Vec::new();
        if self.bollinger {
            overlays.extend(OverlaySeries::BOLLINGER);
        }
        let averages = [
            (self.sma5, OverlaySeries::Sma5),
            (self.sma25, OverlaySeries::Sma25),
            (self.sma50, OverlaySeries::Sma50),
            (self.sma75, OverlaySeries::Sma75),
        ];
        overlays.extend(averages.into_iter().filter(|(on, _)| *on).map(|(_, series)| series));
        overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_show_short_averages_only() {
        let overlays = DisplayOptions::default().enabled_overlays();
        assert_eq!(overlays, vec![OverlaySeries::Sma5, OverlaySeries::Sma25]);
    }

    #[test]
    fn test_bollinger_toggle_enables_all_three_bands() {
        let options = DisplayOptions {
            sma5: false,
            sma25: false,
            bollinger: true,
            ..DisplayOptions::default()
        };
        assert_eq!(options.enabled_overlays(), OverlaySeries::BOLLINGER.to_vec());
    }
}
