use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relative look-back window applied to every series of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PeriodFilter {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    /// No cutoff; the full history is shown.
    Custom,
}

impl PeriodFilter {
    pub const RELATIVE: [PeriodFilter; 6] = [
        PeriodFilter::OneMonth,
        PeriodFilter::ThreeMonths,
        PeriodFilter::SixMonths,
        PeriodFilter::OneYear,
        PeriodFilter::ThreeYears,
        PeriodFilter::FiveYears,
    ];

    /// Calendar months to step back, or `None` for the unbounded marker.
    pub fn months_back(&self) -> Option<u32> {
        match self {
            PeriodFilter::OneMonth => Some(1),
            PeriodFilter::ThreeMonths => Some(3),
            PeriodFilter::SixMonths => Some(6),
            PeriodFilter::OneYear => Some(12),
            PeriodFilter::ThreeYears => Some(36),
            PeriodFilter::FiveYears => Some(60),
            PeriodFilter::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodFilter::OneMonth => "1M",
            PeriodFilter::ThreeMonths => "3M",
            PeriodFilter::SixMonths => "6M",
            PeriodFilter::OneYear => "1Y",
            PeriodFilter::ThreeYears => "3Y",
            PeriodFilter::FiveYears => "5Y",
            PeriodFilter::Custom => "Custom",
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Ok(PeriodFilter::OneMonth),
            "3M" => Ok(PeriodFilter::ThreeMonths),
            "6M" => Ok(PeriodFilter::SixMonths),
            "1Y" => Ok(PeriodFilter::OneYear),
            "3Y" => Ok(PeriodFilter::ThreeYears),
            "5Y" => Ok(PeriodFilter::FiveYears),
            "CUSTOM" => Ok(PeriodFilter::Custom),
            other => Err(format!("Unknown period filter: {}", other)),
        }
    }
}
