//! CSV parsing for the five pipeline resources.
//!
//! Each resource has an explicit row schema. A record either deserializes
//! into its schema and converts into the domain type, or it is recorded as a
//! [`ParseAnomaly`] and dropped. Anomalies never abort a load. Anomaly line
//! numbers refer to the resource as published, comment lines included.

use std::collections::HashSet;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::external::series_source::SeriesKind;
use crate::models::{BollingerBand, Dated, MacdPoint, MovingAverageSet, PricePoint, RsiPoint};

/// Lines starting with this carry producer metadata (e.g. `# schema_version: 2`).
const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseAnomaly {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub kind: SeriesKind,
    pub accepted: usize,
    pub anomalies: Vec<ParseAnomaly>,
}

impl ParseReport {
    fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            accepted: 0,
            anomalies: Vec::new(),
        }
    }

    fn record(&mut self, line: u64, reason: impl Into<String>) {
        self.anomalies.push(ParseAnomaly {
            line,
            reason: reason.into(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub report: ParseReport,
}

const PREFIXED_BAND_COLUMNS: [&str; 3] = ["bb_upper", "bb_middle", "bb_lower"];
const BARE_BAND_COLUMNS: [&str; 3] = ["upper", "middle", "lower"];

/// Column naming used by a Bollinger Band file. Older producers wrote
/// `upper/middle/lower`, newer ones `bb_upper/bb_middle/bb_lower`. Values are
/// resolved per field (prefixed first, then bare), so the schema only
/// describes the file for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BandSchema {
    Prefixed,
    Bare,
    Mixed,
    Unknown,
}

impl BandSchema {
    pub fn detect(headers: &[String]) -> Self {
        let has = |names: [&str; 3]| headers.iter().any(|h| names.contains(&h.as_str()));
        match (has(PREFIXED_BAND_COLUMNS), has(BARE_BAND_COLUMNS)) {
            (true, false) => BandSchema::Prefixed,
            (false, true) => BandSchema::Bare,
            (true, true) => BandSchema::Mixed,
            (false, false) => BandSchema::Unknown,
        }
    }
}

/// Accepts `YYYY-MM-DD`, ignoring a trailing time component.
pub fn parse_trading_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split(|c: char| c == 'T' || c == ' ').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn trading_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_trading_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
}

// Empty, NaN and non-numeric cells are all "no value".
fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite()))
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(deserialize_with = "trading_date")]
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct SmaRow {
    #[serde(deserialize_with = "trading_date")]
    date: NaiveDate,
    #[serde(rename = "sma_5", default, deserialize_with = "optional_number")]
    sma5: Option<f64>,
    #[serde(rename = "sma_25", default, deserialize_with = "optional_number")]
    sma25: Option<f64>,
    #[serde(rename = "sma_50", default, deserialize_with = "optional_number")]
    sma50: Option<f64>,
    #[serde(rename = "sma_75", default, deserialize_with = "optional_number")]
    sma75: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RsiRow {
    #[serde(deserialize_with = "trading_date")]
    date: NaiveDate,
    #[serde(default, deserialize_with = "optional_number")]
    rsi: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MacdRow {
    #[serde(deserialize_with = "trading_date")]
    date: NaiveDate,
    #[serde(default, deserialize_with = "optional_number")]
    macd: Option<f64>,
    #[serde(rename = "macd_signal", default, deserialize_with = "optional_number")]
    signal: Option<f64>,
    #[serde(rename = "macd_hist", default, deserialize_with = "optional_number")]
    histogram: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BandRow {
    #[serde(deserialize_with = "trading_date")]
    date: NaiveDate,
    #[serde(default, deserialize_with = "optional_number")]
    bb_upper: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    bb_middle: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    bb_lower: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    upper: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    middle: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    lower: Option<f64>,
}

impl From<BandRow> for BollingerBand {
    fn from(row: BandRow) -> Self {
        BollingerBand {
            date: row.date,
            upper: row.bb_upper.or(row.upper),
            middle: row.bb_middle.or(row.middle),
            lower: row.bb_lower.or(row.lower),
        }
    }
}

impl TryFrom<PriceRow> for PricePoint {
    type Error = String;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        for (column, value) in [("open", row.open), ("high", row.high), ("low", row.low), ("close", row.close)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive price, got {}", column, value));
            }
        }
        if !row.volume.is_finite() || row.volume < 0.0 || row.volume.fract() != 0.0 {
            return Err(format!("volume must be a non-negative integer, got {}", row.volume));
        }

        Ok(PricePoint::new(row.date, row.open, row.high, row.low, row.close, row.volume as u64))
    }
}

fn normalize_headers(raw: &StringRecord) -> Vec<String> {
    raw.iter().map(|h| h.trim().to_lowercase()).collect()
}

/// Comment and blank lines removed, plus the published line number of each
/// kept line.
struct CleanText {
    body: String,
    lines: Vec<u64>,
}

impl CleanText {
    fn new(text: &str) -> Self {
        let mut body = String::with_capacity(text.len());
        let mut lines = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with(COMMENT_MARKER) {
                continue;
            }
            body.push_str(line);
            body.push('\n');
            lines.push(index as u64 + 1);
        }
        Self { body, lines }
    }

    /// Maps a line of the cleaned body back to the published resource.
    fn source_line(&self, position: Option<&csv::Position>) -> u64 {
        position
            .and_then(|p| p.line().checked_sub(1))
            .and_then(|i| self.lines.get(i as usize).copied())
            .unwrap_or_default()
    }
}

fn parse_rows<R, T>(
    text: &str,
    kind: SeriesKind,
    inspect_headers: impl Fn(&[String]),
    convert: impl Fn(R) -> Result<T, String>,
) -> Parsed<T>
where
    R: DeserializeOwned,
    T: Dated,
{
    let mut report = ParseReport::new(kind);
    let mut rows = Vec::new();

    let clean = CleanText::new(text);
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(clean.body.as_bytes());

    let headers = match reader.headers() {
        Ok(raw) => normalize_headers(raw),
        Err(e) => {
            report.record(clean.lines.first().copied().unwrap_or(1), format!("unreadable header: {}", e));
            return Parsed { rows, report };
        }
    };
    inspect_headers(&headers);
    let headers = StringRecord::from(headers);

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                report.record(clean.source_line(e.position()), e.to_string());
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = clean.source_line(record.position());

        let row = match record.deserialize::<R>(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                report.record(line, e.to_string());
                continue;
            }
        };

        match convert(row) {
            Ok(value) => rows.push(value),
            Err(reason) => report.record(line, reason),
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    rows.retain(|row: &T| {
        let fresh = seen.insert(row.date());
        if !fresh {
            duplicates.push(row.date());
        }
        fresh
    });
    for date in duplicates {
        report.record(0, format!("duplicate date {} dropped", date));
    }

    rows.sort_by_key(|row| row.date());
    report.accepted = rows.len();

    Parsed { rows, report }
}

pub fn parse_price(text: &str) -> Parsed<PricePoint> {
    parse_rows(text, SeriesKind::Price, |_| {}, |row: PriceRow| PricePoint::try_from(row))
}

pub fn parse_sma(text: &str) -> Parsed<MovingAverageSet> {
    parse_rows(text, SeriesKind::Sma, |_| {}, |row: SmaRow| {
        Ok(MovingAverageSet {
            date: row.date,
            sma5: row.sma5,
            sma25: row.sma25,
            sma50: row.sma50,
            sma75: row.sma75,
        })
    })
}

pub fn parse_rsi(text: &str) -> Parsed<RsiPoint> {
    parse_rows(text, SeriesKind::Rsi, |_| {}, |row: RsiRow| {
        Ok(RsiPoint {
            date: row.date,
            rsi: row.rsi,
        })
    })
}

pub fn parse_macd(text: &str) -> Parsed<MacdPoint> {
    parse_rows(text, SeriesKind::Macd, |_| {}, |row: MacdRow| {
        Ok(MacdPoint {
            date: row.date,
            macd: row.macd,
            signal: row.signal,
            histogram: row.histogram,
        })
    })
}

pub fn parse_bollinger(text: &str) -> Parsed<BollingerBand> {
    let log_schema = |headers: &[String]| {
        debug!("Bollinger band file uses {:?} column schema", BandSchema::detect(headers));
    };

    parse_rows(text, SeriesKind::Bollinger, log_schema, |row: BandRow| Ok(BollingerBand::from(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_price_headers_are_case_insensitive_and_comments_skipped() {
        let text = "# schema_version: 1\n# source: stooq\nDate,Open,High,Low,Close,Volume\n\
                    2025-01-06,100,110,95,105,1200000\n\n2025-01-07,105,108,101,102,980000.0\n";
        let parsed = parse_price(text);

        assert!(parsed.report.is_clean(), "{:?}", parsed.report.anomalies);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].date, date("2025-01-06"));
        assert_eq!(parsed.rows[0].close, 105.0);
        assert_eq!(parsed.rows[1].volume, 980_000);
    }

    #[test]
    fn test_malformed_price_rows_are_dropped_and_reported() {
        let text = "date,open,high,low,close,volume\n\
                    2025-01-06,100,110,95,105,1000\n\
                    not-a-date,100,110,95,105,1000\n\
                    2025-01-08,abc,110,95,105,1000\n\
                    2025-01-09,100,110,95,105,-5\n\
                    2025-01-10,100,110,95\n\
                    2025-01-13,101,111,96,106,2000\n";
        let parsed = parse_price(text);

        let dates: Vec<NaiveDate> = parsed.rows.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date("2025-01-06"), date("2025-01-13")]);
        assert_eq!(parsed.report.anomalies.len(), 4);
        assert_eq!(parsed.report.accepted, 2);
        assert_eq!(parsed.report.anomalies[0].line, 3);
    }

    #[test]
    fn test_sma_warm_up_cells_are_absent() {
        let text = "date,sma_5,sma_25,sma_50,sma_75\n2025-01-06,101.5,,,\n2025-01-07,102.0,99.1,NaN,n/a\n";
        let parsed = parse_sma(text);

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].sma5, Some(101.5));
        assert_eq!(parsed.rows[0].sma25, None);
        assert_eq!(parsed.rows[1].sma25, Some(99.1));
        assert_eq!(parsed.rows[1].sma50, None);
        assert_eq!(parsed.rows[1].sma75, None);
    }

    #[test]
    fn test_macd_columns_are_renamed() {
        let text = "date,macd,macd_signal,macd_hist\n2025-01-06,1.5,1.0,0.5\n";
        let parsed = parse_macd(text);

        let point = &parsed.rows[0];
        assert_eq!(point.macd, Some(1.5));
        assert_eq!(point.signal, Some(1.0));
        assert_eq!(point.histogram, Some(0.5));
    }

    #[test]
    fn test_bollinger_accepts_both_namings() {
        let bare = parse_bollinger("date,upper,middle,lower\n2025-01-06,110,100,90\n");
        let prefixed = parse_bollinger("date,BB_Upper,BB_Middle,BB_Lower\n2025-01-06,110,100,90\n");

        assert_eq!(bare.rows, prefixed.rows);
        assert_eq!(bare.rows[0].upper, Some(110.0));
        assert_eq!(bare.rows[0].lower, Some(90.0));
    }

    #[test]
    fn test_bollinger_prefixed_columns_win_when_both_present() {
        let text = "date,upper,bb_upper,bb_middle,bb_lower\n2025-01-06,1,110,100,90\n";
        let parsed = parse_bollinger(text);

        assert!(parsed.report.is_clean(), "{:?}", parsed.report.anomalies);
        assert_eq!(parsed.rows[0].upper, Some(110.0));
    }

    #[test]
    fn test_bollinger_extra_prefixed_column_keeps_bare_values() {
        let parsed = parse_bollinger("date,upper,middle,lower,bb_width\n2025-01-06,110,100,90,20\n");

        assert!(parsed.report.is_clean(), "{:?}", parsed.report.anomalies);
        let band = &parsed.rows[0];
        assert_eq!(band.upper, Some(110.0));
        assert_eq!(band.middle, Some(100.0));
        assert_eq!(band.lower, Some(90.0));
    }

    #[test]
    fn test_bollinger_mixed_header_resolves_each_field() {
        let parsed = parse_bollinger("date,bb_upper,bb_middle,lower\n2025-01-06,110,100,90\n");

        let band = &parsed.rows[0];
        assert_eq!(band.upper, Some(110.0));
        assert_eq!(band.middle, Some(100.0));
        assert_eq!(band.lower, Some(90.0));
    }

    #[test]
    fn test_band_schema_detection() {
        let headers = |raw: &str| raw.split(',').map(str::to_string).collect::<Vec<_>>();

        assert_eq!(BandSchema::detect(&headers("date,bb_upper,bb_middle,bb_lower")), BandSchema::Prefixed);
        assert_eq!(BandSchema::detect(&headers("date,upper,middle,lower,bb_width")), BandSchema::Bare);
        assert_eq!(BandSchema::detect(&headers("date,bb_upper,bb_middle,lower")), BandSchema::Mixed);
        assert_eq!(BandSchema::detect(&headers("date,width")), BandSchema::Unknown);
    }

    #[test]
    fn test_anomaly_lines_count_comments_and_blank_lines() {
        let text = "# schema_version: 2\r\n# source: pipeline\r\ndate,rsi\r\n2025-01-06,45\r\n   \r\n2025-01-07,50,1\r\n";
        let parsed = parse_rsi(text);

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.report.anomalies.len(), 1, "{:?}", parsed.report.anomalies);
        assert_eq!(parsed.report.anomalies[0].line, 6);
    }

    #[test]
    fn test_all_empty_records_are_skipped() {
        let parsed = parse_macd("date,macd,macd_signal,macd_hist\n,,,\n2025-01-06,1.5,1.0,0.5\n");

        assert!(parsed.report.is_clean(), "{:?}", parsed.report.anomalies);
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_rows_are_sorted_and_duplicate_dates_dropped() {
        let text = "date,rsi\n2025-01-08,40\n2025-01-06,55\n2025-01-08,41\n";
        let parsed = parse_rsi(text);

        let dates: Vec<NaiveDate> = parsed.rows.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date("2025-01-06"), date("2025-01-08")]);
        assert_eq!(parsed.rows[1].rsi, Some(40.0));
        assert_eq!(parsed.report.anomalies.len(), 1);
    }

    #[test]
    fn test_timestamp_suffix_is_ignored() {
        assert_eq!(parse_trading_date("2025-01-06T00:00:00Z"), Some(date("2025-01-06")));
        assert_eq!(parse_trading_date("2025-01-06 00:00:00"), Some(date("2025-01-06")));
        assert_eq!(parse_trading_date("06/01/2025"), None);
    }

    #[test]
    fn test_empty_resource_yields_no_rows() {
        let parsed = parse_rsi("");
        assert!(parsed.rows.is_empty());
        assert!(parsed.report.is_clean());
    }
}
