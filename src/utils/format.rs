//! Axis label formatting for the chart panels.

use chrono::{Datelike, NaiveDate};

/// `M/D` without zero padding, e.g. `1/7`.
pub fn format_axis_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

/// Yen amount rounded to a whole number with `,` thousands separators.
pub fn format_price(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}¥{}", sign, grouped)
}

/// Volume in millions with one decimal, e.g. `1.2M`.
pub fn format_volume(value: f64) -> String {
    format!("{:.1}M", value / 1_000_000.0)
}

pub fn format_rsi(value: f64) -> String {
    format!("{:.1}", value)
}

pub fn format_macd(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_date_has_no_padding() {
        assert_eq!(format_axis_date(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()), "1/7");
        assert_eq!(format_axis_date(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()), "12/25");
    }

    #[test]
    fn test_price_groups_thousands() {
        assert_eq!(format_price(0.0), "¥0");
        assert_eq!(format_price(999.4), "¥999");
        assert_eq!(format_price(1234.5), "¥1,235");
        assert_eq!(format_price(1_234_567.0), "¥1,234,567");
        assert_eq!(format_price(-2500.0), "-¥2,500");
    }

    #[test]
    fn test_volume_in_millions() {
        assert_eq!(format_volume(1_260_000.0), "1.3M");
        assert_eq!(format_volume(0.0), "0.0M");
    }

    #[test]
    fn test_oscillator_precision() {
        assert_eq!(format_rsi(70.0), "70.0");
        assert_eq!(format_macd(-0.456), "-0.46");
    }
}
