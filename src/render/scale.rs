use std::collections::HashMap;

use chrono::NaiveDate;

/// Smallest value span a scale divides by; a flat series maps to the bottom
/// of the range instead of producing NaN.
const MIN_DOMAIN_SPAN: f64 = 1e-9;

/// Categorical date axis with one equal-width slot per date.
pub trait BandMapping {
    /// Left edge of the slot for `date`, or `None` if the date is not on the axis.
    fn position(&self, date: NaiveDate) -> Option<f64>;

    fn bandwidth(&self) -> f64;

    fn center(&self, date: NaiveDate) -> Option<f64> {
        self.position(date).map(|x| x + self.bandwidth() / 2.0)
    }
}

/// Continuous value axis.
pub trait ValueMapping {
    fn map(&self, value: f64) -> f64;
}

#[derive(Debug, Clone)]
pub struct BandScale {
    slots: HashMap<NaiveDate, usize>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// Spreads `domain` over `range`. `padding` is the fraction of a step left
    /// empty between slots and at both ends (`0.0..1.0`). Repeated dates keep
    /// their first slot.
    pub fn new(domain: impl IntoIterator<Item = NaiveDate>, range: (f64, f64), padding: f64) -> Self {
        let mut slots = HashMap::new();
        for date in domain {
            let next = slots.len();
            slots.entry(date).or_insert(next);
        }

        let padding = padding.clamp(0.0, 0.99);
        let n = slots.len() as f64;
        let width = (range.1 - range.0).max(0.0);
        let step = if slots.is_empty() { 0.0 } else { width / (n + padding) };

        Self {
            slots,
            start: range.0 + step * padding,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl BandMapping for BandScale {
    fn position(&self, date: NaiveDate) -> Option<f64> {
        self.slots.get(&date).map(|&i| self.start + self.step * i as f64)
    }

    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

/// Linear map from a value domain onto a pixel range. Pass the range as
/// `(bottom, top)` to get the usual inverted screen axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Domain taken from the finite extent of `values`, widened by `margin`
    /// (a fraction of the span) on both sides. No finite values gives `[0, 1]`.
    pub fn auto(values: impl IntoIterator<Item = f64>, range: (f64, f64), margin: f64) -> Self {
        let extent = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });

        let domain = match extent {
            Some((lo, hi)) if hi > lo => {
                let pad = (hi - lo) * margin;
                (lo - pad, hi + pad)
            }
            // flat series: give it some room around the single value
            Some((v, _)) => {
                let pad = (v.abs() * margin).max(1.0);
                (v - pad, v + pad)
            }
            None => (0.0, 1.0),
        };
        Self::new(domain, range)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// `count` evenly spaced values across the domain, both ends included.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.domain.0],
            _ => {
                let step = (self.domain.1 - self.domain.0) / (count - 1) as f64;
                (0..count).map(|i| self.domain.0 + step * i as f64).collect()
            }
        }
    }
}

impl ValueMapping for LinearScale {
    fn map(&self, value: f64) -> f64 {
        let span = (self.domain.1 - self.domain.0).max(MIN_DOMAIN_SPAN);
        let norm = (value - self.domain.0) / span;
        self.range.0 + norm * (self.range.1 - self.range.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_band_scale_without_padding_tiles_the_range() {
        let scale = BandScale::new([day(6), day(7), day(8), day(9)], (0.0, 400.0), 0.0);

        assert_eq!(scale.bandwidth(), 100.0);
        assert_eq!(scale.position(day(6)), Some(0.0));
        assert_eq!(scale.position(day(9)), Some(300.0));
        assert_eq!(scale.center(day(7)), Some(150.0));
    }

    #[test]
    fn test_band_scale_padding_shrinks_slots() {
        let scale = BandScale::new([day(6), day(7)], (0.0, 210.0), 0.1);

        assert!((scale.bandwidth() - 90.0).abs() < 1e-9);
        assert!((scale.position(day(6)).unwrap() - 10.0).abs() < 1e-9);
        assert!((scale.position(day(7)).unwrap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_scale_unknown_and_repeated_dates() {
        let scale = BandScale::new([day(6), day(6), day(7)], (0.0, 200.0), 0.0);

        assert_eq!(scale.len(), 2);
        assert_eq!(scale.position(day(6)), Some(0.0));
        assert_eq!(scale.position(day(8)), None);
    }

    #[test]
    fn test_empty_band_scale() {
        let scale = BandScale::new(Vec::new(), (0.0, 200.0), 0.1);
        assert!(scale.is_empty());
        assert_eq!(scale.bandwidth(), 0.0);
    }

    #[test]
    fn test_linear_scale_inverts_screen_axis() {
        let scale = LinearScale::new((0.0, 100.0), (300.0, 0.0));

        assert_eq!(scale.map(0.0), 300.0);
        assert_eq!(scale.map(100.0), 0.0);
        assert_eq!(scale.map(25.0), 225.0);
    }

    #[test]
    fn test_flat_domain_does_not_divide_by_zero() {
        let scale = LinearScale::new((5.0, 5.0), (100.0, 0.0));
        assert!(scale.map(5.0).is_finite());
    }

    #[test]
    fn test_auto_domain_ignores_non_finite_values() {
        let scale = LinearScale::auto([10.0, f64::NAN, 20.0, f64::INFINITY], (100.0, 0.0), 0.1);
        assert_eq!(scale.domain(), (9.0, 21.0));
    }

    #[test]
    fn test_auto_domain_for_flat_and_empty_input() {
        assert_eq!(LinearScale::auto([50.0, 50.0], (1.0, 0.0), 0.1).domain(), (45.0, 55.0));
        assert_eq!(LinearScale::auto(Vec::new(), (1.0, 0.0), 0.1).domain(), (0.0, 1.0));
    }

    #[test]
    fn test_ticks_cover_domain() {
        let scale = LinearScale::new((0.0, 100.0), (1.0, 0.0));
        assert_eq!(scale.ticks(5), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert!(scale.ticks(0).is_empty());
    }
}
