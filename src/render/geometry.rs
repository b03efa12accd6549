//! Pure mapping from series to pixel-space primitives.
//!
//! Every function here takes its scales as arguments and keeps no state, so
//! the same rows and scales always give the same geometry. Rows whose date is
//! not on the band axis, or whose value is absent or non-finite, are skipped.

use chrono::NaiveDate;
use serde::Serialize;

use super::scale::{BandMapping, ValueMapping};
use crate::models::{CombinedChartPoint, Dated, MacdPoint, OverlaySeries};

/// Widest a candle body gets, whatever the band width.
pub const MAX_BODY_WIDTH: f64 = 12.0;
/// Share of the band a candle body occupies when below the cap.
pub const BODY_WIDTH_RATIO: f64 = 0.7;
/// Keeps open == close candles visible.
pub const MIN_BODY_HEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// A close equal to the open counts as bullish.
    pub fn classify(open: f64, close: f64) -> Self {
        if close >= open {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub wick: LineSegment,
    pub body: Rect,
    pub trend: Trend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    /// Consecutive point pairs. Fewer than two points yields nothing.
    pub fn segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        self.points.windows(2).map(|pair| LineSegment {
            from: pair[0],
            to: pair[1],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub rect: Rect,
}

/// A closed shape shading a stretch of the MACD panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub trend: Trend,
    pub polygon: Vec<Point>,
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

pub fn candlestick<X: BandMapping, Y: ValueMapping>(point: &CombinedChartPoint, x: &X, y: &Y) -> Option<Candle> {
    let center = x.center(point.date)?;

    let wick = LineSegment {
        from: Point::new(center, y.map(point.high)),
        to: Point::new(center, y.map(point.low)),
    };

    let width = MAX_BODY_WIDTH.min(x.bandwidth() * BODY_WIDTH_RATIO);
    let open_y = y.map(point.open);
    let close_y = y.map(point.close);
    let body = Rect {
        x: center - width / 2.0,
        y: open_y.min(close_y),
        width,
        height: (open_y - close_y).abs().max(MIN_BODY_HEIGHT),
    };

    Some(Candle {
        date: point.date,
        wick,
        body,
        trend: Trend::classify(point.open, point.close),
    })
}

pub fn candlesticks<X: BandMapping, Y: ValueMapping>(points: &[CombinedChartPoint], x: &X, y: &Y) -> Vec<Candle> {
    points.iter().filter_map(|p| candlestick(p, x, y)).collect()
}

/// Line through every defined value of `value`, in row order. Missing values
/// are bridged by connecting the neighbouring defined points.
pub fn value_line<T, F, X, Y>(rows: &[T], value: F, x: &X, y: &Y) -> Polyline
where
    T: Dated,
    F: Fn(&T) -> Option<f64>,
    X: BandMapping,
    Y: ValueMapping,
{
    let points = rows
        .iter()
        .filter_map(|row| {
            let v = defined(value(row))?;
            let cx = x.center(row.date())?;
            Some(Point::new(cx, y.map(v)))
        })
        .collect();
    Polyline { points }
}

pub fn overlay_path<X: BandMapping, Y: ValueMapping>(
    points: &[CombinedChartPoint],
    series: OverlaySeries,
    x: &X,
    y: &Y,
) -> Polyline {
    value_line(points, |p| series.value(p), x, y)
}

/// Bars from `baseline` to each defined value, filling the whole band.
pub fn bars<T, F, X, Y>(rows: &[T], value: F, baseline: f64, x: &X, y: &Y) -> Vec<Bar>
where
    T: Dated,
    F: Fn(&T) -> Option<f64>,
    X: BandMapping,
    Y: ValueMapping,
{
    let base_y = y.map(baseline);
    rows.iter()
        .filter_map(|row| {
            let v = defined(value(row))?;
            let left = x.position(row.date())?;
            let top_y = y.map(v);
            Some(Bar {
                date: row.date(),
                rect: Rect {
                    x: left,
                    y: top_y.min(base_y),
                    width: x.bandwidth(),
                    height: (top_y - base_y).abs(),
                },
            })
        })
        .collect()
}

pub fn volume_bars<X: BandMapping, Y: ValueMapping>(points: &[CombinedChartPoint], x: &X, y: &Y) -> Vec<Bar> {
    bars(points, |p| Some(p.volume as f64), 0.0, x, y)
}

pub fn histogram_bars<X: BandMapping, Y: ValueMapping>(rows: &[MacdPoint], x: &X, y: &Y) -> Vec<Bar> {
    bars(rows, |r| r.histogram, 0.0, x, y)
}

/// Reference line across `span` (left, right) at `value`.
pub fn horizontal_rule<Y: ValueMapping>(value: f64, span: (f64, f64), y: &Y) -> LineSegment {
    let at = y.map(value);
    LineSegment {
        from: Point::new(span.0, at),
        to: Point::new(span.1, at),
    }
}

/// Golden (MACD at or above signal) vs dead cross. Unclassified when either
/// line is missing.
pub fn classify_macd(point: &MacdPoint) -> Option<Trend> {
    let macd = defined(point.macd)?;
    let signal = defined(point.signal)?;
    Some(Trend::classify(signal, macd))
}

/// Splits the MACD series into runs of equal classification and shades each
/// run between the MACD line and the zero baseline. A row that is unclassified
/// or off-axis ends the current run; runs of a single point have no area and
/// are dropped.
pub fn trend_regions<X: BandMapping, Y: ValueMapping>(rows: &[MacdPoint], x: &X, y: &Y) -> Vec<Region> {
    let base_y = y.map(0.0);
    let mut regions = Vec::new();
    let mut run: Option<(Trend, Vec<Point>)> = None;

    let close = |run: Option<(Trend, Vec<Point>)>, regions: &mut Vec<Region>| {
        if let Some((trend, line)) = run {
            if line.len() >= 2 {
                let mut polygon = line.clone();
                polygon.extend(line.iter().rev().map(|p| Point::new(p.x, base_y)));
                regions.push(Region { trend, polygon });
            }
        }
    };

    for row in rows {
        let classified = classify_macd(row).zip(x.center(row.date)).zip(defined(row.macd));
        match classified {
            Some(((trend, cx), macd)) => {
                let point = Point::new(cx, y.map(macd));
                if let Some((current, line)) = run.as_mut() {
                    if *current == trend {
                        line.push(point);
                        continue;
                    }
                }
                close(run.take(), &mut regions);
                run = Some((trend, vec![point]));
            }
            None => close(run.take(), &mut regions),
        }
    }
    close(run.take(), &mut regions);

    regions
}
