use chrono::NaiveDate;
use serde::Serialize;

use super::geometry::{
    self, Bar, Candle, LineSegment, Point, Polyline, Rect, Region, Trend,
};
use super::scale::{BandMapping, BandScale, LinearScale, ValueMapping};
use crate::models::{DisplayOptions, OverlaySeries, PeriodFilter, Symbol};
use crate::services::view_cache::ChartView;
use crate::utils::format;

mod palette {
    pub const BULLISH: &str = "#10b981";
    pub const BEARISH: &str = "#ef4444";
    pub const GRID: &str = "#374151";
    pub const NEUTRAL: &str = "#6b7280";
    pub const SMA5: &str = "#3b82f6";
    pub const SMA25: &str = "#f59e0b";
    pub const SMA50: &str = "#10b981";
    pub const SMA75: &str = "#8b5cf6";
    pub const BOLLINGER: &str = "#facc15";
    pub const VOLUME: &str = "#6366f1";
    pub const RSI: &str = "#6366f1";
    pub const MACD: &str = "#3b82f6";
    pub const SIGNAL: &str = "#f59e0b";
    pub const HISTOGRAM: &str = "#6366f1";
}

const DASHED: &str = "3 3";
const DOTTED: &str = "1 1";
const RSI_TICKS: [f64; 5] = [0.0, 30.0, 50.0, 70.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Pixel sizes of the dashboard panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    pub width: f64,
    pub price_height: f64,
    pub volume_height: f64,
    pub oscillator_height: f64,
    pub margin: Margin,
    /// Empty space between the plot edge and the first/last band.
    pub x_padding: f64,
    /// Fraction of each band step left between bands.
    pub band_padding: f64,
    pub x_tick_count: usize,
    pub y_tick_count: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 1200.0,
            price_height: 350.0,
            volume_height: 150.0,
            oscillator_height: 280.0,
            margin: Margin {
                top: 10.0,
                right: 30.0,
                bottom: 20.0,
                left: 60.0,
            },
            x_padding: 10.0,
            band_padding: 0.1,
            x_tick_count: 6,
            y_tick_count: 5,
        }
    }
}

impl Layout {
    /// Splits `chart_height` 70/30 between the price and volume panels.
    pub fn sized(width: f64, chart_height: f64) -> Self {
        Self {
            width,
            price_height: (chart_height * 0.7).round(),
            volume_height: (chart_height * 0.3).round(),
            ..Self::default()
        }
    }

    fn plot_area(&self, height: f64) -> Rect {
        Rect {
            x: self.margin.left,
            y: self.margin.top,
            width: (self.width - self.margin.left - self.margin.right).max(0.0),
            height: (height - self.margin.top - self.margin.bottom).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
    pub dash: Option<&'static str>,
}

impl Stroke {
    fn solid(color: &'static str, width: f64) -> Self {
        Self { color, width, dash: None }
    }

    fn dashed(color: &'static str, width: f64, dash: &'static str) -> Self {
        Self { color, width, dash: Some(dash) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fill {
    pub color: &'static str,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Line { segment: LineSegment, stroke: Stroke },
    Polyline { points: Vec<Point>, stroke: Stroke },
    Rect { rect: Rect, fill: Fill, corner_radius: f64 },
    Polygon { points: Vec<Point>, fill: Fill },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Price,
    Volume,
    Rsi,
    Macd,
}

/// One chart panel in its own coordinate space, origin at its top-left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub plot: Rect,
    pub layers: Vec<Layer>,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
    pub legend: Vec<LegendEntry>,
}

impl Panel {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// Panels stacked top to bottom: price, volume, then RSI and MACD when enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub symbol: Symbol,
    pub period: PeriodFilter,
    pub last_update: Option<NaiveDate>,
    pub width: f64,
    pub height: f64,
    pub panels: Vec<Panel>,
}

impl Dashboard {
    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

fn overlay_stroke(series: OverlaySeries) -> Stroke {
    match series {
        OverlaySeries::Sma5 => Stroke::solid(palette::SMA5, 1.5),
        OverlaySeries::Sma25 => Stroke::solid(palette::SMA25, 1.5),
        OverlaySeries::Sma50 => Stroke::solid(palette::SMA50, 1.5),
        OverlaySeries::Sma75 => Stroke::solid(palette::SMA75, 1.5),
        OverlaySeries::BollingerUpper | OverlaySeries::BollingerLower => {
            Stroke::dashed(palette::BOLLINGER, 1.0, DASHED)
        }
        OverlaySeries::BollingerMiddle => Stroke::solid(palette::BOLLINGER, 1.0),
    }
}

fn trend_color(trend: Trend) -> &'static str {
    match trend {
        Trend::Bullish => palette::BULLISH,
        Trend::Bearish => palette::BEARISH,
    }
}

fn band_scale(dates: impl IntoIterator<Item = NaiveDate>, plot: &Rect, layout: &Layout) -> BandScale {
    let range = (plot.x + layout.x_padding, plot.x + plot.width - layout.x_padding);
    BandScale::new(dates, range, layout.band_padding)
}

fn value_range(plot: &Rect) -> (f64, f64) {
    (plot.y + plot.height, plot.y)
}

fn date_ticks(dates: &[NaiveDate], x: &BandScale, count: usize) -> Vec<AxisTick> {
    if dates.is_empty() || count == 0 {
        return Vec::new();
    }
    let last = dates.len() - 1;
    let count = count.min(dates.len());
    let mut indices: Vec<usize> = if count == 1 {
        vec![0]
    } else {
        (0..count).map(|i| i * last / (count - 1)).collect()
    };
    indices.dedup();

    indices
        .into_iter()
        .filter_map(|i| {
            let date = dates[i];
            x.center(date).map(|position| AxisTick {
                position,
                label: format::format_axis_date(date),
            })
        })
        .collect()
}

fn value_ticks(values: &[f64], y: &LinearScale, label: fn(f64) -> String) -> Vec<AxisTick> {
    values
        .iter()
        .map(|&v| AxisTick {
            position: y.map(v),
            label: label(v),
        })
        .collect()
}

fn grid_layer(plot: &Rect, y_ticks: &[AxisTick]) -> Layer {
    let stroke = Stroke::dashed(palette::GRID, 1.0, DASHED);
    let primitives = y_ticks
        .iter()
        .map(|tick| Primitive::Line {
            segment: LineSegment {
                from: Point::new(plot.x, tick.position),
                to: Point::new(plot.x + plot.width, tick.position),
            },
            stroke,
        })
        .collect();
    Layer {
        name: "grid".to_string(),
        primitives,
    }
}

fn rule(plot: &Rect, value: f64, y: &LinearScale, stroke: Stroke) -> Primitive {
    Primitive::Line {
        segment: geometry::horizontal_rule(value, (plot.x, plot.x + plot.width), y),
        stroke,
    }
}

fn polyline(line: Polyline, stroke: Stroke) -> Option<Primitive> {
    (line.len() >= 2).then(|| Primitive::Polyline {
        points: line.points,
        stroke,
    })
}

fn candle_primitives(candles: Vec<Candle>) -> Vec<Primitive> {
    candles
        .into_iter()
        .flat_map(|candle| {
            let color = trend_color(candle.trend);
            [
                Primitive::Line {
                    segment: candle.wick,
                    stroke: Stroke::solid(color, 1.0),
                },
                Primitive::Rect {
                    rect: candle.body,
                    fill: Fill { color, opacity: 1.0 },
                    corner_radius: 1.0,
                },
            ]
        })
        .collect()
}

fn bar_primitives(bars: Vec<Bar>, fill: Fill) -> Vec<Primitive> {
    bars.into_iter()
        .map(|bar| Primitive::Rect {
            rect: bar.rect,
            fill,
            corner_radius: 0.0,
        })
        .collect()
}

fn region_primitives(regions: Vec<Region>) -> Vec<Primitive> {
    regions
        .into_iter()
        .map(|region| Primitive::Polygon {
            points: region.polygon,
            fill: Fill {
                color: trend_color(region.trend),
                opacity: 0.2,
            },
        })
        .collect()
}

fn price_panel(view: &ChartView, options: &DisplayOptions, layout: &Layout) -> Panel {
    let points = &view.combined;
    let plot = layout.plot_area(layout.price_height);
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let x = band_scale(dates.iter().copied(), &plot, layout);

    let overlays = options.enabled_overlays();
    let extent = points.iter().flat_map(|p| {
        let overlay_values = overlays.iter().filter_map(move |s| s.value(p));
        [p.low, p.high].into_iter().chain(overlay_values)
    });
    let y = LinearScale::auto(extent, value_range(&plot), 0.02);

    let y_ticks = value_ticks(&y.ticks(layout.y_tick_count), &y, format::format_price);
    let mut layers = vec![grid_layer(&plot, &y_ticks)];
    layers.push(Layer {
        name: "candles".to_string(),
        primitives: candle_primitives(geometry::candlesticks(points, &x, &y)),
    });

    let mut legend = Vec::new();
    for series in overlays {
        let stroke = overlay_stroke(series);
        if let Some(line) = polyline(geometry::overlay_path(points, series, &x, &y), stroke) {
            layers.push(Layer {
                name: series.label().to_string(),
                primitives: vec![line],
            });
            legend.push(LegendEntry {
                label: series.label().to_string(),
                color: stroke.color,
            });
        }
    }

    Panel {
        kind: PanelKind::Price,
        title: format!("{} Price", view.data.symbol),
        width: layout.width,
        height: layout.price_height,
        plot,
        layers,
        x_ticks: date_ticks(&dates, &x, layout.x_tick_count),
        y_ticks,
        legend,
    }
}

fn volume_panel(view: &ChartView, layout: &Layout) -> Panel {
    let points = &view.combined;
    let plot = layout.plot_area(layout.volume_height);
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let x = band_scale(dates.iter().copied(), &plot, layout);

    let max_volume = points.iter().map(|p| p.volume as f64).fold(0.0, f64::max);
    let y = LinearScale::new((0.0, (max_volume * 1.05).max(1.0)), value_range(&plot));

    let y_ticks = value_ticks(&y.ticks(layout.y_tick_count), &y, format::format_volume);
    let fill = Fill {
        color: palette::VOLUME,
        opacity: 0.7,
    };
    let layers = vec![
        grid_layer(&plot, &y_ticks),
        Layer {
            name: "volume".to_string(),
            primitives: bar_primitives(geometry::volume_bars(points, &x, &y), fill),
        },
    ];

    Panel {
        kind: PanelKind::Volume,
        title: "Volume".to_string(),
        width: layout.width,
        height: layout.volume_height,
        plot,
        layers,
        x_ticks: date_ticks(&dates, &x, layout.x_tick_count),
        y_ticks,
        legend: vec![LegendEntry {
            label: "Volume".to_string(),
            color: palette::VOLUME,
        }],
    }
}

fn rsi_panel(view: &ChartView, layout: &Layout) -> Panel {
    let rows = &view.data.rsi;
    let plot = layout.plot_area(layout.oscillator_height);
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let x = band_scale(dates.iter().copied(), &plot, layout);
    let y = LinearScale::new((0.0, 100.0), value_range(&plot));

    let y_ticks = value_ticks(&RSI_TICKS, &y, format::format_rsi);
    let references = vec![
        rule(&plot, 70.0, &y, Stroke::dashed(palette::BULLISH, 1.0, DASHED)),
        rule(&plot, 50.0, &y, Stroke::dashed(palette::NEUTRAL, 1.0, DOTTED)),
        rule(&plot, 30.0, &y, Stroke::dashed(palette::BEARISH, 1.0, DASHED)),
    ];

    let mut layers = vec![
        grid_layer(&plot, &y_ticks),
        Layer {
            name: "references".to_string(),
            primitives: references,
        },
    ];
    let line = geometry::value_line(rows, |r| r.rsi, &x, &y);
    if let Some(line) = polyline(line, Stroke::solid(palette::RSI, 2.0)) {
        layers.push(Layer {
            name: "RSI".to_string(),
            primitives: vec![line],
        });
    }

    Panel {
        kind: PanelKind::Rsi,
        title: "RSI (14)".to_string(),
        width: layout.width,
        height: layout.oscillator_height,
        plot,
        layers,
        x_ticks: date_ticks(&dates, &x, layout.x_tick_count),
        y_ticks,
        legend: vec![LegendEntry {
            label: "RSI".to_string(),
            color: palette::RSI,
        }],
    }
}

fn macd_panel(view: &ChartView, layout: &Layout) -> Panel {
    let rows = &view.data.macd;
    let plot = layout.plot_area(layout.oscillator_height);
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let x = band_scale(dates.iter().copied(), &plot, layout);

    let extent = rows
        .iter()
        .flat_map(|r| [r.macd, r.signal, r.histogram])
        .flatten()
        .chain(std::iter::once(0.0));
    let y = LinearScale::auto(extent, value_range(&plot), 0.1);

    let y_ticks = value_ticks(&y.ticks(layout.y_tick_count), &y, format::format_macd);
    let mut layers = vec![
        grid_layer(&plot, &y_ticks),
        Layer {
            name: "crosses".to_string(),
            primitives: region_primitives(geometry::trend_regions(rows, &x, &y)),
        },
        Layer {
            name: "zero".to_string(),
            primitives: vec![rule(&plot, 0.0, &y, Stroke::dashed(palette::NEUTRAL, 1.0, DOTTED))],
        },
        Layer {
            name: "histogram".to_string(),
            primitives: bar_primitives(
                geometry::histogram_bars(rows, &x, &y),
                Fill {
                    color: palette::HISTOGRAM,
                    opacity: 0.7,
                },
            ),
        },
    ];

    let lines = [
        ("MACD", geometry::value_line(rows, |r| r.macd, &x, &y), palette::MACD),
        ("Signal", geometry::value_line(rows, |r| r.signal, &x, &y), palette::SIGNAL),
    ];
    for (name, line, color) in lines {
        if let Some(line) = polyline(line, Stroke::solid(color, 2.0)) {
            layers.push(Layer {
                name: name.to_string(),
                primitives: vec![line],
            });
        }
    }

    Panel {
        kind: PanelKind::Macd,
        title: "MACD (12, 26, 9)".to_string(),
        width: layout.width,
        height: layout.oscillator_height,
        plot,
        layers,
        x_ticks: date_ticks(&dates, &x, layout.x_tick_count),
        y_ticks,
        legend: vec![
            LegendEntry { label: "MACD".to_string(), color: palette::MACD },
            LegendEntry { label: "Signal".to_string(), color: palette::SIGNAL },
            LegendEntry { label: "Golden cross".to_string(), color: palette::BULLISH },
            LegendEntry { label: "Dead cross".to_string(), color: palette::BEARISH },
        ],
    }
}

/// Lays out every visible panel for `view`. Never fails; missing data just
/// leaves layers empty.
pub fn render_dashboard(view: &ChartView, options: &DisplayOptions, layout: &Layout) -> Dashboard {
    let mut panels = vec![price_panel(view, options, layout), volume_panel(view, layout)];
    if options.rsi {
        panels.push(rsi_panel(view, layout));
    }
    if options.macd {
        panels.push(macd_panel(view, layout));
    }

    Dashboard {
        symbol: view.data.symbol.clone(),
        period: view.period,
        last_update: view.data.last_update(),
        width: layout.width,
        height: panels.iter().map(|p| p.height).sum(),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BollingerBand, MacdPoint, MarketData, MovingAverageSet, PricePoint, RsiPoint};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn view() -> ChartView {
        let mut data = MarketData::empty(Symbol::new("9501.T"));
        data.price = (6..11)
            .map(|d| PricePoint::new(day(d), 100.0, 110.0, 95.0, 100.0 + d as f64, 1_000_000 + d as u64))
            .collect();
        data.sma = (8..11)
            .map(|d| MovingAverageSet { date: day(d), sma5: Some(102.0), ..Default::default() })
            .collect();
        data.bollinger = vec![BollingerBand { date: day(10), upper: Some(120.0), middle: Some(105.0), lower: Some(90.0) }];
        data.rsi = (6..11).map(|d| RsiPoint { date: day(d), rsi: Some(40.0 + d as f64) }).collect();
        data.macd = (6..11)
            .map(|d| MacdPoint {
                date: day(d),
                macd: Some(d as f64 - 8.0),
                signal: Some(0.0),
                histogram: Some(d as f64 - 8.0),
            })
            .collect();
        ChartView::build(&data, PeriodFilter::Custom, None)
    }

    #[test]
    fn test_default_options_show_price_and_volume_only() {
        let dashboard = render_dashboard(&view(), &DisplayOptions::default(), &Layout::default());

        let kinds: Vec<PanelKind> = dashboard.panels.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PanelKind::Price, PanelKind::Volume]);
        assert_eq!(dashboard.height, 500.0);
        assert_eq!(dashboard.last_update, Some(day(10)));
    }

    #[test]
    fn test_oscillator_toggles_add_panels() {
        let options = DisplayOptions { rsi: true, macd: true, ..DisplayOptions::default() };
        let dashboard = render_dashboard(&view(), &options, &Layout::default());

        assert_eq!(dashboard.panels.len(), 4);
        let rsi = dashboard.panel(PanelKind::Rsi).unwrap();
        assert_eq!(rsi.layer("references").unwrap().primitives.len(), 3);
        assert_eq!(rsi.y_ticks.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(), ["0.0", "30.0", "50.0", "70.0", "100.0"]);

        let macd = dashboard.panel(PanelKind::Macd).unwrap();
        assert!(macd.layer("MACD").is_some());
        assert!(macd.layer("Signal").is_some());
        assert_eq!(macd.layer("histogram").unwrap().primitives.len(), 5);
    }

    #[test]
    fn test_candles_drawn_for_every_price_row() {
        let dashboard = render_dashboard(&view(), &DisplayOptions::default(), &Layout::default());
        let price = dashboard.panel(PanelKind::Price).unwrap();

        // wick and body per candle
        assert_eq!(price.layer("candles").unwrap().primitives.len(), 10);
        assert!(price.y_ticks.iter().all(|t| t.label.starts_with('¥')));
        assert_eq!(price.x_ticks.first().map(|t| t.label.as_str()), Some("1/6"));
    }

    #[test]
    fn test_enabled_overlay_without_data_draws_nothing() {
        let options = DisplayOptions { sma75: true, ..DisplayOptions::default() };
        let dashboard = render_dashboard(&view(), &options, &Layout::default());
        let price = dashboard.panel(PanelKind::Price).unwrap();

        assert!(price.layer("SMA5").is_some());
        assert!(price.layer("SMA25").is_none());
        assert!(price.layer("SMA75").is_none());
        assert_eq!(price.legend.len(), 1);
    }

    #[test]
    fn test_single_bollinger_row_renders_no_band_lines() {
        let options = DisplayOptions { bollinger: true, ..DisplayOptions::default() };
        let dashboard = render_dashboard(&view(), &options, &Layout::default());
        let price = dashboard.panel(PanelKind::Price).unwrap();

        assert!(price.layer("BB upper").is_none());
    }

    #[test]
    fn test_macd_regions_are_shaded_by_trend() {
        let options = DisplayOptions { macd: true, ..DisplayOptions::default() };
        let dashboard = render_dashboard(&view(), &options, &Layout::default());
        let crosses = dashboard.panel(PanelKind::Macd).unwrap().layer("crosses").unwrap();

        // macd - signal runs -2, -1 (dead) then 0, 1, 2 (golden)
        let colors: Vec<&str> = crosses
            .primitives
            .iter()
            .map(|p| match p {
                Primitive::Polygon { fill, .. } => fill.color,
                other => panic!("unexpected primitive {:?}", other),
            })
            .collect();
        assert_eq!(colors, vec![palette::BEARISH, palette::BULLISH]);
    }

    #[test]
    fn test_empty_view_renders_empty_layers() {
        let data = MarketData::empty(Symbol::new("9501.T"));
        let empty = ChartView::build(&data, PeriodFilter::OneMonth, None);
        let options = DisplayOptions { rsi: true, macd: true, bollinger: true, ..DisplayOptions::default() };

        let dashboard = render_dashboard(&empty, &options, &Layout::default());
        let price = dashboard.panel(PanelKind::Price).unwrap();
        assert!(price.layer("candles").unwrap().primitives.is_empty());
        assert!(price.x_ticks.is_empty());
        assert_eq!(dashboard.last_update, None);
    }

    #[test]
    fn test_sized_layout_splits_height() {
        let layout = Layout::sized(800.0, 600.0);
        assert_eq!(layout.price_height, 420.0);
        assert_eq!(layout.volume_height, 180.0);
    }
}
