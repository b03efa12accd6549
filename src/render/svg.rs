use std::fmt::Write;

use super::geometry::{LineSegment, Point, Rect};
use super::panels::{Dashboard, Fill, Panel, Primitive, Stroke};

const BACKGROUND: &str = "#1f2937";
const AXIS_TEXT: &str = "#9ca3af";
const TITLE_TEXT: &str = "#f3f4f6";
const AXIS_FONT_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Anything that can draw dashboard primitives.
pub trait RenderSurface {
    fn begin_frame(&mut self, width: f64, height: f64, clear_color: &str);
    /// Following calls are offset by (`dx`, `dy`) until the matching `pop_offset`.
    fn push_offset(&mut self, dx: f64, dy: f64);
    fn pop_offset(&mut self);
    fn draw_line(&mut self, segment: &LineSegment, stroke: &Stroke);
    fn draw_polyline(&mut self, points: &[Point], stroke: &Stroke);
    fn fill_rect(&mut self, rect: &Rect, fill: &Fill, corner_radius: f64);
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill);
    fn draw_text(&mut self, at: Point, text: &str, anchor: TextAnchor, color: &str, size: f64);
}

/// Builds an SVG 1.1 document in memory.
#[derive(Debug, Default)]
pub struct SvgSurface {
    out: String,
    depth: usize,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(mut self) -> String {
        for _ in 0..self.depth {
            self.out.push_str("</g>");
        }
        self.out.push_str("</svg>\n");
        self.out
    }
}

fn num(value: f64) -> String {
    let text = format!("{:.2}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut attrs = format!(r#"stroke="{}" stroke-width="{}""#, stroke.color, num(stroke.width));
    if let Some(dash) = stroke.dash {
        let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash);
    }
    attrs
}

fn fill_attrs(fill: &Fill) -> String {
    if fill.opacity < 1.0 {
        format!(r#"fill="{}" fill-opacity="{}""#, fill.color, num(fill.opacity))
    } else {
        format!(r#"fill="{}""#, fill.color)
    }
}

impl RenderSurface for SvgSurface {
    fn begin_frame(&mut self, width: f64, height: f64, clear_color: &str) {
        self.out.clear();
        self.depth = 0;
        let _ = write!(
            self.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(width),
            h = num(height)
        );
        let _ = write!(self.out, r#"<rect width="100%" height="100%" fill="{}"/>"#, clear_color);
    }

    fn push_offset(&mut self, dx: f64, dy: f64) {
        let _ = write!(self.out, r#"<g transform="translate({},{})">"#, num(dx), num(dy));
        self.depth += 1;
    }

    fn pop_offset(&mut self) {
        if self.depth > 0 {
            self.out.push_str("</g>");
            self.depth -= 1;
        }
    }

    fn draw_line(&mut self, segment: &LineSegment, stroke: &Stroke) {
        let _ = write!(
            self.out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
            num(segment.from.x),
            num(segment.from.y),
            num(segment.to.x),
            num(segment.to.y),
            stroke_attrs(stroke)
        );
    }

    fn draw_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        let _ = write!(
            self.out,
            r#"<polyline points="{}" fill="none" {}/>"#,
            points_attr(points),
            stroke_attrs(stroke)
        );
    }

    fn fill_rect(&mut self, rect: &Rect, fill: &Fill, corner_radius: f64) {
        let _ = write!(
            self.out,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height)
        );
        if corner_radius > 0.0 {
            let _ = write!(self.out, r#" rx="{}""#, num(corner_radius));
        }
        let _ = write!(self.out, " {}/>", fill_attrs(fill));
    }

    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) {
        if points.len() < 3 {
            return;
        }
        let _ = write!(
            self.out,
            r#"<polygon points="{}" stroke="none" {}/>"#,
            points_attr(points),
            fill_attrs(fill)
        );
    }

    fn draw_text(&mut self, at: Point, text: &str, anchor: TextAnchor, color: &str, size: f64) {
        let _ = write!(
            self.out,
            r#"<text x="{}" y="{}" text-anchor="{}" fill="{}" font-size="{}" font-family="sans-serif">{}</text>"#,
            num(at.x),
            num(at.y),
            anchor.as_str(),
            color,
            num(size),
            escape(text)
        );
    }
}

fn draw_panel<S: RenderSurface>(panel: &Panel, surface: &mut S) {
    let plot = &panel.plot;

    for layer in &panel.layers {
        for primitive in &layer.primitives {
            match primitive {
                Primitive::Line { segment, stroke } => surface.draw_line(segment, stroke),
                Primitive::Polyline { points, stroke } => surface.draw_polyline(points, stroke),
                Primitive::Rect { rect, fill, corner_radius } => surface.fill_rect(rect, fill, *corner_radius),
                Primitive::Polygon { points, fill } => surface.fill_polygon(points, fill),
            }
        }
    }

    let baseline = plot.y + plot.height;
    for tick in &panel.x_ticks {
        let at = Point::new(tick.position, baseline + AXIS_FONT_SIZE + 2.0);
        surface.draw_text(at, &tick.label, TextAnchor::Middle, AXIS_TEXT, AXIS_FONT_SIZE);
    }
    for tick in &panel.y_ticks {
        let at = Point::new(plot.x - 6.0, tick.position + AXIS_FONT_SIZE / 3.0);
        surface.draw_text(at, &tick.label, TextAnchor::End, AXIS_TEXT, AXIS_FONT_SIZE);
    }

    surface.draw_text(
        Point::new(plot.x, plot.y + AXIS_FONT_SIZE),
        &panel.title,
        TextAnchor::Start,
        TITLE_TEXT,
        AXIS_FONT_SIZE,
    );

    let mut legend_x = plot.x + plot.width;
    for entry in panel.legend.iter().rev() {
        surface.draw_text(
            Point::new(legend_x, plot.y + AXIS_FONT_SIZE),
            &entry.label,
            TextAnchor::End,
            entry.color,
            AXIS_FONT_SIZE,
        );
        legend_x -= AXIS_FONT_SIZE * 0.6 * entry.label.chars().count() as f64 + AXIS_FONT_SIZE;
    }
}

/// Draws every panel of `dashboard`, stacked vertically, onto `surface`.
pub fn draw_dashboard<S: RenderSurface>(dashboard: &Dashboard, surface: &mut S) {
    surface.begin_frame(dashboard.width, dashboard.height, BACKGROUND);

    let mut top = 0.0;
    for panel in &dashboard.panels {
        surface.push_offset(0.0, top);
        draw_panel(panel, surface);
        surface.pop_offset();
        top += panel.height;
    }

    if let Some(last_update) = dashboard.last_update {
        let label = format!("{} · {} · updated {}", dashboard.symbol, dashboard.period, last_update);
        surface.draw_text(
            Point::new(dashboard.width - 4.0, dashboard.height - 4.0),
            &label,
            TextAnchor::End,
            AXIS_TEXT,
            AXIS_FONT_SIZE - 2.0,
        );
    }
}

pub fn render_svg(dashboard: &Dashboard) -> String {
    let mut surface = SvgSurface::new();
    draw_dashboard(dashboard, &mut surface);
    surface.finish()
}
