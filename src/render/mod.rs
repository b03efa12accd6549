//! Pixel-space rendering of a chart view.
//!
//! `scale` maps dates and values to pixels, `geometry` turns series into
//! drawing primitives, `panels` composes them into the dashboard and `svg`
//! binds the result to an SVG document.

pub mod scale;
pub mod geometry;
pub mod panels;
pub mod svg;

pub use panels::{render_dashboard, Dashboard, Layout, Panel, PanelKind};
pub use svg::render_svg;
