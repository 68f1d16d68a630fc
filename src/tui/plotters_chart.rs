//! Plotters-powered figure-row chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! All series and bounds are prepared by `ChartData::from_row`; the widget
//! itself only draws.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::{Row, Trace};

/// Render-ready series of one figure row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// Line pieces, split wherever the trace has a non-finite value.
    pub segments: Vec<Vec<(f64, f64)>>,
    /// Surface samples as `(x, y, u)` with `u` the value scaled to `0..=1`.
    pub cells: Vec<(f64, f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: String,
    pub y_label: String,
}

impl ChartData {
    pub fn from_row(row: &Row) -> Self {
        let axis = |k: usize| row.axes.get(k).cloned().unwrap_or_default();
        match &row.trace {
            Trace::Line { x, y } => {
                let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
                let mut current = Vec::new();
                for (&px, &py) in x.iter().zip(y) {
                    if px.is_finite() && py.is_finite() {
                        current.push((px, py));
                    } else if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                if !current.is_empty() {
                    segments.push(current);
                }

                let x_bounds = bounds(segments.iter().flatten().map(|p| p.0), 0.0);
                let y_bounds = bounds(segments.iter().flatten().map(|p| p.1), 0.05);
                Self {
                    segments,
                    cells: Vec::new(),
                    x_bounds,
                    y_bounds,
                    x_label: axis(0),
                    y_label: row.variable.clone(),
                }
            }
            Trace::Surface { x, y, z } => {
                let [z_min, z_max] = bounds(z.iter().copied(), 0.0);
                let mut cells = Vec::with_capacity(z.len());
                for (i, &px) in x.iter().enumerate() {
                    for (j, &py) in y.iter().enumerate() {
                        let v = z[(i, j)];
                        if v.is_finite() && px.is_finite() && py.is_finite() {
                            cells.push((px, py, ((v - z_min) / (z_max - z_min)).clamp(0.0, 1.0)));
                        }
                    }
                }
                Self {
                    segments: Vec::new(),
                    cells,
                    x_bounds: bounds(x.iter().copied(), 0.0),
                    y_bounds: bounds(y.iter().copied(), 0.0),
                    x_label: axis(0),
                    y_label: axis(1),
                }
            }
        }
    }

    pub fn widget(&self) -> RowChart<'_> {
        RowChart { data: self }
    }
}

/// Finite bounds of `values` padded by `frac` of the span; never degenerate.
fn bounds(values: impl Iterator<Item = f64>, frac: f64) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 0.5, hi + 0.5];
    }
    let pad = (hi - lo) * frac;
    [lo - pad, hi + pad]
}

/// Blue (low) to red (high).
fn heat(u: f64) -> RGBColor {
    let r = (255.0 * u).round() as u8;
    let b = (255.0 * (1.0 - u)).round() as u8;
    RGBColor(r, 64, b)
}

pub struct RowChart<'a> {
    data: &'a ChartData,
}

impl<'a> Widget for RowChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let data = self.data;
        let [x0, x1] = data.x_bounds;
        let [y0, y1] = data.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(data.x_label.as_str())
                .y_desc(data.y_label.as_str())
                .x_labels(5)
                .y_labels(4)
                .x_label_formatter(&|v| format!("{v:.2}"))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255);
            for segment in &data.segments {
                if segment.len() == 1 {
                    chart.draw_series(segment.iter().map(|&p| Pixel::new(p, line_color)))?;
                } else {
                    chart.draw_series(LineSeries::new(segment.iter().copied(), &line_color))?;
                }
            }

            // Pixels rather than rectangles: the backend maps filled shapes coarsely.
            chart.draw_series(
                data.cells
                    .iter()
                    .map(|&(x, y, u)| Pixel::new((x, y), heat(u))),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
