//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - line traces: `*` segments, broken at non-finite values
//! - surface traces: a shaded heatmap, darkest = smallest value

use nalgebra::DMatrix;

use crate::domain::{Row, Trace};

/// Shades from low to high; blank is reserved for gaps.
const SHADES: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Render one figure row as a header line plus a `height` x `width` grid.
pub fn render_ascii_row(row: &Row, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let label = format!("{}({})", row.variable, row.axes.join(", "));

    match &row.trace {
        Trace::Line { x, y } => render_line(&label, x, y, width, height),
        Trace::Surface { x, y, z } => render_surface(&label, x, y, z, width, height),
    }
}

fn render_line(label: &str, xs: &[f64], ys: &[f64], width: usize, height: usize) -> String {
    let (x_min, x_max) = finite_range(xs.iter().copied()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = finite_range(ys.iter().copied()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let mut prev = None;
    for (&x, &y) in xs.iter().zip(ys) {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let line = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, l0)) => draw_line(&mut grid, c0, l0, col, line, '*'),
            None => grid[line][col] = '*',
        }
        prev = Some((col, line));
    }

    let mut out = format!("{label}: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n");
    push_grid(&mut out, grid);
    out
}

fn render_surface(
    label: &str,
    xs: &[f64],
    ys: &[f64],
    z: &DMatrix<f64>,
    width: usize,
    height: usize,
) -> String {
    let (x_min, x_max) = finite_range(xs.iter().copied()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = finite_range(ys.iter().copied()).unwrap_or((0.0, 1.0));
    let (z_min, z_max) = finite_range(z.iter().copied()).unwrap_or((0.0, 1.0));

    let mut grid = vec![vec![' '; width]; height];
    if !(xs.is_empty() || ys.is_empty()) {
        for (line, cells) in grid.iter_mut().enumerate() {
            // Top line shows the largest y.
            let j = nearest(ys.len(), height - 1 - line, height);
            for (col, cell) in cells.iter_mut().enumerate() {
                let i = nearest(xs.len(), col, width);
                let v = z[(i, j)];
                if v.is_finite() {
                    *cell = shade(v, z_min, z_max);
                }
            }
        }
    }

    let mut out = format!(
        "{label}: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}] | z=[{z_min:.3}, {z_max:.3}]\n"
    );
    push_grid(&mut out, grid);
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

/// Sample index closest to cell `cell` of `cells`.
fn nearest(len: usize, cell: usize, cells: usize) -> usize {
    if len <= 1 || cells <= 1 {
        return 0;
    }
    let u = cell as f64 / (cells as f64 - 1.0);
    ((u * (len as f64 - 1.0)).round() as usize).min(len - 1)
}

fn shade(v: f64, min: f64, max: f64) -> char {
    let u = if max > min { ((v - min) / (max - min)).clamp(0.0, 1.0) } else { 0.5 };
    let k = (u * (SHADES.len() as f64 - 1.0)).round() as usize;
    SHADES[k.min(SHADES.len() - 1)]
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        Some((min - 0.5, max + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
