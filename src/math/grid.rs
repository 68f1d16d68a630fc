//! Sample generation and dense-grid indexing.
//!
//! Grids are always row-major with `ij` indexing: for parameters `(p0, p1, ..)`
//! the last parameter varies fastest in the flat value vector.

/// Generate `count` evenly spaced points between `min` and `max` (inclusive).
///
/// Points are blended as `min * (1 - t) + max * t`, which keeps both endpoints
/// exact and never forms `max - min`, so the full `f64` range stays finite.
pub fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let last = (count - 1) as f64;
            let mut out = Vec::with_capacity(count);
            for i in 0..count - 1 {
                let t = i as f64 / last;
                out.push(min * (1.0 - t) + max * t);
            }
            out.push(max);
            out
        }
    }
}

/// Largest number of points a single figure row may evaluate.
pub const MAX_GRID_POINTS: usize = 4_000_000;

/// Total number of points in a grid of the given shape.
pub fn grid_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Like `grid_len`, but `None` on overflow.
pub fn checked_grid_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

/// Convert a flat row-major index into per-axis indices.
pub fn unravel_index(flat: usize, shape: &[usize], out: &mut [usize]) {
    let mut rem = flat;
    for k in (0..shape.len()).rev() {
        let n = shape[k].max(1);
        out[k] = rem % n;
        rem /= n;
    }
}

/// Every `stride`-th value, used for slider tick marks.
pub fn every_nth(values: &[f64], stride: usize) -> Vec<f64> {
    values.iter().step_by(stride.max(1)).copied().collect()
}
