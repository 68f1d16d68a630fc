//! Subplot composition.
//!
//! Every requested variable is evaluated over the cross product of its
//! parameter samples and becomes one row of the figure. Rows are independent,
//! so they may be evaluated on the rayon pool; results are always assembled in
//! request order.

use std::panic::{catch_unwind, AssertUnwindSafe};

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{Figure, Model, ParamGrid, Row, Trace};
use crate::error::EngineError;
use crate::figure::ResolvedVariable;
use crate::math::{checked_grid_len, MAX_GRID_POINTS};

/// A composed figure plus the rows that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    pub figure: Figure,
    pub failures: Vec<EngineError>,
}

/// Evaluate `requests` in order and stack the successful rows.
///
/// A failing row is left out of the figure and reported in `failures`; the
/// remaining rows are still composed.
pub fn compose(model: &Model, requests: &[ResolvedVariable], parallel: bool) -> Composition {
    let results: Vec<Result<Row, EngineError>> = if parallel {
        requests.par_iter().map(|r| evaluate_row(model, r)).collect()
    } else {
        requests.iter().map(|r| evaluate_row(model, r)).collect()
    };

    let mut out = Composition::default();
    for result in results {
        match result {
            Ok(row) => out.figure.rows.push(row),
            Err(err) => out.failures.push(err),
        }
    }

    debug!(
        model = model.name(),
        rows = out.figure.len(),
        failed = out.failures.len(),
        "composed figure"
    );
    out
}

/// Evaluate a single variable into a figure row.
pub fn evaluate_row(model: &Model, request: &ResolvedVariable) -> Result<Row, EngineError> {
    let grid = ParamGrid::new(
        request
            .params
            .iter()
            .map(|(name, sampling)| (name.clone(), sampling.samples()))
            .collect(),
    );

    let fail = |reason: String| {
        let err = EngineError::Evaluation {
            model: model.name().to_string(),
            variable: request.variable.clone(),
            params: grid.describe(),
            reason,
        };
        warn!(
            model = model.name(),
            variable = %request.variable,
            params = %grid.describe(),
            error = %err,
            "could not plot variable"
        );
        err
    };

    let Some(var) = model.dependent(&request.variable) else {
        return Err(fail("not a plottable variable".to_string()));
    };
    let Some(callable) = var.callable.as_ref() else {
        return Err(fail("variable has no callable".to_string()));
    };

    let shape = grid.shape();
    match shape.len() {
        1 | 2 => {}
        0 => return Err(fail("variable has no parameters to sample".to_string())),
        n => return Err(fail(format!("cannot plot {n}-dimensional output"))),
    }
    if shape.contains(&0) {
        return Err(fail("empty sample sequence".to_string()));
    }
    match checked_grid_len(&shape) {
        Some(n) if n <= MAX_GRID_POINTS => {}
        _ => {
            return Err(fail(format!(
                "grid of shape {shape:?} exceeds {MAX_GRID_POINTS} points"
            )));
        }
    }

    let values = catch_unwind(AssertUnwindSafe(|| callable.call(&grid)))
        .unwrap_or_else(|_| Err("callable panicked".to_string()))
        .map_err(&fail)?;

    if values.shape != shape || values.values.len() != grid.len() {
        return Err(fail(format!(
            "malformed output: expected shape {:?}, got {:?} with {} values",
            shape,
            values.shape,
            values.values.len()
        )));
    }

    let axes = grid.axes();
    let trace = match axes {
        [(_, x)] => Trace::Line {
            x: x.clone(),
            y: values.values,
        },
        [(_, x), (_, y)] => Trace::Surface {
            x: x.clone(),
            y: y.clone(),
            z: DMatrix::from_row_slice(x.len(), y.len(), &values.values),
        },
        _ => return Err(fail(format!("cannot plot {}-dimensional output", axes.len()))),
    };

    Ok(Row {
        variable: request.variable.clone(),
        axes: grid.names().map(str::to_string).collect(),
        trace,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Domain, Sampling, ValueGrid, VariableDescriptor};

    fn sum(grid: &ParamGrid) -> Result<ValueGrid, String> {
        let mut p = vec![0.0; grid.axes().len()];
        let values = (0..grid.len())
            .map(|k| {
                grid.point(k, &mut p);
                p.iter().sum::<f64>()
            })
            .collect();
        Ok(ValueGrid {
            shape: grid.shape(),
            values,
        })
    }

    fn boom(_: &ParamGrid) -> Result<ValueGrid, String> {
        Err("boom".to_string())
    }

    fn panicky(_: &ParamGrid) -> Result<ValueGrid, String> {
        panic!("index out of range in user code")
    }

    fn truncated(grid: &ParamGrid) -> Result<ValueGrid, String> {
        Ok(ValueGrid {
            shape: grid.shape(),
            values: vec![0.0; grid.len().saturating_sub(1)],
        })
    }

    fn model() -> Model {
        let dep = |name: &str, params: &[&str], f: Arc<dyn crate::domain::Callable>| {
            VariableDescriptor::dependent(
                name,
                params.iter().map(|p| p.to_string()).collect(),
                f,
                vec![],
                name,
            )
        };
        Model::new(
            "m",
            vec![
                VariableDescriptor::independent("x"),
                VariableDescriptor::independent("y"),
                dep("line", &["x"], Arc::new(sum)),
                dep("surf", &["x", "y"], Arc::new(sum)),
                dep("bad", &["x"], Arc::new(boom)),
                dep("short", &["x"], Arc::new(truncated)),
                dep("wild", &["x"], Arc::new(panicky)),
            ],
        )
        .unwrap()
    }

    fn request(var: &str, params: &[(&str, Sampling)]) -> ResolvedVariable {
        ResolvedVariable {
            variable: var.to_string(),
            params: params.iter().map(|(p, s)| (p.to_string(), s.clone())).collect(),
        }
    }

    fn range(min: f64, max: f64, n: usize) -> Sampling {
        Sampling::Range(Domain::new(min, max, n).unwrap())
    }

    #[test]
    fn one_parameter_makes_a_line() {
        let row = evaluate_row(&model(), &request("line", &[("x", range(0.0, 10.0, 5))])).unwrap();
        assert_eq!(row.axes, vec!["x"]);
        assert_eq!(
            row.trace,
            Trace::Line {
                x: vec![0.0, 2.5, 5.0, 7.5, 10.0],
                y: vec![0.0, 2.5, 5.0, 7.5, 10.0],
            }
        );
    }

    #[test]
    fn two_parameters_make_an_ij_surface() {
        let req = request(
            "surf",
            &[("x", Sampling::Literal(vec![0.0, 10.0])), ("y", Sampling::Literal(vec![1.0, 2.0, 3.0]))],
        );
        let row = evaluate_row(&model(), &req).unwrap();
        let Trace::Surface { x, y, z } = row.trace else {
            panic!("expected a surface");
        };
        assert_eq!(x.len(), 2);
        assert_eq!(y.len(), 3);
        assert_eq!(z.nrows(), 2);
        assert_eq!(z.ncols(), 3);
        assert_eq!(z[(1, 2)], 13.0);
        assert_eq!(z[(0, 1)], 2.0);
    }

    #[test]
    fn failing_rows_are_skipped_in_order() {
        let reqs = vec![
            request("bad", &[("x", range(0.0, 1.0, 3))]),
            request("line", &[("x", range(0.0, 1.0, 3))]),
            request("short", &[("x", range(0.0, 1.0, 3))]),
            request("surf", &[("x", range(0.0, 1.0, 3)), ("y", range(0.0, 1.0, 4))]),
        ];
        for parallel in [false, true] {
            let out = compose(&model(), &reqs, parallel);
            assert_eq!(out.figure.variables(), vec!["line", "surf"]);
            assert_eq!(out.failures.len(), 2);
            let msg = out.failures[0].to_string();
            assert!(msg.contains("m.bad") && msg.contains("boom"), "{msg}");
            assert!(out.failures[1].to_string().contains("malformed"));
        }
    }

    #[test]
    fn panicking_callable_drops_only_its_row() {
        let reqs = vec![
            request("wild", &[("x", range(0.0, 1.0, 3))]),
            request("line", &[("x", range(0.0, 1.0, 3))]),
        ];
        for parallel in [false, true] {
            let out = compose(&model(), &reqs, parallel);
            assert_eq!(out.figure.variables(), vec!["line"]);
            assert_eq!(out.failures.len(), 1);
            assert!(matches!(out.failures[0], EngineError::Evaluation { .. }));
            let msg = out.failures[0].to_string();
            assert!(msg.contains("m.wild") && msg.contains("callable panicked"), "{msg}");
        }
    }

    #[test]
    fn oversized_grids_are_refused_before_evaluation() {
        let huge = range(0.0, 1.0, Domain::MAX_COUNT);
        let err = evaluate_row(&model(), &request("surf", &[("x", huge.clone()), ("y", huge)])).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
    }

    #[test]
    fn parameterless_and_empty_samples_fail() {
        assert!(evaluate_row(&model(), &request("line", &[])).is_err());
        assert!(evaluate_row(&model(), &request("line", &[("x", Sampling::Literal(vec![]))])).is_err());
        assert!(evaluate_row(&model(), &request("x", &[("x", range(0.0, 1.0, 3))])).is_err());
    }
}
