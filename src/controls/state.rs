//! Session state of one model: its controllers and its published figure.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::controls::{RangeController, SelectionController, Transition};
use crate::domain::{Domain, Figure, Model, Update};
use crate::error::EngineError;
use crate::figure::{compose, evaluate_row, ResolvedVariable};

/// Everything one model's subscriptions act on.
///
/// Each model gets its own `ModelState`; nothing here is shared between models
/// or between sessions.
#[derive(Debug, Clone)]
pub struct ModelState {
    model: Arc<Model>,
    selection: SelectionController,
    ranges: RangeController,
    figure: Figure,
    failures: Vec<EngineError>,
    revision: u64,
    parallel: bool,
}

impl ModelState {
    /// Build the state and compose the initial figure for the initial selection.
    pub fn new(
        model: Arc<Model>,
        selection: SelectionController,
        ranges: RangeController,
        parallel: bool,
    ) -> Self {
        let mut state = Self {
            model,
            selection,
            ranges,
            figure: Figure::default(),
            failures: Vec::new(),
            revision: 0,
            parallel,
        };
        if !state.selection.selected().is_empty() {
            state.recompose();
        }
        state
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn ranges(&self) -> &RangeController {
        &self.ranges
    }

    /// The last published figure.
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Row failures of the last published figure.
    pub fn failures(&self) -> &[EngineError] {
        &self.failures
    }

    /// Number of figures composed so far (initial figure included).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply a checklist event and recompose every visible row.
    pub fn select(&mut self, names: Vec<String>) -> Update {
        match self.selection.apply(names) {
            Err(err) => Update::Failed(err.to_string()),
            Ok(Transition::EmptyRejected) => {
                debug!(model = self.model.name(), "empty selection ignored");
                Update::NoChange
            }
            Ok(Transition::Accepted) => {
                self.recompose();
                Update::Updated(self.figure.clone())
            }
        }
    }

    /// Apply a range edit and recompute only the affected row.
    ///
    /// If the variable is hidden the new sampling is stored for later and
    /// nothing is published. If the row fails to evaluate, the previous
    /// sampling is restored and the figure is left as it was.
    ///
    /// The new count may not exceed `Domain::count_limit` of the current one,
    /// the same ceiling the point-count control advertises.
    pub fn resample(&mut self, variable: &str, param: &str, domain: Domain) -> Update {
        if let Some(current) = self.ranges.sampling(variable, param) {
            let limit = Domain::count_limit(current.len());
            if domain.count() > limit {
                return Update::Failed(
                    EngineError::InvalidDomain(format!(
                        "count must be <= {limit} for '{variable}.{param}' (got {})",
                        domain.count()
                    ))
                    .to_string(),
                );
            }
        }

        let previous = match self.ranges.set(variable, param, domain) {
            Ok(previous) => previous,
            Err(err) => return Update::Failed(err.to_string()),
        };

        if !self.selection.is_selected(variable) {
            debug!(model = self.model.name(), variable, param, "resampled hidden variable");
            return Update::NoChange;
        }

        let Some(request) = self.ranges.request(variable) else {
            return Update::Failed(format!("no sampling for '{variable}'"));
        };

        match evaluate_row(&self.model, request) {
            Ok(row) => {
                let rows = self
                    .selection
                    .selected()
                    .iter()
                    .filter_map(|name| {
                        if *name == row.variable {
                            Some(row.clone())
                        } else {
                            self.figure.row(name).cloned()
                        }
                    })
                    .collect();
                self.figure = Figure { rows };
                self.failures.retain(|f| !is_row_failure(f, variable));
                self.revision += 1;
                debug!(model = self.model.name(), variable, param, %domain, "recomputed row");
                Update::Updated(self.figure.clone())
            }
            Err(err) => {
                if let Err(restore) = self.ranges.restore(variable, param, previous) {
                    warn!(model = self.model.name(), variable, param, error = %restore, "could not restore sampling");
                }
                Update::Failed(err.to_string())
            }
        }
    }

    fn recompose(&mut self) {
        let mut requests: Vec<ResolvedVariable> = Vec::with_capacity(self.selection.selected().len());
        let mut failures = Vec::new();
        for name in self.selection.selected() {
            match self.ranges.request(name) {
                Some(request) => requests.push(request.clone()),
                None => failures.push(EngineError::Evaluation {
                    model: self.model.name().to_string(),
                    variable: name.clone(),
                    params: "-".to_string(),
                    reason: "no sampling available (missing declared defaults)".to_string(),
                }),
            }
        }

        let composition = compose(&self.model, &requests, self.parallel);
        failures.extend(composition.failures);
        self.figure = composition.figure;
        self.failures = failures;
        self.revision += 1;
    }
}

fn is_row_failure(err: &EngineError, variable: &str) -> bool {
    matches!(err, EngineError::Evaluation { variable: v, .. } if v == variable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParamGrid, Sampling, Trace, ValueGrid, VariableDescriptor};

    fn scaled(k: f64) -> impl Fn(&ParamGrid) -> Result<ValueGrid, String> + Send + Sync {
        move |grid: &ParamGrid| {
            let x = grid.axes()[0].1.clone();
            if x.iter().any(|v| *v < 0.0) {
                return Err("negative input".to_string());
            }
            Ok(ValueGrid {
                shape: grid.shape(),
                values: x.iter().map(|v| k * v).collect(),
            })
        }
    }

    fn state() -> ModelState {
        let d = Domain::new(0.0, 1.0, 3).unwrap();
        let model = Model::new(
            "m",
            vec![
                VariableDescriptor::independent("x"),
                VariableDescriptor::dependent("f", vec!["x".into()], Arc::new(scaled(1.0)), vec![("x".into(), d)], "f"),
                VariableDescriptor::dependent("g", vec!["x".into()], Arc::new(scaled(2.0)), vec![("x".into(), d)], "g"),
                VariableDescriptor::dependent("h", vec!["x".into()], Arc::new(scaled(3.0)), vec![], "h"),
            ],
        )
        .unwrap();
        let req = |v: &str| ResolvedVariable {
            variable: v.to_string(),
            params: vec![("x".to_string(), Sampling::Range(d))],
        };
        let names: Vec<String> = vec!["f".into(), "g".into(), "h".into()];
        ModelState::new(
            Arc::new(model),
            SelectionController::new("m", names, vec!["f".into(), "g".into()]),
            RangeController::new("m", vec![req("f"), req("g")]),
            false,
        )
    }

    #[test]
    fn initial_figure_is_composed() {
        let s = state();
        assert_eq!(s.figure().variables(), vec!["f", "g"]);
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn empty_selection_keeps_figure() {
        let mut s = state();
        let before = s.figure().clone();
        assert_eq!(s.select(Vec::new()), Update::NoChange);
        assert_eq!(s.figure(), &before);
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn unresolved_variable_is_reported_not_fatal() {
        let mut s = state();
        let update = s.select(vec!["h".into(), "g".into()]);
        assert_eq!(update.figure().unwrap().variables(), vec!["g"]);
        assert_eq!(s.failures().len(), 1);
    }

    #[test]
    fn resample_touches_one_row() {
        let mut s = state();
        let g_before = s.figure().row("g").cloned();
        let update = s.resample("f", "x", Domain::new(0.0, 4.0, 5).unwrap());
        let figure = update.figure().unwrap();
        assert_eq!(figure.row("g").cloned(), g_before);
        let Trace::Line { x, .. } = &figure.row("f").unwrap().trace else {
            panic!("expected a line");
        };
        assert_eq!(x, &vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(figure.variables(), vec!["f", "g"]);
    }

    #[test]
    fn failed_resample_rolls_back() {
        let mut s = state();
        let before = s.figure().clone();
        let update = s.resample("f", "x", Domain::new(-1.0, 1.0, 5).unwrap());
        assert!(matches!(update, Update::Failed(_)));
        assert_eq!(s.figure(), &before);
        assert_eq!(s.ranges().current_domain("f", "x"), Some(Domain::new(0.0, 1.0, 3).unwrap()));
    }

    #[test]
    fn resample_rejects_counts_past_the_limit() {
        let mut s = state();
        let before = s.figure().clone();
        let update = s.resample("f", "x", Domain::new(0.0, 1.0, 31).unwrap());
        assert!(matches!(update, Update::Failed(ref m) if m.contains("<= 30")), "{update:?}");
        assert_eq!(s.figure(), &before);
        assert_eq!(s.revision(), 1);
        assert_eq!(s.ranges().current_domain("f", "x"), Some(Domain::new(0.0, 1.0, 3).unwrap()));

        let update = s.resample("f", "x", Domain::new(0.0, 1.0, 30).unwrap());
        assert_eq!(update.figure().unwrap().row("f").unwrap().trace.len(), 30);
    }

    #[test]
    fn resampling_hidden_variable_is_stored() {
        let mut s = state();
        s.select(vec!["f".into()]);
        let d = Domain::new(0.0, 2.0, 9).unwrap();
        assert_eq!(s.resample("g", "x", d), Update::NoChange);
        let update = s.select(vec!["f".into(), "g".into()]);
        assert_eq!(update.figure().unwrap().row("g").unwrap().trace.len(), 9);
    }
}
