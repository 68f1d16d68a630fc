//! Front-end descriptions of a model's controls.
//!
//! These are plain data: a hosting UI turns them into widgets and sends the
//! resulting events back through the session.

use crate::controls::{ControlId, GraphId, ModelState};
use crate::domain::{Domain, Figure, Sampling};
use crate::math::every_nth;

/// Number of slider marks a sampling is thinned down to (at most one more).
const SLIDER_MARKS: usize = 31;

/// One line of a model's equation list, paired with its checklist entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationDisplay {
    /// Element id of the rendered equation.
    pub id: String,
    pub variable: String,
    pub expression: String,
    pub checked: bool,
}

/// A range slider over one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderSpec {
    pub control: ControlId,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: (f64, f64),
    /// Tick positions and their labels.
    pub marks: Vec<(f64, String)>,
}

/// A sample-count input for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSpec {
    pub control: ControlId,
    pub value: usize,
    pub min: usize,
    pub max: usize,
}

/// Controls of one (variable, parameter) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamControls {
    pub variable: String,
    pub param: String,
    pub slider: SliderSpec,
    pub count: CountSpec,
}

/// Everything a front-end needs to lay out one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelView {
    pub model: String,
    pub checklist: ControlId,
    pub graph: GraphId,
    pub equations: Vec<EquationDisplay>,
    pub figure: Figure,
    pub params: Vec<ParamControls>,
    /// Reported problems: failed rows of the current figure.
    pub issues: Vec<String>,
}

impl ModelView {
    pub fn from_state(state: &ModelState) -> Self {
        let model = state.model();
        let name = model.name();

        let equations = model
            .dependents()
            .map(|v| EquationDisplay {
                id: format!("{name}-{}-expression", v.name),
                variable: v.name.clone(),
                expression: v.display.clone(),
                checked: state.selection().is_selected(&v.name),
            })
            .collect();

        let params = state
            .ranges()
            .variables()
            .iter()
            .flat_map(|v| {
                v.params
                    .iter()
                    .filter_map(|(param, sampling)| param_controls(name, &v.variable, param, sampling))
            })
            .collect();

        Self {
            model: name.to_string(),
            checklist: ControlId::checklist(name),
            graph: GraphId::Model(name.to_string()),
            equations,
            figure: state.figure().clone(),
            params,
            issues: state.failures().iter().map(ToString::to_string).collect(),
        }
    }

    pub fn controls(&self, variable: &str) -> impl Iterator<Item = &ParamControls> {
        self.params.iter().filter(move |p| p.variable == variable)
    }
}

/// Slider and count specs for a sampling, or `None` if it has no finite span.
pub fn param_controls(model: &str, variable: &str, param: &str, sampling: &Sampling) -> Option<ParamControls> {
    let (min, max) = sampling.bounds()?;
    let samples = sampling.samples();
    let len = samples.len();
    if len == 0 || max <= min {
        return None;
    }

    let marks = every_nth(&samples, len / SLIDER_MARKS)
        .into_iter()
        .map(|v| (v, format!("{v:.2}")))
        .collect();

    Some(ParamControls {
        variable: variable.to_string(),
        param: param.to_string(),
        slider: SliderSpec {
            control: ControlId::range_slider(model, variable, param),
            min,
            max,
            step: (max - min) / len as f64,
            value: (min, max),
            marks,
        },
        count: CountSpec {
            control: ControlId::point_count(model, variable, param),
            value: len,
            min: Domain::MIN_COUNT,
            max: Domain::count_limit(len),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_spec_from_range() {
        let sampling = Sampling::Range(Domain::new(0.0, 10.0, 62).unwrap());
        let c = param_controls("m", "f", "x", &sampling).unwrap();
        assert_eq!(c.slider.value, (0.0, 10.0));
        assert!((c.slider.step - 10.0 / 62.0).abs() < 1e-12);
        // Every second sample: 31 marks.
        assert_eq!(c.slider.marks.len(), 31);
        assert_eq!(c.slider.marks[0].1, "0.00");
        assert_eq!(c.count.value, 62);
        assert_eq!(c.count.min, 3);
        assert_eq!(c.count.max, 620);
        assert_eq!(c.slider.control, ControlId::range_slider("m", "f", "x"));
    }

    #[test]
    fn short_samplings_mark_every_sample() {
        let sampling = Sampling::Literal(vec![3.0, 1.0, 2.0]);
        let c = param_controls("m", "f", "x", &sampling).unwrap();
        assert_eq!((c.slider.min, c.slider.max), (1.0, 3.0));
        assert_eq!(c.slider.marks.len(), 3);
        assert_eq!(c.count.value, 3);
    }

    #[test]
    fn degenerate_samplings_have_no_controls() {
        assert!(param_controls("m", "f", "x", &Sampling::Literal(vec![1.0, 1.0])).is_none());
        assert!(param_controls("m", "f", "x", &Sampling::Literal(Vec::new())).is_none());
    }
}
