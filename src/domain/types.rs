//! Shared domain types.
//!
//! These types are deliberately plain data so they can flow unchanged between
//! the registry, the resolver, the composer and whichever front-end hosts the
//! figures:
//!
//! - sampling: `Domain`, `Sampling`, `ParamGrid`, `ValueGrid`
//! - models: `Model`, `VariableDescriptor`, `VariableKind`, `Callable`
//! - outputs: `Figure`, `Row`, `Trace`, `Update`

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::EngineError;
use crate::math::{grid_len, linspace, unravel_index};

/// A closed, ascending, evenly spaced sampling range.
///
/// Construction validates `min < max` (both finite) and
/// `MIN_COUNT <= count <= MAX_COUNT`, so a `Domain` value is never degenerate
/// and always cheap enough to materialize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    min: f64,
    max: f64,
    count: usize,
}

impl Domain {
    /// Smallest accepted number of sample points.
    pub const MIN_COUNT: usize = 3;
    /// Largest accepted number of sample points.
    pub const MAX_COUNT: usize = 100_000;

    /// Largest count a point-count control offers for a sampling of `len`
    /// points.
    pub fn count_limit(len: usize) -> usize {
        len.saturating_mul(10).clamp(Self::MIN_COUNT, Self::MAX_COUNT)
    }

    pub fn new(min: f64, max: f64, count: usize) -> Result<Self, EngineError> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(EngineError::InvalidDomain(format!(
                "bounds must be finite (min={min}, max={max})"
            )));
        }
        if min >= max {
            return Err(EngineError::InvalidDomain(format!(
                "min must be below max (min={min}, max={max})"
            )));
        }
        if count < Self::MIN_COUNT {
            return Err(EngineError::InvalidDomain(format!(
                "count must be >= {} (got {count})",
                Self::MIN_COUNT
            )));
        }
        if count > Self::MAX_COUNT {
            return Err(EngineError::InvalidDomain(format!(
                "count must be <= {} (got {count})",
                Self::MAX_COUNT
            )));
        }
        Ok(Self { min, max, count })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Same point count over a new `[min, max]`.
    pub fn with_range(&self, min: f64, max: f64) -> Result<Self, EngineError> {
        Self::new(min, max, self.count)
    }

    /// Same range with a new point count.
    pub fn with_count(&self, count: usize) -> Result<Self, EngineError> {
        Self::new(self.min, self.max, count)
    }

    /// Materialize the domain into `count` evenly spaced points, endpoints included.
    pub fn samples(&self) -> Vec<f64> {
        linspace(self.min, self.max, self.count)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}; {}]", self.min, self.max, self.count)
    }
}

/// How one parameter of one variable is currently sampled.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampling {
    /// An evenly spaced domain (declared default or adjusted by a range control).
    Range(Domain),
    /// A literal sequence from the plot configuration, used verbatim.
    Literal(Vec<f64>),
}

impl Sampling {
    pub fn samples(&self) -> Vec<f64> {
        match self {
            Sampling::Range(domain) => domain.samples(),
            Sampling::Literal(values) => values.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Sampling::Range(domain) => domain.count(),
            Sampling::Literal(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest and largest finite sample, if any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Sampling::Range(domain) => Some((domain.min(), domain.max())),
            Sampling::Literal(values) => {
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for &v in values.iter().filter(|v| v.is_finite()) {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
                (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
            }
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampling::Range(domain) => write!(f, "{domain}"),
            Sampling::Literal(values) => match self.bounds() {
                Some((lo, hi)) => write!(f, "literal[{lo}..{hi}; {}]", values.len()),
                None => write!(f, "literal[{}]", values.len()),
            },
        }
    }
}

/// Sample points for each parameter of one evaluation, in declaration order.
///
/// The grid is the cross product of the axes with `ij` indexing: axis `k`
/// varies along dimension `k` of the value grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<f64>)>,
}

impl ParamGrid {
    pub fn new(axes: Vec<(String, Vec<f64>)>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[(String, Vec<f64>)] {
        &self.axes
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(name, _)| name.as_str())
    }

    pub fn axis(&self, name: &str) -> Option<&[f64]> {
        self.axes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|(_, values)| values.len()).collect()
    }

    /// Number of points in the full cross product.
    pub fn len(&self) -> usize {
        grid_len(&self.shape())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the coordinates of flat (row-major) point `flat` into `out`.
    pub fn point(&self, flat: usize, out: &mut [f64]) {
        let shape = self.shape();
        let mut idx = vec![0usize; shape.len()];
        unravel_index(flat, &shape, &mut idx);
        for (k, (_, values)) in self.axes.iter().enumerate() {
            out[k] = values[idx[k]];
        }
    }

    /// One-line description, e.g. `x=[0..10; 50], t=literal[0..1; 3]`.
    pub fn describe(&self) -> String {
        self.axes
            .iter()
            .map(|(name, values)| match (values.first(), values.last()) {
                (Some(a), Some(b)) => format!("{name}=[{a}..{b}; {}]", values.len()),
                _ => format!("{name}=[]"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Values returned by a callable: a dense row-major array over a `ParamGrid`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

/// The evaluable body of a Dependent variable.
pub trait Callable: Send + Sync {
    /// Evaluate over the full cross product of `grid`.
    ///
    /// The returned shape must equal `grid.shape()`.
    fn call(&self, grid: &ParamGrid) -> Result<ValueGrid, String>;
}

impl<F> Callable for F
where
    F: Fn(&ParamGrid) -> Result<ValueGrid, String> + Send + Sync,
{
    fn call(&self, grid: &ParamGrid) -> Result<ValueGrid, String> {
        self(grid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Evaluable and plottable.
    Dependent,
    /// A free parameter placeholder with no body.
    Independent,
}

/// One member of a model.
#[derive(Clone)]
pub struct VariableDescriptor {
    pub name: String,
    pub kind: VariableKind,
    /// Declared parameters, in declaration order (empty for Independent members).
    pub params: Vec<String>,
    pub callable: Option<Arc<dyn Callable>>,
    /// Declared default domains, keyed by parameter name.
    pub defaults: Vec<(String, Domain)>,
    /// Opaque text handed to the equation renderer.
    pub display: String,
}

impl VariableDescriptor {
    pub fn independent(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display: name.clone(),
            name,
            kind: VariableKind::Independent,
            params: Vec::new(),
            callable: None,
            defaults: Vec::new(),
        }
    }

    pub fn dependent(
        name: impl Into<String>,
        params: Vec<String>,
        callable: Arc<dyn Callable>,
        defaults: Vec<(String, Domain)>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Dependent,
            params,
            callable: Some(callable),
            defaults,
            display: display.into(),
        }
    }

    pub fn is_dependent(&self) -> bool {
        self.kind == VariableKind::Dependent
    }

    pub fn default_for(&self, param: &str) -> Option<Domain> {
        self.defaults
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, domain)| *domain)
    }
}

impl fmt::Debug for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("defaults", &self.defaults)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

/// A named, ordered collection of variables. Immutable once built.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    variables: Vec<VariableDescriptor>,
}

impl Model {
    /// Build a model, rejecting duplicate member names.
    pub fn new(name: impl Into<String>, variables: Vec<VariableDescriptor>) -> Result<Self, EngineError> {
        let name = name.into();
        for (i, v) in variables.iter().enumerate() {
            if variables[..i].iter().any(|other| other.name == v.name) {
                return Err(EngineError::Instantiation {
                    model: name,
                    reason: format!("duplicate member '{}'", v.name),
                });
            }
        }
        Ok(Self { name, variables })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VariableDescriptor] {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn dependent(&self, name: &str) -> Option<&VariableDescriptor> {
        self.get(name).filter(|v| v.is_dependent())
    }

    pub fn dependents(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter().filter(|v| v.is_dependent())
    }

    pub fn independents(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter().filter(|v| !v.is_dependent())
    }

    pub fn dependent_names(&self) -> Vec<String> {
        self.dependents().map(|v| v.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// The rendered data of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    /// One parameter: `y[i] = f(x[i])`.
    Line { x: Vec<f64>, y: Vec<f64> },
    /// Two parameters: `z[(i, j)] = f(x[i], y[j])`.
    Surface {
        x: Vec<f64>,
        y: Vec<f64>,
        z: DMatrix<f64>,
    },
}

impl Trace {
    /// Number of evaluated points in the trace.
    pub fn len(&self) -> usize {
        match self {
            Trace::Line { y, .. } => y.len(),
            Trace::Surface { z, .. } => z.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One subplot row: a variable, the parameters on its axes, and its trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub variable: String,
    pub axes: Vec<String>,
    pub trace: Trace,
}

/// A model's multi-row figure, one row per visible variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    pub rows: Vec<Row>,
}

impl Figure {
    pub fn row(&self, variable: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.variable == variable)
    }

    pub fn variables(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.variable.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of a UI event.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// The figure was recomputed and should be published.
    Updated(Figure),
    /// Nothing to publish; the previous figure stays.
    NoChange,
    /// The event was rejected or the recompute failed; the previous figure stays.
    Failed(String),
}

impl Update {
    pub fn figure(&self) -> Option<&Figure> {
        match self {
            Update::Updated(figure) => Some(figure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_materializes_evenly() {
        let d = Domain::new(0.0, 10.0, 5).unwrap();
        assert_eq!(d.samples(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn domain_rejects_degenerate_inputs() {
        assert!(Domain::new(1.0, 1.0, 10).is_err());
        assert!(Domain::new(2.0, 1.0, 10).is_err());
        assert!(Domain::new(0.0, 1.0, 2).is_err());
        assert!(Domain::new(f64::NAN, 1.0, 10).is_err());
        assert!(Domain::new(0.0, 1.0, usize::MAX).is_err());
        assert!(Domain::new(0.0, 1.0, Domain::MAX_COUNT).is_ok());
    }

    #[test]
    fn count_limit_scales_with_current_length() {
        assert_eq!(Domain::count_limit(50), 500);
        assert_eq!(Domain::count_limit(0), Domain::MIN_COUNT);
        assert_eq!(Domain::count_limit(usize::MAX), Domain::MAX_COUNT);
    }

    #[test]
    fn literal_bounds_ignore_non_finite() {
        let s = Sampling::Literal(vec![3.0, f64::NAN, -1.0, 2.0]);
        assert_eq!(s.bounds(), Some((-1.0, 3.0)));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn param_grid_points_use_ij_order() {
        let grid = ParamGrid::new(vec![
            ("x".to_string(), vec![1.0, 2.0]),
            ("y".to_string(), vec![10.0, 20.0, 30.0]),
        ]);
        assert_eq!(grid.len(), 6);
        let mut p = [0.0; 2];
        grid.point(1, &mut p);
        assert_eq!(p, [1.0, 20.0]);
        grid.point(3, &mut p);
        assert_eq!(p, [2.0, 10.0]);
    }

    #[test]
    fn model_rejects_duplicate_members() {
        let err = Model::new(
            "m",
            vec![VariableDescriptor::independent("x"), VariableDescriptor::independent("x")],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Instantiation { .. }));
    }
}
