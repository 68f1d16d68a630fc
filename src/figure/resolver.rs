//! Parameter-domain resolution.
//!
//! For each Dependent variable that should be plotted we decide how every one
//! of its parameters is sampled:
//!
//! 1. no plot section for the model: declared defaults for every variable
//! 2. plot entry `null`: declared defaults for that variable
//! 3. plot entry with literal sequences: those sequences, used verbatim
//!
//! Parameters an explicit entry leaves out fall back to their declared
//! default. Any parameter that ends up with neither is a resolution failure
//! for the whole model.

use crate::domain::{Model, ParamOverrides, PlotConfig, Sampling, VariableDescriptor};
use crate::error::EngineError;

/// Resolved sampling of one variable, parameters in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub variable: String,
    pub params: Vec<(String, Sampling)>,
}

/// Resolution of a whole model, variables in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub variables: Vec<ResolvedVariable>,
}

impl Resolution {
    pub fn get(&self, variable: &str) -> Option<&ResolvedVariable> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    pub fn names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.variable.clone()).collect()
    }
}

/// Resolve the variables of `model` that should appear, given its plot section.
pub fn resolve_model(model: &Model, plot: Option<&PlotConfig>) -> Result<Resolution, EngineError> {
    if let Some(plot) = plot {
        for name in plot.keys() {
            if model.dependent(name).is_none() {
                return Err(EngineError::ConfigResolution {
                    model: model.name().to_string(),
                    variable: name.to_string(),
                    reason: "plot entry does not name a plottable variable".to_string(),
                });
            }
        }
    }

    let mut variables = Vec::new();
    for var in model.dependents() {
        let params = match plot {
            None => resolve_defaults(model, var)?,
            Some(plot) => match plot.get(&var.name) {
                None => continue,
                Some(None) => resolve_defaults(model, var)?,
                Some(Some(overrides)) => resolve_overrides(model, var, overrides)?,
            },
        };
        variables.push(ResolvedVariable {
            variable: var.name.clone(),
            params,
        });
    }

    Ok(Resolution { variables })
}

/// Declared default sampling for every parameter of `var`.
pub fn resolve_defaults(
    model: &Model,
    var: &VariableDescriptor,
) -> Result<Vec<(String, Sampling)>, EngineError> {
    var.params
        .iter()
        .map(|p| {
            var.default_for(p)
                .map(|domain| (p.clone(), Sampling::Range(domain)))
                .ok_or_else(|| missing_default(model, var, p))
        })
        .collect()
}

fn resolve_overrides(
    model: &Model,
    var: &VariableDescriptor,
    overrides: &ParamOverrides,
) -> Result<Vec<(String, Sampling)>, EngineError> {
    for key in overrides.keys() {
        if !var.params.iter().any(|p| p == key) {
            return Err(EngineError::ConfigResolution {
                model: model.name().to_string(),
                variable: var.name.clone(),
                reason: format!("'{key}' is not a parameter of this variable"),
            });
        }
    }

    var.params
        .iter()
        .map(|p| match overrides.get(p) {
            Some(values) => Ok((p.clone(), Sampling::Literal(values.clone()))),
            None => var
                .default_for(p)
                .map(|domain| (p.clone(), Sampling::Range(domain)))
                .ok_or_else(|| missing_default(model, var, p)),
        })
        .collect()
}

fn missing_default(model: &Model, var: &VariableDescriptor, param: &str) -> EngineError {
    EngineError::ConfigResolution {
        model: model.name().to_string(),
        variable: var.name.clone(),
        reason: format!("no declared default for parameter '{param}'"),
    }
}
