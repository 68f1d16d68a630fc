//! Per-parameter sampling state of a model's variables.

use crate::domain::{Domain, Sampling};
use crate::error::EngineError;
use crate::figure::ResolvedVariable;

/// Current sampling of every (variable, parameter) pair of one model.
///
/// Starts from the resolver's output. Each edit replaces one pair's sampling
/// with a complete `Domain`; range and count never change separately.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeController {
    model: String,
    variables: Vec<ResolvedVariable>,
}

impl RangeController {
    pub fn new(model: impl Into<String>, variables: Vec<ResolvedVariable>) -> Self {
        Self {
            model: model.into(),
            variables,
        }
    }

    /// Variables with a known sampling, in declaration order.
    pub fn variables(&self) -> &[ResolvedVariable] {
        &self.variables
    }

    /// Evaluation request for `variable` with its current sampling.
    pub fn request(&self, variable: &str) -> Option<&ResolvedVariable> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    pub fn sampling(&self, variable: &str, param: &str) -> Option<&Sampling> {
        self.request(variable)?
            .params
            .iter()
            .find(|(p, _)| p == param)
            .map(|(_, s)| s)
    }

    /// The sampling of a pair expressed as a `Domain`.
    ///
    /// Literal sequences map to their finite bounds and length (length raised
    /// to `Domain::MIN_COUNT` if shorter); `None` if that is still degenerate.
    pub fn current_domain(&self, variable: &str, param: &str) -> Option<Domain> {
        let sampling = self.sampling(variable, param)?;
        match sampling {
            Sampling::Range(domain) => Some(*domain),
            Sampling::Literal(values) => {
                let (lo, hi) = sampling.bounds()?;
                Domain::new(lo, hi, values.len().max(Domain::MIN_COUNT)).ok()
            }
        }
    }

    /// Replace the sampling of one pair, returning the previous one.
    pub fn set(&mut self, variable: &str, param: &str, domain: Domain) -> Result<Sampling, EngineError> {
        let slot = self.slot_mut(variable, param)?;
        Ok(std::mem::replace(slot, Sampling::Range(domain)))
    }

    /// Put back a sampling previously returned by `set`.
    pub fn restore(&mut self, variable: &str, param: &str, previous: Sampling) -> Result<(), EngineError> {
        *self.slot_mut(variable, param)? = previous;
        Ok(())
    }

    fn slot_mut(&mut self, variable: &str, param: &str) -> Result<&mut Sampling, EngineError> {
        let model = &self.model;
        let Some(var) = self.variables.iter_mut().find(|v| v.variable == variable) else {
            return Err(EngineError::UnknownVariable {
                model: model.clone(),
                variable: variable.to_string(),
            });
        };
        var.params
            .iter_mut()
            .find(|(p, _)| p == param)
            .map(|(_, s)| s)
            .ok_or_else(|| EngineError::UnknownParameter {
                model: model.clone(),
                variable: variable.to_string(),
                param: param.to_string(),
            })
    }
}
