//! Model factories.
//!
//! A model entry names a `target`; the `Instantiator` maps that name to a
//! factory which turns the declarative entry into a `Model`. The built-in
//! `expr` factory reads members as symbolic expressions.

use std::sync::Arc;

use crate::domain::{Domain, Model, ModelEntry, VariableDescriptor};
use crate::error::EngineError;
use crate::math::{Expression, CONSTANTS};
use crate::models::ExprCallable;

/// Builds a model from its declarative entry.
pub trait ModelFactory: Send + Sync {
    fn instantiate(&self, name: &str, entry: &ModelEntry) -> Result<Model, EngineError>;
}

impl<F> ModelFactory for F
where
    F: Fn(&str, &ModelEntry) -> Result<Model, EngineError> + Send + Sync,
{
    fn instantiate(&self, name: &str, entry: &ModelEntry) -> Result<Model, EngineError> {
        self(name, entry)
    }
}

/// Registered factories, looked up by target name.
pub struct Instantiator {
    factories: Vec<(String, Box<dyn ModelFactory>)>,
}

impl Instantiator {
    /// An instantiator with the built-in `expr` factory.
    pub fn new() -> Self {
        let mut out = Self { factories: Vec::new() };
        out.register("expr", ExprFactory);
        out
    }

    /// Register (or replace) the factory for `target`.
    pub fn register(&mut self, target: impl Into<String>, factory: impl ModelFactory + 'static) {
        let target = target.into();
        self.factories.retain(|(name, _)| *name != target);
        self.factories.push((target, Box::new(factory)));
    }

    pub fn instantiate(&self, name: &str, entry: &ModelEntry) -> Result<Model, EngineError> {
        let Some((_, factory)) = self.factories.iter().find(|(t, _)| *t == entry.target) else {
            return Err(EngineError::Instantiation {
                model: name.to_string(),
                reason: format!("unknown target '{}'", entry.target),
            });
        };
        factory.instantiate(name, entry)
    }
}

impl Default for Instantiator {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for models whose members are expressions over placeholder parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprFactory;

impl ModelFactory for ExprFactory {
    fn instantiate(&self, name: &str, entry: &ModelEntry) -> Result<Model, EngineError> {
        let fail = |reason: String| EngineError::Instantiation {
            model: name.to_string(),
            reason,
        };

        let placeholders: Vec<&str> = entry
            .members
            .iter()
            .filter(|(_, spec)| spec.is_none())
            .map(|(member, _)| member)
            .collect();

        let mut variables = Vec::with_capacity(entry.members.len());
        for (member, spec) in entry.members.iter() {
            if CONSTANTS.iter().any(|(c, _)| *c == member) {
                return Err(fail(format!(
                    "member name '{member}' is reserved for a constant in expressions"
                )));
            }
            let Some(spec) = spec else {
                variables.push(VariableDescriptor::independent(member));
                continue;
            };

            let expr = Expression::parse(&spec.expr)
                .map_err(|e| fail(format!("member '{member}': {e}")))?;
            let params = spec.params.clone().unwrap_or_else(|| expr.free_symbols());

            for (i, p) in params.iter().enumerate() {
                if params[..i].contains(p) {
                    return Err(fail(format!("member '{member}' lists parameter '{p}' twice")));
                }
                if !placeholders.contains(&p.as_str()) {
                    return Err(fail(format!(
                        "member '{member}' depends on '{p}', which is not an independent member"
                    )));
                }
            }

            let bound = expr
                .bind(&params)
                .map_err(|e| fail(format!("member '{member}': {e}")))?;

            let mut defaults: Vec<(String, Domain)> = Vec::with_capacity(spec.defaults.len());
            for (p, raw) in spec.defaults.iter() {
                if !params.iter().any(|q| q == p) {
                    return Err(fail(format!(
                        "member '{member}' declares a default for unknown parameter '{p}'"
                    )));
                }
                let domain = raw
                    .to_domain()
                    .map_err(|e| fail(format!("member '{member}' default for '{p}': {e}")))?;
                defaults.push((p.to_string(), domain));
            }

            let display = spec
                .latex
                .clone()
                .unwrap_or_else(|| format!("{member}({}) = {}", params.join(", "), expr));

            variables.push(VariableDescriptor::dependent(
                member,
                params,
                Arc::new(ExprCallable::new(bound)),
                defaults,
                display,
            ));
        }

        Model::new(name, variables)
    }
}
