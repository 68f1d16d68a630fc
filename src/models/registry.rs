//! The model registry: every configured model that could be instantiated.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{Model, ModelsConfig, VariableDescriptor};
use crate::error::EngineError;
use crate::models::Instantiator;

/// Instantiated models in configuration order, plus the ones that failed.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<Model>>,
    failures: Vec<EngineError>,
}

impl ModelRegistry {
    /// Instantiate every configured model.
    ///
    /// A failing model is recorded in `failures()` and skipped; the rest are
    /// still built. Models without any members are dropped silently.
    pub fn load(config: &ModelsConfig, instantiator: &Instantiator) -> Self {
        let mut out = Self::default();

        for (name, entry) in config.models.iter() {
            let built = catch_unwind(AssertUnwindSafe(|| instantiator.instantiate(name, entry)))
                .unwrap_or_else(|_| {
                    Err(EngineError::Instantiation {
                        model: name.to_string(),
                        reason: "factory panicked".to_string(),
                    })
                });

            match built {
                Ok(model) if model.is_empty() => {
                    debug!(model = name, "dropping model without members");
                }
                Ok(model) => {
                    info!(
                        model = name,
                        dependent = model.dependents().count(),
                        independent = model.independents().count(),
                        "instantiated model"
                    );
                    out.models.push(Arc::new(model));
                }
                Err(err) => {
                    warn!(model = name, error = %err, "could not instantiate model");
                    out.failures.push(err);
                }
            }
        }

        out
    }

    /// Surviving model names, in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn models(&self) -> &[Arc<Model>] {
        &self.models
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.iter().find(|m| m.name() == name)
    }

    pub fn variables(&self, name: &str) -> Option<&[VariableDescriptor]> {
        self.get(name).map(|m| m.variables())
    }

    pub fn failures(&self) -> &[EngineError] {
        &self.failures
    }
}
