//! An interactive session over a model catalogue.
//!
//! Build order:
//! registry -> per-model resolution -> range + selection state -> subscriptions
//!
//! Models that fail to instantiate or resolve are left out and recorded in the
//! session's `BuildReport`; they never stop the others from loading.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::view::ModelView;
use crate::controls::{CallbackBinder, ControlId, GraphId, ModelState, RangeController, SelectionController, UiEvent};
use crate::domain::{Domain, Figure, Model, ModelsConfig, Update};
use crate::error::EngineError;
use crate::figure::{resolve_defaults, resolve_model, ResolvedVariable};
use crate::models::{Instantiator, ModelRegistry};

/// Failures that kept models out of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub failures: Vec<EngineError>,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns every model's state and the subscriptions that mutate it.
#[derive(Debug)]
pub struct Session {
    models: Vec<Rc<RefCell<ModelState>>>,
    binder: CallbackBinder,
    report: BuildReport,
}

impl Session {
    /// Load, resolve and bind every model of `config`.
    pub fn build(config: &ModelsConfig, instantiator: &Instantiator, parallel: bool) -> Self {
        let registry = ModelRegistry::load(config, instantiator);
        let mut report = BuildReport {
            failures: registry.failures().to_vec(),
        };
        let mut models = Vec::new();
        let mut binder = CallbackBinder::new();

        for model in registry.models() {
            if model.dependents().next().is_none() {
                debug!(model = model.name(), "no plottable variables; skipped");
                continue;
            }

            let plot = config.models.get(model.name()).and_then(|entry| entry.plot.as_ref());
            let resolution = match resolve_model(model, plot) {
                Ok(resolution) => resolution,
                Err(err) => {
                    warn!(model = model.name(), error = %err, "model excluded");
                    report.failures.push(err);
                    continue;
                }
            };

            let selection = SelectionController::new(model.name(), model.dependent_names(), resolution.names());
            let ranges = RangeController::new(model.name(), adjustable_variables(model, &resolution.variables));
            let state = Rc::new(RefCell::new(ModelState::new(
                Arc::clone(model),
                selection,
                ranges,
                parallel,
            )));
            binder.bind_model(&state);
            models.push(state);
        }

        info!(
            models = models.len(),
            excluded = report.failures.len(),
            controls = binder.len(),
            "session ready"
        );

        Self { models, binder, report }
    }

    /// Surviving model names, in configuration order.
    pub fn model_names(&self) -> Vec<String> {
        self.models
            .iter()
            .map(|m| m.borrow().model().name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn state(&self, model: &str) -> Option<Ref<'_, ModelState>> {
        self.find(model).map(|s| s.borrow())
    }

    /// The current figure of `model`.
    pub fn figure(&self, model: &str) -> Option<Figure> {
        self.state(model).map(|s| s.figure().clone())
    }

    pub fn revision(&self, model: &str) -> Option<u64> {
        self.state(model).map(|s| s.revision())
    }

    /// Control descriptions and initial figures, one per model.
    pub fn build_initial_ui(&self) -> Vec<ModelView> {
        self.models.iter().map(|m| ModelView::from_state(&m.borrow())).collect()
    }

    /// Replace the visible variables of `model`.
    pub fn on_selection_change(&mut self, model: &str, names: Vec<String>) -> Update {
        match self.dispatch(&ControlId::checklist(model), &UiEvent::Checklist(names)) {
            Some((_, update)) => update,
            None => Update::Failed(EngineError::UnknownModel(model.to_string()).to_string()),
        }
    }

    /// Replace the domain of one (variable, parameter) pair of `model`.
    ///
    /// Goes through `ModelState::resample`, like the slider and count
    /// subscriptions, so the same count ceiling and rollback apply.
    pub fn on_range_change(&mut self, model: &str, variable: &str, param: &str, domain: Domain) -> Update {
        match self.find(model) {
            Some(state) => state.borrow_mut().resample(variable, param, domain),
            None => Update::Failed(EngineError::UnknownModel(model.to_string()).to_string()),
        }
    }

    /// Route a control event; `None` if the control is not bound.
    pub fn dispatch(&mut self, control: &ControlId, event: &UiEvent) -> Option<(GraphId, Update)> {
        self.binder.dispatch(control, event)
    }

    fn find(&self, model: &str) -> Option<&Rc<RefCell<ModelState>>> {
        self.models.iter().find(|m| m.borrow().model().name() == model)
    }
}

/// Convenience wrapper: build a session and describe its UI in one call.
pub fn build_initial_ui(
    config: &ModelsConfig,
    instantiator: &Instantiator,
    parallel: bool,
) -> (Session, Vec<ModelView>) {
    let session = Session::build(config, instantiator, parallel);
    let views = session.build_initial_ui();
    (session, views)
}

/// Samplings of every Dependent variable that can be shown: the resolved
/// ones, plus the others whose declared defaults are complete.
fn adjustable_variables(model: &Model, resolved: &[ResolvedVariable]) -> Vec<ResolvedVariable> {
    model
        .dependents()
        .filter_map(|var| match resolved.iter().find(|r| r.variable == var.name) {
            Some(r) => Some(r.clone()),
            None => resolve_defaults(model, var).ok().map(|params| ResolvedVariable {
                variable: var.name.clone(),
                params,
            }),
        })
        .collect()
}
