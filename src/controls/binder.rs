//! Event subscriptions.
//!
//! Every input control gets one subscription: a handler that owns the
//! identifiers it needs (model, variable, parameter) and a handle on its own
//! model's state. The binder routes an event to the handler registered for the
//! control and returns the graph to republish.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::controls::{ControlId, GraphId, ModelState};
use crate::domain::{Domain, Update};

/// An input from a front-end control.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Full membership list of a checklist.
    Checklist(Vec<String>),
    /// New bounds from a range slider.
    RangeSlider { min: f64, max: f64 },
    /// New sample count from a number input.
    PointCount(usize),
}

pub type Handler = Box<dyn FnMut(&UiEvent) -> Update>;

/// A handler and the graph its updates are published to.
pub struct Subscription {
    pub graph: GraphId,
    handler: Handler,
}

impl Subscription {
    pub fn new(graph: GraphId, handler: Handler) -> Self {
        Self { graph, handler }
    }

    pub fn handle(&mut self, event: &UiEvent) -> Update {
        (self.handler)(event)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

/// Checklist handler for one model.
pub fn selection_subscription(state: Rc<RefCell<ModelState>>) -> Subscription {
    let graph = GraphId::Model(state.borrow().model().name().to_string());
    Subscription::new(
        graph,
        Box::new(move |event| match event {
            UiEvent::Checklist(names) => state.borrow_mut().select(names.clone()),
            other => Update::Failed(format!("checklist cannot handle {other:?}")),
        }),
    )
}

/// Range-slider handler for one (variable, parameter) pair. Keeps the pair's
/// current sample count.
pub fn slider_subscription(
    state: Rc<RefCell<ModelState>>,
    variable: String,
    param: String,
) -> Subscription {
    let graph = GraphId::Model(state.borrow().model().name().to_string());
    Subscription::new(
        graph,
        Box::new(move |event| {
            let UiEvent::RangeSlider { min, max } = *event else {
                return Update::Failed(format!("range slider cannot handle {event:?}"));
            };
            let next = {
                let state = state.borrow();
                match state.ranges().current_domain(&variable, &param) {
                    Some(current) => current.with_range(min, max),
                    None => {
                        let count = state
                            .ranges()
                            .sampling(&variable, &param)
                            .map_or(Domain::MIN_COUNT, |s| s.len().max(Domain::MIN_COUNT));
                        Domain::new(min, max, count)
                    }
                }
            };
            match next {
                Ok(domain) => state.borrow_mut().resample(&variable, &param, domain),
                Err(err) => Update::Failed(err.to_string()),
            }
        }),
    )
}

/// Point-count handler for one (variable, parameter) pair. Keeps the pair's
/// current range; counts above `Domain::count_limit` are rejected.
pub fn count_subscription(
    state: Rc<RefCell<ModelState>>,
    variable: String,
    param: String,
) -> Subscription {
    let graph = GraphId::Model(state.borrow().model().name().to_string());
    Subscription::new(
        graph,
        Box::new(move |event| {
            let UiEvent::PointCount(count) = *event else {
                return Update::Failed(format!("point count cannot handle {event:?}"));
            };
            let current = state.borrow().ranges().current_domain(&variable, &param);
            let Some(current) = current else {
                return Update::Failed(format!("no current range for '{variable}.{param}'"));
            };
            match current.with_count(count) {
                Ok(domain) => state.borrow_mut().resample(&variable, &param, domain),
                Err(err) => Update::Failed(err.to_string()),
            }
        }),
    )
}

/// Routes control events to their subscriptions.
#[derive(Debug, Default)]
pub struct CallbackBinder {
    subscriptions: HashMap<ControlId, Subscription>,
}

impl CallbackBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every control of one model: its checklist, then a slider and a
    /// count input per (variable, parameter) with a known sampling.
    pub fn bind_model(&mut self, state: &Rc<RefCell<ModelState>>) -> Vec<ControlId> {
        let (model, pairs) = {
            let s = state.borrow();
            let pairs: Vec<(String, String)> = s
                .ranges()
                .variables()
                .iter()
                .flat_map(|v| v.params.iter().map(|(p, _)| (v.variable.clone(), p.clone())))
                .collect();
            (s.model().name().to_string(), pairs)
        };

        let mut bound = Vec::with_capacity(1 + 2 * pairs.len());

        let checklist = ControlId::checklist(model.as_str());
        self.insert(checklist.clone(), selection_subscription(Rc::clone(state)));
        bound.push(checklist);

        for (variable, param) in pairs {
            let slider = ControlId::range_slider(&model, &variable, &param);
            self.insert(
                slider.clone(),
                slider_subscription(Rc::clone(state), variable.clone(), param.clone()),
            );
            bound.push(slider);

            let count = ControlId::point_count(&model, &variable, &param);
            self.insert(count.clone(), count_subscription(Rc::clone(state), variable, param));
            bound.push(count);
        }

        debug!(model = %model, controls = bound.len(), "bound controls");
        bound
    }

    pub fn insert(&mut self, control: ControlId, subscription: Subscription) {
        if self.subscriptions.insert(control.clone(), subscription).is_some() {
            warn!(control = %control, "replaced existing subscription");
        }
    }

    /// Deliver `event` to the subscription of `control`.
    ///
    /// Returns `None` for controls nobody subscribed to.
    pub fn dispatch(&mut self, control: &ControlId, event: &UiEvent) -> Option<(GraphId, Update)> {
        let subscription = self.subscriptions.get_mut(control)?;
        let update = subscription.handle(event);
        if let Update::Failed(reason) = &update {
            warn!(control = %control, %reason, "event rejected");
        }
        Some((subscription.graph.clone(), update))
    }

    pub fn controls(&self) -> impl Iterator<Item = &ControlId> {
        self.subscriptions.keys()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
