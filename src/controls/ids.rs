//! Identifiers of UI controls.
//!
//! Identifiers are typed so they can never collide: two controls are the same
//! only if every component (model, variable, parameter) matches. The `Display`
//! forms are what a hosting front-end would use as element ids.

use std::fmt;

/// A figure surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphId {
    /// The multi-row figure of a model.
    Model(String),
    /// A single variable's row; range controls are keyed by it.
    Row { model: String, variable: String },
}

impl GraphId {
    pub fn model(&self) -> &str {
        match self {
            GraphId::Model(model) | GraphId::Row { model, .. } => model,
        }
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphId::Model(model) => write!(f, "graph-{model}"),
            GraphId::Row { model, variable } => write!(f, "graph-{model}-{variable}"),
        }
    }
}

/// An input control that produces UI events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlId {
    Checklist { model: String },
    RangeSlider { graph: GraphId, param: String },
    PointCount { graph: GraphId, param: String },
}

impl ControlId {
    pub fn checklist(model: impl Into<String>) -> Self {
        ControlId::Checklist { model: model.into() }
    }

    pub fn range_slider(model: &str, variable: &str, param: &str) -> Self {
        ControlId::RangeSlider {
            graph: row_graph(model, variable),
            param: param.to_string(),
        }
    }

    pub fn point_count(model: &str, variable: &str, param: &str) -> Self {
        ControlId::PointCount {
            graph: row_graph(model, variable),
            param: param.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ControlId::Checklist { model } => model,
            ControlId::RangeSlider { graph, .. } | ControlId::PointCount { graph, .. } => graph.model(),
        }
    }
}

fn row_graph(model: &str, variable: &str) -> GraphId {
    GraphId::Row {
        model: model.to_string(),
        variable: variable.to_string(),
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::Checklist { model } => write!(f, "checklist-{model}"),
            ControlId::RangeSlider { graph, param } => write!(f, "rangeslider-{graph}-{param}"),
            ControlId::PointCount { graph, param } => write!(f, "input-{graph}-{param}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(GraphId::Model("m".into()).to_string(), "graph-m");
        assert_eq!(ControlId::checklist("m").to_string(), "checklist-m");
        assert_eq!(ControlId::range_slider("m", "f", "x").to_string(), "rangeslider-graph-m-f-x");
        assert_eq!(ControlId::point_count("m", "f", "x").to_string(), "input-graph-m-f-x");
    }

    #[test]
    fn typed_ids_do_not_collide_when_strings_would() {
        // "a-b" + "c" and "a" + "b-c" render the same string but stay distinct keys.
        let one = ControlId::range_slider("a-b", "c", "x");
        let two = ControlId::range_slider("a", "b-c", "x");
        assert_eq!(one.to_string(), two.to_string());
        assert_ne!(one, two);
        assert_eq!(two.model(), "a");
    }
}
