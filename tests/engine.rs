//! End-to-end behaviour of the binding engine: catalogue in, figures and
//! event updates out.

use std::sync::Arc;

use kview::app::{Session, build_initial_ui};
use kview::controls::{ControlId, GraphId, UiEvent};
use kview::domain::{
    Domain, Model, ModelEntry, ModelsConfig, ParamGrid, Trace, Update, ValueGrid, VariableDescriptor,
};
use kview::error::EngineError;
use kview::figure::resolve_model;
use kview::models::{Instantiator, ModelRegistry};

fn yaml(text: &str) -> ModelsConfig {
    serde_yaml::from_str(text).unwrap()
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn line(update_or_figure: &kview::domain::Figure, variable: &str) -> (Vec<f64>, Vec<f64>) {
    match &update_or_figure.row(variable).unwrap().trace {
        Trace::Line { x, y } => (x.clone(), y.clone()),
        other => panic!("expected a line trace, got {other:?}"),
    }
}

const WAVES: &str = r#"
models:
  waves:
    members:
      x: ~
      f:
        expr: "sin(x)"
        defaults: { x: { min: 0, max: 10, count: 50 } }
      g:
        expr: "x^2"
        defaults: { x: { min: 0, max: 10, count: 20 } }
"#;

#[test]
fn single_variable_end_to_end() {
    let cfg = yaml(
        r#"
models:
  solo:
    members:
      x: ~
      f:
        expr: "x / 2"
        defaults: { x: { min: 0, max: 10, count: 50 } }
"#,
    );
    let (_, views) = build_initial_ui(&cfg, &Instantiator::new(), true);
    assert_eq!(views.len(), 1);
    let figure = &views[0].figure;
    assert_eq!(figure.len(), 1);
    let (x, y) = line(figure, "f");
    assert_eq!(x.len(), 50);
    assert!(x.iter().all(|v| (0.0..=10.0).contains(v)));
    assert_eq!((x[0], x[49]), (0.0, 10.0));
    assert_eq!(y[49], 5.0);
}

#[test]
fn domain_materializes_evenly() {
    let d = Domain::new(0.0, 10.0, 5).unwrap();
    assert_eq!(d.samples(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
}

#[test]
fn models_without_dependents_are_not_exposed() {
    let cfg = yaml(
        r#"
models:
  placeholders:
    members:
      x: ~
      y: ~
  empty: {}
  real:
    members:
      x: ~
      f:
        expr: "x"
        defaults: { x: { min: 0, max: 1, count: 3 } }
"#,
    );
    let session = Session::build(&cfg, &Instantiator::new(), false);
    assert_eq!(session.model_names(), names(&["real"]));
    assert!(session.report().is_empty());
}

#[test]
fn default_parameter_order_is_declaration_order() {
    let cfg = yaml(
        r#"
models:
  surf:
    members:
      x: ~
      y: ~
      f:
        expr: "x * y"
        params: [y, x]
        defaults:
          x: { min: 0, max: 1, count: 3 }
          y: { min: 0, max: 2, count: 4 }
"#,
    );
    let registry = ModelRegistry::load(&cfg, &Instantiator::new());
    let model = registry.get("surf").unwrap();
    let resolution = resolve_model(model, None).unwrap();
    let params: Vec<&str> = resolution.variables[0].params.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(params, vec!["y", "x"]);

    let session = Session::build(&cfg, &Instantiator::new(), false);
    let figure = session.figure("surf").unwrap();
    let row = figure.row("f").unwrap();
    assert_eq!(row.axes, names(&["y", "x"]));
    let Trace::Surface { x, y, z } = &row.trace else {
        panic!("expected a surface");
    };
    assert_eq!((x.len(), y.len()), (4, 3));
    // z[(i, j)] = f(y_i, x_j) = y_i * x_j
    assert_eq!(z[(3, 2)], 2.0);
    assert_eq!(z[(1, 2)], 1.0 * 2.0 / 3.0);
}

#[test]
fn empty_selection_is_idempotent() {
    let mut session = Session::build(&yaml(WAVES), &Instantiator::new(), false);
    let before = session.figure("waves").unwrap();
    let revision = session.revision("waves");

    assert_eq!(session.on_selection_change("waves", Vec::new()), Update::NoChange);
    assert_eq!(session.figure("waves").unwrap(), before);
    assert_eq!(session.revision("waves"), revision);
}

#[test]
fn selection_replaces_rows_in_given_order() {
    let mut session = Session::build(&yaml(WAVES), &Instantiator::new(), false);
    assert_eq!(session.figure("waves").unwrap().variables(), vec!["f", "g"]);

    let update = session.on_selection_change("waves", names(&["g"]));
    assert_eq!(update.figure().unwrap().variables(), vec!["g"]);
    let update = session.on_selection_change("waves", names(&["g", "f"]));
    assert_eq!(update.figure().unwrap().variables(), vec!["g", "f"]);
}

#[test]
fn range_change_leaves_other_rows_untouched() {
    let mut session = Session::build(&yaml(WAVES), &Instantiator::new(), true);
    let g_before = session.figure("waves").unwrap().row("g").cloned();

    let update = session.on_range_change("waves", "f", "x", Domain::new(-5.0, 5.0, 11).unwrap());
    let figure = update.figure().unwrap();
    assert_eq!(figure.row("g").cloned(), g_before);

    let (x, _) = line(figure, "f");
    assert_eq!(x.len(), 11);
    assert_eq!((x[0], x[10]), (-5.0, 5.0));
}

fn failing(_: &ParamGrid) -> Result<ValueGrid, String> {
    Err("division by zero".to_string())
}

fn doubling(grid: &ParamGrid) -> Result<ValueGrid, String> {
    Ok(ValueGrid {
        shape: grid.shape(),
        values: grid.axes()[0].1.iter().map(|v| 2.0 * v).collect(),
    })
}

fn half_broken(name: &str, _entry: &ModelEntry) -> Result<Model, EngineError> {
    let d = Domain::new(0.0, 1.0, 5)?;
    Model::new(
        name,
        vec![
            VariableDescriptor::independent("x"),
            VariableDescriptor::dependent("f", names(&["x"]), Arc::new(failing), vec![("x".into(), d)], "f(x)"),
            VariableDescriptor::dependent("g", names(&["x"]), Arc::new(doubling), vec![("x".into(), d)], "g(x)"),
        ],
    )
}

#[test]
fn failing_row_is_dropped_and_model_stays() {
    let mut instantiator = Instantiator::new();
    instantiator.register("half_broken", half_broken);
    let cfg = yaml("models:\n  hb:\n    target: half_broken\n");

    let (session, views) = build_initial_ui(&cfg, &instantiator, false);
    assert_eq!(session.model_names(), names(&["hb"]));
    assert_eq!(views[0].figure.variables(), vec!["g"]);
    assert_eq!(views[0].issues.len(), 1);
    assert!(views[0].issues[0].contains("'hb.f'"));
    assert!(views[0].issues[0].contains("division by zero"));
    // Both variables keep their checklist entry.
    assert_eq!(views[0].equations.len(), 2);
}

#[test]
fn failed_range_recompute_keeps_previous_figure() {
    let mut instantiator = Instantiator::new();
    instantiator.register("half_broken", half_broken);
    let cfg = yaml("models:\n  hb:\n    target: half_broken\n");
    let mut session = Session::build(&cfg, &instantiator, false);
    let before = session.figure("hb").unwrap();

    let update = session.on_range_change("hb", "f", "x", Domain::new(0.0, 2.0, 7).unwrap());
    assert!(matches!(update, Update::Failed(_)));
    assert_eq!(session.figure("hb").unwrap(), before);
}

#[test]
fn subscriptions_capture_their_own_model() {
    let cfg = yaml(
        r#"
models:
  a:
    members:
      x: ~
      f: { expr: "x", defaults: { x: { min: 0, max: 1, count: 3 } } }
      g: { expr: "-x", defaults: { x: { min: 0, max: 1, count: 3 } } }
  b:
    members:
      x: ~
      f: { expr: "x", defaults: { x: { min: 0, max: 1, count: 3 } } }
      g: { expr: "-x", defaults: { x: { min: 0, max: 1, count: 3 } } }
"#,
    );
    let mut session = Session::build(&cfg, &Instantiator::new(), false);
    let b_before = session.figure("b").unwrap();
    let b_revision = session.revision("b");

    let (graph, update) = session
        .dispatch(&ControlId::checklist("a"), &UiEvent::Checklist(names(&["g"])))
        .unwrap();
    assert_eq!(graph, GraphId::Model("a".into()));
    assert_eq!(update.figure().unwrap().variables(), vec!["g"]);
    assert_eq!(session.figure("b").unwrap(), b_before);
    assert_eq!(session.revision("b"), b_revision);

    // Same variable and parameter names, different models.
    let (graph, _) = session
        .dispatch(&ControlId::point_count("b", "f", "x"), &UiEvent::PointCount(9))
        .unwrap();
    assert_eq!(graph, GraphId::Model("b".into()));
    let (bx, _) = line(&session.figure("b").unwrap(), "f");
    assert_eq!(bx.len(), 9);
    assert!(session.figure("a").unwrap().row("f").is_none());
}

#[test]
fn literal_overrides_are_used_verbatim() {
    let cfg = yaml(
        r#"
models:
  lit:
    members:
      x: ~
      f: { expr: "x + 1" }
    plot:
      f: { x: [3, 1, 2] }
"#,
    );
    let session = Session::build(&cfg, &Instantiator::new(), false);
    let (x, y) = line(&session.figure("lit").unwrap(), "f");
    assert_eq!(x, vec![3.0, 1.0, 2.0]);
    assert_eq!(y, vec![4.0, 2.0, 3.0]);
}

#[test]
fn resolution_failures_exclude_only_their_model() {
    let cfg = yaml(
        r#"
models:
  nodefaults:
    members:
      x: ~
      f: { expr: "x" }
  badplot:
    members:
      x: ~
      f: { expr: "x", defaults: { x: { min: 0, max: 1, count: 3 } } }
    plot:
      h: ~
  ok:
    members:
      x: ~
      f: { expr: "x", defaults: { x: { min: 0, max: 1, count: 3 } } }
"#,
    );
    let session = Session::build(&cfg, &Instantiator::new(), false);
    assert_eq!(session.model_names(), names(&["ok"]));
    let failures = &session.report().failures;
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| matches!(f, EngineError::ConfigResolution { .. })));
}

#[test]
fn oversized_counts_fail_without_touching_the_session() {
    let mut session = Session::build(&yaml(WAVES), &Instantiator::new(), true);
    let before = session.figure("waves").unwrap();
    let revision = session.revision("waves");

    let (_, update) = session
        .dispatch(&ControlId::point_count("waves", "f", "x"), &UiEvent::PointCount(usize::MAX))
        .unwrap();
    assert!(matches!(update, Update::Failed(_)));

    // 50 points now, so the ceiling is 500 on every path.
    let update = session.on_range_change("waves", "f", "x", Domain::new(0.0, 10.0, 501).unwrap());
    assert!(matches!(update, Update::Failed(_)));
    assert_eq!(session.figure("waves").unwrap(), before);
    assert_eq!(session.revision("waves"), revision);

    let update = session.on_range_change("waves", "f", "x", Domain::new(0.0, 10.0, 500).unwrap());
    assert_eq!(update.figure().unwrap().row("f").unwrap().trace.len(), 500);
}
