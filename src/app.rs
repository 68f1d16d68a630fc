//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into one `AppConfig`
//! - installs logging
//! - loads the model catalogue and builds a `Session`
//! - hands the session to a front-end (TUI, ASCII renderer, listing)

use std::fmt::Write as _;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, GlobalArgs, RenderArgs};
use crate::domain::{AppConfig, LogTarget, VariableKind};
use crate::error::AppError;
use crate::models::Instantiator;

pub mod session;
pub mod view;

pub use session::*;
pub use view::*;

/// Entry point for the `kview` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);
    let config = app_config(&cli.global, &command);
    let _log = crate::logging::init(&config.log_level, &config.log_target)?;

    let models = crate::io::read_models_config(&config.config_path)?;
    let instantiator = Instantiator::new();
    let session = Session::build(&models, &instantiator, config.parallel);
    info!(models = session.len(), "session built");

    match command {
        Command::Tui => crate::tui::run(session),
        Command::Render(args) => {
            print!("{}", render_session(&session, args.model.as_deref(), &config)?);
            Ok(())
        }
        Command::List => {
            print!("{}", list_session(&session));
            Ok(())
        }
    }
}

/// Build the runtime configuration from parsed flags.
pub fn app_config(global: &GlobalArgs, command: &Command) -> AppConfig {
    let log_target = match (&global.log_file, command) {
        (Some(path), _) => LogTarget::File(path.clone()),
        // Stderr would draw over the alternate screen.
        (None, Command::Tui) => LogTarget::Off,
        (None, _) => LogTarget::Stderr,
    };
    let (plot_width, plot_height) = match command {
        Command::Render(RenderArgs { width, height, .. }) => (*width, *height),
        _ => (72, 16),
    };

    AppConfig {
        config_path: global.config.clone(),
        log_level: global.log_level.clone(),
        log_target,
        parallel: !global.sequential,
        plot_width,
        plot_height,
    }
}

/// ASCII plots of every model's current figure (or just `only`).
pub fn render_session(session: &Session, only: Option<&str>, config: &AppConfig) -> Result<String, AppError> {
    let views = session.build_initial_ui();
    if let Some(name) = only {
        if !views.iter().any(|v| v.model == name) {
            return Err(AppError::new(2, format!("Unknown model '{name}'")));
        }
    }

    let mut out = String::new();
    for view in views.iter().filter(|v| only.is_none_or(|name| v.model == name)) {
        let _ = writeln!(out, "== {} ==", view.model);
        for eq in view.equations.iter().filter(|e| e.checked) {
            let _ = writeln!(out, "  {}", eq.expression);
        }
        for row in &view.figure.rows {
            out.push_str(&crate::plot::render_ascii_row(row, config.plot_width, config.plot_height));
        }
        for issue in &view.issues {
            let _ = writeln!(out, "! {issue}");
        }
        out.push('\n');
    }
    for failure in &session.report().failures {
        let _ = writeln!(out, "! {failure}");
    }
    Ok(out)
}

/// Models, their variables, and load problems.
pub fn list_session(session: &Session) -> String {
    let mut out = String::new();
    for name in session.model_names() {
        let Some(state) = session.state(&name) else {
            continue;
        };
        let _ = writeln!(out, "{name}");
        for var in state.model().variables() {
            match var.kind {
                VariableKind::Independent => {
                    let _ = writeln!(out, "  {:<12} independent", var.name);
                }
                VariableKind::Dependent => {
                    let mark = if state.selection().is_selected(&var.name) { "*" } else { " " };
                    let _ = writeln!(
                        out,
                        "{mark} {:<12} dependent({}) {}",
                        var.name,
                        var.params.join(", "),
                        var.display
                    );
                }
            }
        }
        for issue in state.failures() {
            let _ = writeln!(out, "  ! {issue}");
        }
    }
    for failure in &session.report().failures {
        let _ = writeln!(out, "! {failure}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::ModelsConfig;

    fn global(log_file: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            config: PathBuf::from("kview.yaml"),
            log_level: "info".to_string(),
            log_file: log_file.map(PathBuf::from),
            sequential: false,
        }
    }

    #[test]
    fn tui_logs_nowhere_unless_asked() {
        assert_eq!(app_config(&global(None), &Command::Tui).log_target, LogTarget::Off);
        assert_eq!(app_config(&global(None), &Command::List).log_target, LogTarget::Stderr);
        assert_eq!(
            app_config(&global(Some("k.log")), &Command::Tui).log_target,
            LogTarget::File(PathBuf::from("k.log"))
        );
    }

    fn session() -> Session {
        let cfg: ModelsConfig = serde_yaml::from_str(
            r#"
models:
  line:
    members:
      x: ~
      f:
        expr: "2 * x"
        defaults: { x: { min: 0, max: 1, count: 5 } }
"#,
        )
        .unwrap();
        Session::build(&cfg, &Instantiator::new(), false)
    }

    #[test]
    fn list_marks_selected_variables() {
        let text = list_session(&session());
        assert!(text.starts_with("line\n"));
        assert!(text.contains("  x            independent"));
        assert!(text.contains("* f            dependent(x) f(x) = 2 * x"));
    }

    #[test]
    fn render_rejects_unknown_model() {
        let s = session();
        let config = app_config(&global(None), &Command::List);
        assert!(render_session(&s, Some("nope"), &config).is_err());
        let text = render_session(&s, None, &config).unwrap();
        assert!(text.starts_with("== line ==\n"));
    }
}
