//! Command-line parsing for the model viewer.
//!
//! Argument parsing stays here, separate from the engine; `app` turns the
//! parsed flags into an `AppConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kview", version, about = "Interactive plots of configured function models")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Model catalogue (YAML or JSON).
    #[arg(short, long, env = "KVIEW_CONFIG", default_value = "kview.yaml", global = true)]
    pub config: PathBuf,

    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, env = "KVIEW_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Write logs to this file instead of stderr (the TUI logs nowhere otherwise).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Evaluate figure rows one at a time instead of on the thread pool.
    #[arg(long, global = true)]
    pub sequential: bool,
}

/// CLI subcommands. With none given, `tui` runs.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI.
    Tui,
    /// Print every model's initial figure as ASCII plots.
    Render(RenderArgs),
    /// List models, their variables, and any load problems.
    List,
}

/// Options for ASCII rendering.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Only render this model.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["kview", "--config", "m.json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.config, PathBuf::from("m.json"));
    }

    #[test]
    fn render_flags() {
        let cli = Cli::try_parse_from(["kview", "render", "-m", "wave", "--width", "40", "--sequential"]).unwrap();
        let Some(Command::Render(args)) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.model.as_deref(), Some("wave"));
        assert_eq!(args.width, 40);
        assert!(cli.global.sequential);
    }
}
