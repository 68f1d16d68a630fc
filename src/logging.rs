//! Tracing subscriber setup.
//!
//! `RUST_LOG` directives take precedence over the configured level. File
//! output goes through a non-blocking writer whose guard must outlive the run.

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::domain::LogTarget;
use crate::error::AppError;

/// Keeps buffered file logs flowing until dropped.
#[derive(Debug)]
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber. Call once, before any engine work.
pub fn init(level: &str, target: &LogTarget) -> Result<LogGuard, AppError> {
    let default_level: LevelFilter = level
        .parse()
        .map_err(|e| AppError::new(2, format!("Invalid log level '{level}': {e}")))?;

    let filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    };

    let guard = match target {
        LogTarget::Off => None,
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| AppError::new(4, format!("Failed to install logger: {e}")))?;
            None
        }
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| AppError::new(2, format!("Invalid log file '{}'", path.display())))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| AppError::new(4, format!("Failed to install logger: {e}")))?;
            Some(guard)
        }
    };

    Ok(LogGuard { _guard: guard })
}
