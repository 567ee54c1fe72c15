//! Tracing subscriber setup.
//!
//! The terminal viewer owns the screen, so it logs to a file under the
//! local data directory. The one-shot subcommands log to stderr.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::error::LoggingError;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Non-blocking writes to `pagemark.log` in the given directory.
    File(PathBuf),
    Stderr,
}

/// `<data_local_dir>/pagemark/logs`, if the platform has a data dir.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pagemark").join("logs"))
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// Returns the appender's worker guard for file logging; it must be held
/// until exit or buffered lines are lost.
pub fn init(target: LogTarget, verbose: bool) -> Result<Option<WorkerGuard>, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    match target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir).map_err(|source| LoggingError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::never(&dir, "pagemark.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()
                .map_err(|_| LoggingError::AlreadyInstalled)?;
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .map_err(|_| LoggingError::AlreadyInstalled)?;
            Ok(None)
        }
    }
}

/// Run `f` with a temporary stderr subscriber that shows warnings.
///
/// Config loading happens before the real subscriber exists (its level
/// depends on the config), so its warnings would otherwise be dropped.
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}
