use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG` / `INFO` / `WARNING` / `ERROR` level name onto an
/// [`EnvFilter`] directive. Unknown names are passed through unchanged.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr; when `log_file` is set, events are also appended to
/// that file without ANSI colours. Falls back to `"warn"` if the level string
/// is not a valid filter.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Inbox discovery ────────────────────────────────────────────────────────────

/// Attempt to locate an export inbox below `base`.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `<base>/data/messages/inbox/`
/// 2. `<base>/messages/inbox/`
/// 3. `<base>/inbox/`
///
/// Returns `None` when none of them exists.
pub fn discover_inbox(base: &Path) -> Option<PathBuf> {
    let candidates = [
        base.join("data").join("messages").join("inbox"),
        base.join("messages").join("inbox"),
        base.join("inbox"),
    ];
    candidates.into_iter().find(|p| p.is_dir())
}

/// The inbox to analyse: the explicit `--inbox` value, or one discovered under
/// the current directory.
pub fn resolve_inbox(explicit: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let cwd = std::env::current_dir()?;
    discover_inbox(&cwd).ok_or_else(|| {
        anyhow::anyhow!(
            "no inbox found under {}; pass --inbox <PATH>",
            cwd.display()
        )
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
