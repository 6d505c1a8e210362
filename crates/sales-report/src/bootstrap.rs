use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sales_runtime::report::ReportFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the sales data file looked for when `--input` is not given.
pub const DEFAULT_INPUT_NAME: &str = "car_sales.json";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// The per-user state directory, `~/.sales-report/`.
pub fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sales-report")
}

/// Ensure the standard `~/.sales-report/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.sales-report/`
/// - `~/.sales-report/logs/`
/// - `~/.sales-report/outbox/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let dir = state_dir();
    std::fs::create_dir_all(dir.join("logs"))?;
    std::fs::create_dir_all(dir.join("outbox"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised. Output goes
/// to `log_file` (appending) when given, stderr otherwise.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// Map the CLI level names onto tracing's lowercase level names.
fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

// ── Path discovery ─────────────────────────────────────────────────────────────

/// Locate the sales data file when none was given on the command line.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `./car_sales.json`
/// 2. `~/.sales-report/car_sales.json`
pub fn discover_input() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    discover_input_in(&cwd, &state_dir())
}

/// [`discover_input`] with explicit search roots.
pub fn discover_input_in(cwd: &Path, state_dir: &Path) -> Option<PathBuf> {
    let candidates = [cwd.join(DEFAULT_INPUT_NAME), state_dir.join(DEFAULT_INPUT_NAME)];
    candidates.into_iter().find(|p| p.is_file())
}

/// Default report destination: `cars.<ext>` in the system temp directory.
pub fn default_output(format: ReportFormat) -> PathBuf {
    std::env::temp_dir().join(format!("cars.{}", format.extension()))
}

/// Default outbox for `--mailer=outbox`.
pub fn default_outbox_dir() -> PathBuf {
    state_dir().join("outbox")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
