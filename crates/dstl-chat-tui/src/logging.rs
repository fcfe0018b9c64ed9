use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use dstl_chat_core::models::ErrorStore;
use dstl_chat_core::services::ErrorCollectorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default log location under the platform data directory.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("dstl-chat").join("dstl-chat.log"))
}

/// Route structured logs to a file (the terminal belongs to the UI) and copy
/// warnings and errors into `errors`.
///
/// `level` takes precedence over `RUST_LOG`; without either the level is `info`.
pub fn init(level: Option<&str>, path: PathBuf, errors: ErrorStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(filter),
        )
        .with(ErrorCollectorLayer::new(errors))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
