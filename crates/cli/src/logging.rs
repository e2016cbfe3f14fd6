use anyhow::Result;
use shelf_core::tracing::{InstrumentationConfig, init_tracing};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "shelf.log";

/// Initialize logging for the CLI
///
/// Logs go to `<data_dir>/shelf.log`; only warnings and errors reach the
/// terminal so command output stays readable.
pub fn init_logging(log_level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    if no_file_log {
        init_stderr_logging(log_level)
    } else {
        init_file_logging(log_level, data_dir)
    }
}

fn default_filter(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("shelf={level},shelf_core={level},shelf_http={level},shelf_session={level}")
}

fn init_file_logging(level: Level, data_dir: &Path) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    let log_file_path = log_file_path(data_dir);
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr.with_max_level(Level::WARN))
                .with_ansi(true),
        )
        .try_init()?;

    Ok(())
}

fn init_stderr_logging(level: Level) -> Result<()> {
    let mut config = InstrumentationConfig::from_env();
    config.service_name = "shelf-cli".to_string();
    if std::env::var_os("RUST_LOG").is_none() {
        config.log_level = default_filter(level);
    }
    init_tracing(&config)?;
    Ok(())
}

fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}
