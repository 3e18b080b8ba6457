//! Tracing setup: compact stdout output plus a daily-rotating log file.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber.
///
/// Writes human-readable logs to stdout and a daily-rotated `crawler.log`
/// under `<log_dir>/logs/`. `RUST_LOG` controls filtering (default `info`).
///
/// # Panics
/// Panics if a subscriber is already installed.
pub fn init<P: AsRef<Path>>(log_dir: P) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = log_dir.as_ref().join("logs");
    std::fs::create_dir_all(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let file_appender = tracing_appender::rolling::daily(&log_path, "crawler.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter.clone());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    // The writer guard must outlive the process; leaking it keeps the
    // background flusher alive without threading it through main.
    Box::leak(Box::new(guard));

    tracing::debug!("logging initialized under {}", log_path.display());
    Ok(())
}
