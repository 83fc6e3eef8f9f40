use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppResult;

/// Log directory, created on demand
pub fn get_log_dir(configured: Option<&Path>) -> AppResult<PathBuf> {
    let log_dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => super::config::get_data_dir()?.join("logs"),
    };

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    Ok(log_dir)
}

/// Initialize logging (console + daily rolling file).
///
/// The returned guard flushes the file writer on drop; hold it for the
/// lifetime of the process. If the log directory cannot be created, only the
/// console layer is installed.
pub fn init_logger(configured_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Capture `log` macro records
    let _ = tracing_log::LogTracer::init();

    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // Default to INFO and above
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match get_log_dir(configured_dir) {
        Ok(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "resource-proxy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::Layer::new()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            (None, None)
        }
    };

    // try_init so a second call (tests) does not panic
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!("Logger initialized");
    guard
}
