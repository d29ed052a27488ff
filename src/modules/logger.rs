use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::get_data_dir;
use crate::error::AppResult;

pub fn get_log_dir() -> AppResult<PathBuf> {
    let log_dir = get_data_dir()?.join("logs");

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    Ok(log_dir)
}

/// Initialize logger system
///
/// Console always; daily rolling file under the data dir when `file_logging`.
pub fn init_logger(file_logging: bool) {
    // Capture log macro logs
    let _ = tracing_log::LogTracer::init();

    // Console output layer
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // Default to INFO and above
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = if file_logging {
        match get_log_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                eprintln!("Failed to initialize log directory: {}", e);
                None
            }
        }
    } else {
        None
    };

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "relay.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // File output layer (no ANSI)
            let file_layer = fmt::Layer::new()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);

            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .with(file_layer)
                .try_init();

            // The writer must outlive every log call
            std::mem::forget(guard);
            info!("Logger system initialized (Console + File Persistence)");
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();
            info!("Logger system initialized (Console)");
        }
    }
}
