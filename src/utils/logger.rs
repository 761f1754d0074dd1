//! Logging initialization and configuration.
//!
//! Logs are written to files in the `logs/` directory so that stdout stays
//! clean for the JSON result the CLI prints. Each run creates a new log
//! file with a timestamp, e.g. `logs/kubepilot.2026-08-04-14-30-25.log`.
//!
//! # Configuration
//!
//! The log level can be controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs (default)
//! - `RUST_LOG=warn` - Show warnings and errors only
//! - `RUST_LOG=error` - Show errors only

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system.
///
/// Sets up file-based logging with a unique file per run. The log directory
/// lives next to the executable, falling back to the working directory.
pub fn init_logging() {
    let log_dir = match std::env::current_exe() {
        Ok(exe_path) => exe_path
            .parent()
            .map(|p| p.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs")),
        Err(_) => PathBuf::from("logs"),
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return;
    }

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_path = log_dir.join(format!("kubepilot.{}.log", timestamp));

    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return;
        }
    };

    // Use non-blocking writer so logging never stalls request handling
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // We intentionally leak the _guard to keep the non-blocking writer alive
    // for the entire program lifetime. This is acceptable for a main application.
    std::mem::forget(_guard);

    tracing::info!("Logging initialized - writing to {}", log_path.display());
}
