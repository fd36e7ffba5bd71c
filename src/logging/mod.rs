/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod config;
pub mod middleware;

pub use config::{LogLevel, LoggingConfig};

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system.
///
/// The returned guards flush the background writers; keep them alive until shutdown.
pub fn init(config: &LoggingConfig) -> Vec<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&config.dir) {
        eprintln!("Cannot create log directory {}: {}", config.dir.display(), e);
    }

    // File appender for all logs
    let (file_writer, file_guard) = non_blocking(rolling::daily(&config.dir, "app.log"));

    // File appender for errors only
    let (error_writer, error_guard) = non_blocking(rolling::daily(&config.dir, "error.log"));

    // Console writer
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.is_production() {
        // JSON everywhere in production
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!(
            "Logging initialized for {} environment at level {}",
            config.environment,
            config.level
        ),
        Err(e) => eprintln!("Logging already initialized: {}", e),
    }

    vec![file_guard, error_guard, console_guard]
}
