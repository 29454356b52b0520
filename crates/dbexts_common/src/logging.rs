//! Logging utilities for dbexts.
//!
//! This module provides the tracing setup shared by the dbexts crates and by
//! applications embedding them.

use tracing::{error, info, Level};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

/// Crates whose spans and events are enabled at the requested level.
const DBEXTS_TARGETS: [&str; 3] = ["dbexts_db", "dbexts_config", "dbexts_common"];

/// Initialize the tracing subscriber at the INFO level.
///
/// # Examples
///
/// ```
/// use dbexts_common::logging;
///
/// // Initialize with default log level (INFO)
/// logging::init();
///
/// // Calling again, or with another level, is harmless
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` directives are honoured on top of the level given here. A subscriber that
/// was installed earlier stays in place.
pub fn init_with_level(level: Level) {
    let filter = DBEXTS_TARGETS
        .iter()
        .filter_map(|target| format!("{target}={level}").parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive);

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so the call can sit in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
