//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Cadenza engine.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard must stay alive for the lifetime of the process,
/// otherwise buffered log lines are lost on shutdown.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "cadenza.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the outcome of a registration attempt with structured data
pub fn log_registration_outcome(
    template_id: i64,
    instance_id: Option<&str>,
    attendee_id: i64,
    outcome: &str,
) {
    info!(
        template_id = template_id,
        instance_id = instance_id,
        attendee_id = attendee_id,
        outcome = outcome,
        "Registration attempt completed"
    );
}
