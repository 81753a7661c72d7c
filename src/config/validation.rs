//! Configuration validation module
//!
//! This module provides validation functions for engine configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{CadenzaError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_scheduling_config(&settings.scheduling)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CadenzaError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(CadenzaError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CadenzaError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate scheduling tunables
fn validate_scheduling_config(config: &super::SchedulingConfig) -> Result<()> {
    if config.horizon_days <= 0 {
        return Err(CadenzaError::Config(
            "Generation horizon must be greater than 0 days".to_string(),
        ));
    }

    if config.max_instances == 0 {
        return Err(CadenzaError::Config(
            "Max instances per generation must be greater than 0".to_string(),
        ));
    }

    if config.cache_ttl_seconds == 0 {
        return Err(CadenzaError::Config(
            "Attendee count cache TTL must be greater than 0 seconds".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CadenzaError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CadenzaError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
