//! Error handling for Cadenza
//!
//! This module defines the main error types used throughout the engine
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

use crate::models::pattern::Violation;

/// Main error type for the Cadenza scheduling engine
#[derive(Error, Debug)]
pub enum CadenzaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid recurrence pattern: {} violation(s)", violations.len())]
    InvalidPattern { violations: Vec<Violation> },

    #[error("Template not found: {template_id}")]
    TemplateNotFound { template_id: i64 },

    #[error("Instance not found: {instance_id}")]
    InstanceNotFound { instance_id: String },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: Uuid },

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Capacity exceeded for template {template_id}")]
    CapacityExceeded { template_id: i64 },

    #[error("Transaction conflict, caller should retry")]
    TransactionConflict,

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Cadenza operations
pub type Result<T> = std::result::Result<T, CadenzaError>;

impl CadenzaError {
    /// Check if the error is a legitimate business outcome rather than a fault.
    ///
    /// Business outcomes are surfaced to the caller as-is and are never
    /// retried automatically by the engine.
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            CadenzaError::InvalidPattern { .. }
                | CadenzaError::SlotUnavailable
                | CadenzaError::CapacityExceeded { .. }
                | CadenzaError::InstanceNotFound { .. }
        )
    }

    /// Check if the error is recoverable by retrying the request
    pub fn is_recoverable(&self) -> bool {
        match self {
            CadenzaError::Database(_) => false,
            CadenzaError::Migration(_) => false,
            CadenzaError::Config(_) => false,
            CadenzaError::InvalidPattern { .. } => false,
            CadenzaError::TemplateNotFound { .. } => false,
            CadenzaError::InstanceNotFound { .. } => false,
            CadenzaError::RegistrationNotFound { .. } => false,
            CadenzaError::SlotUnavailable => true,
            CadenzaError::CapacityExceeded { .. } => false,
            CadenzaError::TransactionConflict => true,
            CadenzaError::UnknownTimezone(_) => false,
            CadenzaError::Serialization(_) => false,
            CadenzaError::Io(_) => true,
            CadenzaError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CadenzaError::Database(_) => ErrorSeverity::Critical,
            CadenzaError::Migration(_) => ErrorSeverity::Critical,
            CadenzaError::Config(_) => ErrorSeverity::Critical,
            CadenzaError::TransactionConflict => ErrorSeverity::Warning,
            CadenzaError::SlotUnavailable => ErrorSeverity::Info,
            CadenzaError::CapacityExceeded { .. } => ErrorSeverity::Info,
            CadenzaError::InvalidPattern { .. } => ErrorSeverity::Info,
            CadenzaError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
