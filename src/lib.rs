//! Cadenza scheduling engine
//!
//! A recurring event scheduling and availability engine: recurrence pattern
//! validation and bounded expansion into concrete occurrences, free-slot
//! computation against working hours and buffer rules, and capacity-protected
//! registration with a short-lived attendee count cache.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CadenzaError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
