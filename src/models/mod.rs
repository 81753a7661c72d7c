//! Data models module
//!
//! This module contains all data structures used throughout the engine

pub mod instance;
pub mod pattern;
pub mod registration;
pub mod template;
pub mod working_hours;

// Re-export commonly used models
pub use instance::{instance_id, parse_instance_id, EventInstance, InstanceOverride, InstanceStatus};
pub use pattern::{RecurrencePattern, Violation};
pub use registration::{CreateRegistrationRequest, Registration, RegistrationStatus};
pub use template::{CreateTemplateRequest, EventTemplate, Schedule, UpdateTemplateRequest};
pub use working_hours::{DayHours, WeekSchedule, WorkingHoursConfig};
