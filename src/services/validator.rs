//! Recurrence pattern validation
//!
//! Validation collects every violation instead of stopping at the first one,
//! so an organizer sees all problems with a pattern at once.

use chrono::Weekday;

use crate::models::pattern::{RecurrencePattern, Violation};
use crate::utils::errors::{CadenzaError, Result};

/// Minutes between two occurrences on the same weekday
const SAME_WEEKDAY_GAP_MINUTES: i64 = 7 * 24 * 60;

/// Outcome of validating a recurrence pattern
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Convert into a `Result`, failing with `InvalidPattern` when any
    /// violation was recorded
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(CadenzaError::InvalidPattern {
                violations: self.violations,
            })
        }
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }
}

/// Validates recurrence patterns before they are persisted or expanded.
/// Side-effect free.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternValidator;

impl PatternValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, pattern: &RecurrencePattern) -> ValidationResult {
        let mut result = ValidationResult::default();

        if pattern.weekdays.is_empty() {
            result.push("weekdays", "at least one weekday is required");
        }

        if has_duplicates(&pattern.weekdays) {
            result.push("weekdays", "weekday set contains duplicates");
        }

        if pattern.duration_minutes <= 0 {
            result.push("duration_minutes", "duration must be greater than zero");
        } else if pattern.duration_minutes >= SAME_WEEKDAY_GAP_MINUTES {
            result.push(
                "duration_minutes",
                "duration would overlap the next occurrence on the same weekday",
            );
        }

        if let Some(end_date) = pattern.end_date {
            if end_date < pattern.start_date {
                result.push("end_date", "end date must not be before start date");
            }
        }

        result
    }
}

fn has_duplicates(weekdays: &[Weekday]) -> bool {
    let mut seen = [false; 7];
    for weekday in weekdays {
        let idx = weekday.num_days_from_monday() as usize;
        if seen[idx] {
            return true;
        }
        seen[idx] = true;
    }
    false
}
