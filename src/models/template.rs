//! Event template model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::pattern::RecurrencePattern;
use crate::utils::errors::{CadenzaError, Result};

/// How a template schedules its occurrences.
///
/// Modelled as a tagged variant rather than an `is_recurring` flag so that
/// instance resolution is handled exhaustively per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    FixedOccurrence {
        start: DateTime<Utc>,
        duration_minutes: i64,
    },
    RecurringSeries {
        pattern: RecurrencePattern,
    },
}

impl Schedule {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Schedule::RecurringSeries { .. })
    }
}

/// The persisted master event record, owned and mutated only by its organizer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventTemplate {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub schedule: Schedule,
    /// Seats per occurrence, 0 means unlimited
    pub capacity: i32,
    /// IANA timezone name the pattern's time-of-day is anchored to
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventTemplate {
    /// Parse the organizer timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| CadenzaError::UnknownTimezone(self.timezone.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub schedule: Schedule,
    pub capacity: i32,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<Schedule>,
    pub capacity: Option<i32>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}
