//! Working hours configuration model

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::{CadenzaError, Result};

/// Bookable window for one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DayHours {
    pub fn closed() -> Self {
        Self {
            enabled: false,
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
        }
    }
}

/// Per-weekday windows, one field per day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl WeekSchedule {
    pub fn for_weekday(&self, weekday: Weekday) -> &DayHours {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

impl Default for WeekSchedule {
    fn default() -> Self {
        let workday = DayHours {
            enabled: true,
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        Self {
            monday: workday,
            tuesday: workday,
            wednesday: workday,
            thursday: workday,
            friday: workday,
            saturday: DayHours::closed(),
            sunday: DayHours::closed(),
        }
    }
}

/// Per-owner availability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkingHoursConfig {
    pub owner_id: i64,
    #[sqlx(json)]
    pub week: WeekSchedule,
    /// Idle minutes enforced immediately before and after any booked interval
    pub buffer_minutes: i64,
    /// Slot lengths, in minutes, offered to bookers
    pub allowed_durations: Vec<i64>,
    pub allow_weekends: bool,
    /// How many days ahead a slot may be booked
    pub advance_booking_days: i64,
    pub timezone: String,
}

impl WorkingHoursConfig {
    pub fn new(owner_id: i64) -> Self {
        Self {
            owner_id,
            week: WeekSchedule::default(),
            buffer_minutes: 0,
            allowed_durations: vec![30, 60],
            allow_weekends: false,
            advance_booking_days: 60,
            timezone: "UTC".to_string(),
        }
    }

    pub fn day_hours(&self, weekday: Weekday) -> &DayHours {
        self.week.for_weekday(weekday)
    }

    /// Parse the owner timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| CadenzaError::UnknownTimezone(self.timezone.clone()))
    }
}
