//! Availability computation
//!
//! Pure slot calculation for the non-recurring, slot-based booking flow.
//! Always recomputed per query: booked intervals change frequently and a
//! stale availability answer is worse than a slightly slower computation.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::working_hours::WorkingHoursConfig;
use crate::services::generator::resolve_local_datetime;
use crate::utils::errors::Result;
use crate::utils::intervals::Interval;

/// A candidate bookable window, with the allowed durations that fit it.
///
/// Not every allowed duration fits every slot: a slot with 40 free minutes
/// before the next buffered booking can offer a 30-minute option but not a
/// 60-minute one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub durations: Vec<i64>,
}

/// Computes free bookable slots against working hours and buffer rules
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityCalculator;

impl AvailabilityCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Free slots on `date` given the owner's configuration and the already
    /// booked intervals. `now` gates past starts and the advance-booking
    /// horizon.
    pub fn available_slots(
        &self,
        config: &WorkingHoursConfig,
        booked: &[Interval],
        date: NaiveDate,
        allowed_durations: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let tz = config.tz()?;
        let weekday = date.weekday();

        let is_weekend = weekday == Weekday::Sat || weekday == Weekday::Sun;
        if is_weekend && !config.allow_weekends {
            return Ok(Vec::new());
        }

        let day = config.day_hours(weekday);
        if !day.enabled || day.start >= day.end {
            return Ok(Vec::new());
        }

        let today = now.with_timezone(&tz).date_naive();
        if date < today || date > today + Duration::days(config.advance_booking_days) {
            return Ok(Vec::new());
        }

        let Some(granularity) = allowed_durations.iter().copied().filter(|d| *d > 0).min() else {
            return Ok(Vec::new());
        };

        let window_start = resolve_local_datetime(tz, date, day.start)?.with_timezone(&Utc);
        let window_end = resolve_local_datetime(tz, date, day.end)?.with_timezone(&Utc);

        // Candidate starts: the base grid at the smallest allowed duration,
        // plus the first bookable moment after each buffered booking (which
        // rarely lands on the grid).
        let mut candidates = Vec::new();
        let mut start = window_start;
        while start + Duration::minutes(granularity) <= window_end {
            candidates.push(start);
            start += Duration::minutes(granularity);
        }
        for interval in booked {
            let resume = interval.end + Duration::minutes(config.buffer_minutes);
            if resume >= window_start && resume + Duration::minutes(granularity) <= window_end {
                candidates.push(resume);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut slots = Vec::new();
        for start in candidates {
            if start < now {
                continue;
            }
            let durations = self.fitting_durations(
                start,
                window_end,
                allowed_durations,
                config.buffer_minutes,
                booked,
            );
            if !durations.is_empty() {
                slots.push(Slot { start, durations });
            }
        }

        debug!(
            owner_id = config.owner_id,
            date = %date,
            slots = slots.len(),
            "Availability computed"
        );
        Ok(slots)
    }

    /// The subset of allowed durations a candidate start can host: the
    /// buffered candidate interval must stay inside the working window and
    /// clear of every booked interval.
    fn fitting_durations(
        &self,
        start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        allowed_durations: &[i64],
        buffer_minutes: i64,
        booked: &[Interval],
    ) -> Vec<i64> {
        let mut durations: Vec<i64> = allowed_durations
            .iter()
            .copied()
            .filter(|duration| *duration > 0)
            .filter(|duration| start + Duration::minutes(*duration) <= window_end)
            .filter(|duration| {
                let candidate = Interval::new(start, start + Duration::minutes(*duration));
                !candidate.expanded(buffer_minutes).overlaps_any(booked)
            })
            .collect();
        durations.sort_unstable();
        durations.dedup();
        durations
    }
}
