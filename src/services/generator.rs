//! Instance generation
//!
//! Expands a template into its concrete occurrences for a date range. Output
//! is deterministic and ordered by start time, so re-querying with the same
//! arguments re-displays identically and cache keys stay stable.
//!
//! Expansion is bounded in two ways at once, whichever is hit first: a
//! forward horizon measured from "now" and a hard cap on emitted instances.
//! Open-ended recurring templates would otherwise expand without limit;
//! callers needing occurrences past the horizon re-query with a later range.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::instance::{instance_id, EventInstance, InstanceOverride, InstanceStatus};
use crate::models::template::{EventTemplate, Schedule};
use crate::utils::clock::Clock;
use crate::utils::errors::{CadenzaError, Result};

pub const DEFAULT_HORIZON_DAYS: i64 = 90;
pub const DEFAULT_MAX_INSTANCES: usize = 100;

/// Resolve a wall-clock date and time in a timezone.
///
/// The time-of-day is anchored to the organizer's timezone rather than a
/// fixed UTC offset, so 14:00 local stays 14:00 local on both sides of a DST
/// transition. A time falling inside a spring-forward gap shifts ahead one
/// hour; an ambiguous fall-back time takes the earlier offset.
pub(crate) fn resolve_local_datetime(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Tz>> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| {
                CadenzaError::InvalidInput(format!("unresolvable local time {naive} in {tz}"))
            }),
    }
}

/// Expands templates into bounded, ordered occurrence sequences
pub struct InstanceGenerator {
    horizon_days: i64,
    max_instances: usize,
    clock: Arc<dyn Clock>,
}

impl InstanceGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(clock, DEFAULT_HORIZON_DAYS, DEFAULT_MAX_INSTANCES)
    }

    pub fn with_limits(clock: Arc<dyn Clock>, horizon_days: i64, max_instances: usize) -> Self {
        Self {
            horizon_days,
            max_instances,
            clock,
        }
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    /// Expand `template` into instances whose (organizer-local) date falls in
    /// `[range_start, range_end]`, skipping individually cancelled
    /// occurrences.
    pub fn generate(
        &self,
        template: &EventTemplate,
        range_start: NaiveDate,
        range_end: NaiveDate,
        overrides: &HashMap<String, InstanceOverride>,
    ) -> Result<Vec<EventInstance>> {
        let tz = template.tz()?;
        let horizon_end = self.clock.now() + Duration::days(self.horizon_days);

        let instances = match &template.schedule {
            Schedule::FixedOccurrence {
                start,
                duration_minutes,
            } => self.generate_fixed(
                template,
                tz,
                *start,
                *duration_minutes,
                range_start,
                range_end,
                horizon_end,
                overrides,
            ),
            Schedule::RecurringSeries { pattern } => {
                let mut out = Vec::new();
                let from = range_start.max(pattern.start_date);
                let until = match pattern.end_date {
                    Some(end_date) => range_end.min(end_date),
                    None => range_end,
                };

                let mut day = from;
                while day <= until {
                    if pattern.occurs_on(day.weekday()) {
                        let local = resolve_local_datetime(tz, day, pattern.time_of_day)?;
                        let start = local.with_timezone(&Utc);
                        if start > horizon_end {
                            break;
                        }

                        let id = instance_id(template.id, start);
                        let cancelled = overrides
                            .get(&id)
                            .map(|record| record.is_cancelled)
                            .unwrap_or(false);
                        if !cancelled {
                            out.push(EventInstance {
                                id,
                                template_id: template.id,
                                start,
                                end: start + pattern.duration(),
                                status: InstanceStatus::Scheduled,
                            });
                            if out.len() >= self.max_instances {
                                break;
                            }
                        }
                    }
                    match day.succ_opt() {
                        Some(next) => day = next,
                        None => break,
                    }
                }
                out
            }
        };

        debug!(
            template_id = template.id,
            count = instances.len(),
            "Instances generated"
        );
        Ok(instances)
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_fixed(
        &self,
        template: &EventTemplate,
        tz: Tz,
        start: DateTime<Utc>,
        duration_minutes: i64,
        range_start: NaiveDate,
        range_end: NaiveDate,
        horizon_end: DateTime<Utc>,
        overrides: &HashMap<String, InstanceOverride>,
    ) -> Vec<EventInstance> {
        let local_date = start.with_timezone(&tz).date_naive();
        if local_date < range_start || local_date > range_end || start > horizon_end {
            return Vec::new();
        }

        let id = instance_id(template.id, start);
        let cancelled = overrides
            .get(&id)
            .map(|record| record.is_cancelled)
            .unwrap_or(false);
        if cancelled {
            return Vec::new();
        }

        vec![EventInstance {
            id,
            template_id: template.id,
            start,
            end: start + Duration::minutes(duration_minutes),
            status: InstanceStatus::Scheduled,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pattern::RecurrencePattern;
    use crate::utils::clock::FixedClock;
    use chrono::Weekday;

    fn template_with_pattern(pattern: RecurrencePattern, timezone: &str) -> EventTemplate {
        EventTemplate {
            id: 1,
            owner_id: 10,
            title: "Weekly class".to_string(),
            description: None,
            schedule: Schedule::RecurringSeries { pattern },
            capacity: 0,
            timezone: timezone.to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn generator_at(now: &str) -> InstanceGenerator {
        let now = now.parse::<DateTime<Utc>>().unwrap();
        InstanceGenerator::new(Arc::new(FixedClock::new(now)))
    }

    #[test]
    fn test_weekday_fidelity() {
        let pattern = RecurrencePattern {
            weekdays: vec![Weekday::Tue, Weekday::Thu],
            time_of_day: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: None,
            duration_minutes: 45,
        };
        let template = template_with_pattern(pattern, "Europe/Berlin");
        let generator = generator_at("2025-06-01T00:00:00Z");

        let instances = generator
            .generate(
                &template,
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                &HashMap::new(),
            )
            .unwrap();

        assert!(!instances.is_empty());
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        for instance in &instances {
            let weekday = instance.start.with_timezone(&tz).weekday();
            assert!(weekday == Weekday::Tue || weekday == Weekday::Thu);
        }
    }

    #[test]
    fn test_cancelled_override_skipped() {
        let pattern = RecurrencePattern {
            weekdays: vec![Weekday::Mon],
            time_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            end_date: None,
            duration_minutes: 60,
        };
        let template = template_with_pattern(pattern, "UTC");
        let generator = generator_at("2025-06-01T00:00:00Z");
        let range_start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let range_end = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();

        let all = generator
            .generate(&template, range_start, range_end, &HashMap::new())
            .unwrap();
        assert_eq!(all.len(), 3);

        let mut record = InstanceOverride::new(template.id, all[1].id.clone());
        record.is_cancelled = true;
        let overrides = HashMap::from([(all[1].id.clone(), record)]);

        let remaining = generator
            .generate(&template, range_start, range_end, &overrides)
            .unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|instance| instance.id != all[1].id));
    }

    #[test]
    fn test_fixed_occurrence_in_range() {
        let start = "2025-06-10T18:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let template = EventTemplate {
            id: 2,
            owner_id: 10,
            title: "One-off".to_string(),
            description: None,
            schedule: Schedule::FixedOccurrence {
                start,
                duration_minutes: 90,
            },
            capacity: 5,
            timezone: "UTC".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let generator = generator_at("2025-06-01T00:00:00Z");

        let instances = generator
            .generate(
                &template,
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                &HashMap::new(),
            )
            .unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].start, start);
        assert_eq!(instances[0].end, start + Duration::minutes(90));

        let outside = generator
            .generate(
                &template,
                NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
                &HashMap::new(),
            )
            .unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let pattern = RecurrencePattern {
            weekdays: vec![Weekday::Mon],
            time_of_day: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            end_date: None,
            duration_minutes: 60,
        };
        let template = template_with_pattern(pattern, "Mars/Olympus_Mons");
        let generator = generator_at("2025-06-01T00:00:00Z");

        let result = generator.generate(
            &template,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
            &HashMap::new(),
        );
        assert!(matches!(result, Err(CadenzaError::UnknownTimezone(_))));
    }
}
