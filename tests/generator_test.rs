//! Instance generation properties
//!
//! Covers boundedness, idempotence, weekday fidelity, and wall-clock
//! preservation across DST transitions.

mod helpers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use proptest::prelude::*;

use cadenza::services::InstanceGenerator;
use cadenza::utils::FixedClock;
use helpers::{recurring_template, weekly_pattern};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn june_first() -> DateTime<Utc> {
    "2025-06-01T00:00:00Z".parse().unwrap()
}

fn generator_at(now: DateTime<Utc>) -> InstanceGenerator {
    InstanceGenerator::new(Arc::new(FixedClock::new(now)))
}

#[test]
fn open_ended_pattern_caps_at_max_instances() {
    let pattern = weekly_pattern(
        ALL_WEEKDAYS.to_vec(),
        10,
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    );
    let template = recurring_template(1, pattern, 0, "UTC");
    let generator = generator_at(june_first());

    let instances = generator
        .generate(
            &template,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            &HashMap::new(),
        )
        .unwrap();

    // a daily pattern hits the instance cap before the 90 day horizon
    assert_eq!(instances.len(), 100);
}

#[test]
fn horizon_binds_before_instance_cap_for_sparse_patterns() {
    let pattern = weekly_pattern(
        vec![Weekday::Mon],
        10,
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
    );
    let template = recurring_template(1, pattern, 0, "UTC");
    let now = june_first();
    let generator = generator_at(now);

    let instances = generator
        .generate(
            &template,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            &HashMap::new(),
        )
        .unwrap();

    assert!(instances.len() < 100);
    let horizon_end = now + Duration::days(90);
    for instance in &instances {
        assert!(instance.start <= horizon_end);
    }
}

#[test]
fn dst_transition_preserves_wall_clock_time() {
    // Europe/Berlin springs forward on 2025-03-30
    let pattern = weekly_pattern(
        vec![Weekday::Sun],
        14,
        NaiveDate::from_ymd_opt(2025, 3, 23).unwrap(),
    );
    let template = recurring_template(1, pattern, 0, "Europe/Berlin");
    let generator = generator_at("2025-03-20T00:00:00Z".parse().unwrap());

    let instances = generator
        .generate(
            &template,
            NaiveDate::from_ymd_opt(2025, 3, 23).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
            &HashMap::new(),
        )
        .unwrap();

    assert_eq!(instances.len(), 3);

    let tz: Tz = "Europe/Berlin".parse().unwrap();
    for instance in &instances {
        assert_eq!(instance.start.with_timezone(&tz).hour(), 14);
    }

    // UTC offsets differ across the transition even though local time holds
    assert_eq!(instances[0].start.hour(), 13); // CET, UTC+1
    assert_eq!(instances[1].start.hour(), 12); // CEST, UTC+2
}

#[test]
fn generation_is_ordered_by_start() {
    let pattern = weekly_pattern(
        vec![Weekday::Mon, Weekday::Fri, Weekday::Wed],
        9,
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
    );
    let template = recurring_template(1, pattern, 0, "UTC");
    let generator = generator_at(june_first());

    let instances = generator
        .generate(
            &template,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            &HashMap::new(),
        )
        .unwrap();

    assert!(instances.windows(2).all(|pair| pair[0].start < pair[1].start));
}

proptest! {
    /// For any weekday subset, duration, and hour: generation stays within
    /// both bounds, repeats identically, and only emits configured weekdays.
    #[test]
    fn prop_generation_bounded_idempotent_faithful(
        mask in 1u8..128u8,
        duration in 15i64..240i64,
        hour in 6u32..21u32,
    ) {
        let weekdays: Vec<Weekday> = ALL_WEEKDAYS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, weekday)| *weekday)
            .collect();

        let mut pattern = weekly_pattern(
            weekdays.clone(),
            hour,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        pattern.duration_minutes = duration;
        let template = recurring_template(1, pattern, 0, "Europe/Berlin");

        let now = june_first();
        let generator = generator_at(now);
        let range_start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let range_end = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        let first = generator
            .generate(&template, range_start, range_end, &HashMap::new())
            .unwrap();
        let second = generator
            .generate(&template, range_start, range_end, &HashMap::new())
            .unwrap();

        // restartable: identical ordered output on every call
        prop_assert_eq!(&first, &second);

        prop_assert!(first.len() <= 100);
        let horizon_end = now + Duration::days(90);
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        for instance in &first {
            prop_assert!(instance.start <= horizon_end);
            prop_assert!(weekdays.contains(&instance.start.with_timezone(&tz).weekday()));
            prop_assert_eq!(instance.end - instance.start, Duration::minutes(duration));
        }
    }
}
