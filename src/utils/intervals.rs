//! Half-open time interval primitives
//!
//! Shared by the availability calculator and the registration coordinator so
//! both sides agree on what "overlapping" means. Intervals are half-open:
//! `[start, end)`, so back-to-back bookings do not collide.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open UTC time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether two half-open intervals share any point
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The interval widened by `minutes` on both sides
    pub fn expanded(&self, minutes: i64) -> Interval {
        Interval {
            start: self.start - Duration::minutes(minutes),
            end: self.end + Duration::minutes(minutes),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether any interval in `others` overlaps this one
    pub fn overlaps_any(&self, others: &[Interval]) -> bool {
        others.iter().any(|other| self.overlaps(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_overlapping_intervals() {
        let a = Interval::new(at(9, 0), at(10, 0));
        let b = Interval::new(at(9, 30), at(10, 30));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = Interval::new(at(9, 0), at(10, 0));
        let b = Interval::new(at(10, 0), at(11, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_expanded_interval_overlaps_neighbour() {
        let booking = Interval::new(at(10, 0), at(11, 0));
        let candidate = Interval::new(at(9, 0), at(10, 0));
        assert!(!candidate.overlaps(&booking));
        assert!(candidate.expanded(15).overlaps(&booking));
    }

    #[test]
    fn test_duration_minutes() {
        let a = Interval::new(at(9, 0), at(10, 30));
        assert_eq!(a.duration_minutes(), 90);
    }
}
