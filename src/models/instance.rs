//! Event instance model
//!
//! Instances are a derived projection: one concrete occurrence of a recurring
//! template. They are computed on demand and never stored per occurrence; only
//! per-occurrence exceptions persist, as sparse `InstanceOverride` rows keyed
//! by instance id.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::intervals::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Scheduled,
    Cancelled,
}

/// One concrete occurrence of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInstance {
    pub id: String,
    pub template_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: InstanceStatus,
}

impl EventInstance {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Deterministic instance identifier: template id plus the occurrence start.
///
/// The same template and start time always map to the same id, which is what
/// makes override lookups and cache keys stable across regeneration.
pub fn instance_id(template_id: i64, start: DateTime<Utc>) -> String {
    format!("{}:{}", template_id, start.timestamp())
}

/// Recover the template id and start time from an instance identifier
pub fn parse_instance_id(id: &str) -> Option<(i64, DateTime<Utc>)> {
    let (template_part, ts_part) = id.split_once(':')?;
    let template_id = template_part.parse::<i64>().ok()?;
    let ts = ts_part.parse::<i64>().ok()?;
    let start = Utc.timestamp_opt(ts, 0).single()?;
    Some((template_id, start))
}

/// Organizer-authored exception for a single occurrence: a cancellation
/// and/or a per-instance capacity override
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstanceOverride {
    pub id: Uuid,
    pub template_id: i64,
    pub instance_id: String,
    pub is_cancelled: bool,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl InstanceOverride {
    pub fn new(template_id: i64, instance_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            instance_id,
            is_cancelled: false,
            capacity: None,
            created_at: Utc::now(),
        }
    }
}
