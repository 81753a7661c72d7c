//! Attendee count cache
//!
//! A short-lived, invalidation-aware accelerator mapping an instance id to
//! its current occupancy count. It exists to avoid recounting registrations
//! on every availability display and is never the source of truth: the
//! coordinator always recounts inside its transaction before a
//! capacity-changing write. A miss or an expired entry simply falls back to
//! a direct recount, never an error.
//!
//! Owned explicitly and passed by injection rather than living as a process
//! global, so tests get a fresh cache and a pinned clock.
//!
//! Each key carries a generation counter bumped by `invalidate`. A reader
//! that missed the cache snapshots the generation before its recount and
//! hands it back to `put`; when an invalidation landed in between, the stale
//! populate is discarded instead of resurrecting the pre-write count.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::utils::clock::Clock;

pub const DEFAULT_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    count: i64,
    recorded_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    generations: HashMap<String, u64>,
}

/// TTL cache of per-instance attendee counts
pub struct AttendeeCountCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AttendeeCountCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, DEFAULT_TTL_SECONDS)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl_seconds: u64) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl: Duration::seconds(ttl_seconds as i64),
            clock,
        }
    }

    /// The cached count for an instance, if present and still fresh
    pub fn get(&self, instance_id: &str) -> Option<i64> {
        let state = self.state.lock().unwrap();
        let entry = state.entries.get(instance_id)?;
        if self.clock.now() - entry.recorded_at >= self.ttl {
            return None;
        }
        Some(entry.count)
    }

    /// The current generation for an instance key. Snapshot this before a
    /// recount and pass it to `put`.
    pub fn generation(&self, instance_id: &str) -> u64 {
        let state = self.state.lock().unwrap();
        state.generations.get(instance_id).copied().unwrap_or(0)
    }

    /// Record a freshly computed count, unless the key was invalidated since
    /// `generation` was taken; a populate that raced a write is dropped.
    pub fn put(&self, instance_id: &str, count: i64, generation: u64) {
        let mut state = self.state.lock().unwrap();
        let current = state.generations.get(instance_id).copied().unwrap_or(0);
        if current != generation {
            debug!(instance_id = instance_id, "Stale populate discarded");
            return;
        }
        state.entries.insert(
            instance_id.to_string(),
            CacheEntry {
                count,
                recorded_at: self.clock.now(),
            },
        );
    }

    /// Drop the entry for an instance and bump its generation. Called
    /// synchronously after every successful count-changing write, before that
    /// write's result returns to its caller. The generation bump also covers
    /// keys with no entry yet, so a reader mid-populate cannot reinstate the
    /// pre-write count.
    pub fn invalidate(&self, instance_id: &str) {
        let mut state = self.state.lock().unwrap();
        *state.generations.entry(instance_id.to_string()).or_insert(0) += 1;
        if state.entries.remove(instance_id).is_some() {
            debug!(instance_id = instance_id, "Attendee count invalidated");
        }
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let before = state.entries.len();
        let ttl = self.ttl;
        state.entries.retain(|_, entry| now - entry.recorded_at < ttl);
        before - state.entries.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::FixedClock;

    fn cache_with_clock() -> (AttendeeCountCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let cache = AttendeeCountCache::with_ttl(clock.clone(), 300);
        (cache, clock)
    }

    fn populate(cache: &AttendeeCountCache, key: &str, count: i64) {
        let generation = cache.generation(key);
        cache.put(key, count, generation);
    }

    #[test]
    fn test_put_then_get() {
        let (cache, _clock) = cache_with_clock();
        populate(&cache, "1:1000", 4);
        assert_eq!(cache.get("1:1000"), Some(4));
        assert_eq!(cache.get("1:2000"), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        populate(&cache, "1:1000", 4);

        clock.advance(Duration::seconds(299));
        assert_eq!(cache.get("1:1000"), Some(4));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("1:1000"), None);
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let (cache, _clock) = cache_with_clock();
        populate(&cache, "1:1000", 4);
        cache.invalidate("1:1000");
        assert_eq!(cache.get("1:1000"), None);
    }

    #[test]
    fn test_invalidate_discards_in_flight_populate() {
        let (cache, _clock) = cache_with_clock();

        // a reader misses, snapshots the generation, starts recounting
        let generation = cache.generation("1:1000");
        // a writer lands its invalidation before the reader finishes
        cache.invalidate("1:1000");
        // the reader's now-stale populate must not stick
        cache.put("1:1000", 0, generation);
        assert_eq!(cache.get("1:1000"), None);

        // a populate taken after the invalidation is accepted
        populate(&cache, "1:1000", 1);
        assert_eq!(cache.get("1:1000"), Some(1));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        populate(&cache, "1:1000", 1);
        clock.advance(Duration::seconds(301));
        populate(&cache, "1:2000", 2);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("1:2000"), Some(2));
    }
}
