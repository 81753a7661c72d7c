//! Registration coordination
//!
//! Entry point for registration attempts. The coordinator resolves the
//! effective capacity, enforces the instance-linkage invariant, refuses
//! cancelled occurrences, and delegates the capacity check to the store's
//! atomic check-and-increment. The attendee count cache is consulted only
//! for display reads; the authoritative count always comes from the store
//! inside the write transaction.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::repositories::{OverrideStore, RegistrationStore, TemplateStore};
use crate::models::instance::{instance_id, parse_instance_id};
use crate::models::pattern::RecurrencePattern;
use crate::models::registration::{CreateRegistrationRequest, Registration};
use crate::models::template::{EventTemplate, Schedule};
use crate::services::cache::AttendeeCountCache;
use crate::services::generator::{resolve_local_datetime, DEFAULT_HORIZON_DAYS};
use crate::utils::clock::Clock;
use crate::utils::errors::{CadenzaError, Result};
use crate::utils::logging::log_registration_outcome;

pub struct RegistrationCoordinator {
    templates: Arc<dyn TemplateStore>,
    overrides: Arc<dyn OverrideStore>,
    registrations: Arc<dyn RegistrationStore>,
    cache: Arc<AttendeeCountCache>,
    clock: Arc<dyn Clock>,
    horizon_days: i64,
}

impl RegistrationCoordinator {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        overrides: Arc<dyn OverrideStore>,
        registrations: Arc<dyn RegistrationStore>,
        cache: Arc<AttendeeCountCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            overrides,
            registrations,
            cache,
            clock,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    pub fn with_horizon(mut self, horizon_days: i64) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    /// Register an attendee on a template, or on one instance of a recurring
    /// template. On success the cache entry for the affected occurrence is
    /// invalidated before the result is returned.
    pub async fn register(
        &self,
        template_id: i64,
        instance_id_arg: Option<&str>,
        attendee_id: i64,
    ) -> Result<Registration> {
        let template = self
            .templates
            .find_by_id(template_id)
            .await?
            .ok_or(CadenzaError::TemplateNotFound { template_id })?;

        if !template.is_active {
            return Err(CadenzaError::SlotUnavailable);
        }

        // Resolve linkage, cancellation, and effective capacity per variant,
        // all before any store write.
        let (linked_instance, cache_key, capacity) = match &template.schedule {
            Schedule::FixedOccurrence { start, .. } => {
                if instance_id_arg.is_some() {
                    return Err(CadenzaError::InvalidInput(
                        "fixed-date templates do not take an instance id".to_string(),
                    ));
                }
                let key = instance_id(template.id, *start);
                let capacity = self.effective_capacity(&template, &key).await?;
                (None, key, capacity)
            }
            Schedule::RecurringSeries { pattern } => {
                let id = instance_id_arg.ok_or_else(|| {
                    CadenzaError::InvalidInput(
                        "recurring templates require an instance id".to_string(),
                    )
                })?;
                self.verify_instance(&template, pattern, id)?;
                let capacity = self.effective_capacity(&template, id).await?;
                (Some(id.to_string()), id.to_string(), capacity)
            }
        };

        let request = CreateRegistrationRequest {
            template_id,
            instance_id: linked_instance,
            attendee_id,
        };
        let registration = self
            .registrations
            .register_if_capacity(&request, capacity)
            .await?;

        self.cache.invalidate(&cache_key);
        log_registration_outcome(template_id, instance_id_arg, attendee_id, "confirmed");
        Ok(registration)
    }

    /// Cancel a registration and invalidate the affected count
    pub async fn cancel(&self, registration_id: Uuid) -> Result<Registration> {
        let registration = self.registrations.cancel(registration_id).await?;

        match &registration.instance_id {
            Some(id) => self.cache.invalidate(id),
            None => {
                // Fixed-date template, derive the cache key from its start
                match self.templates.find_by_id(registration.template_id).await? {
                    Some(template) => {
                        if let Schedule::FixedOccurrence { start, .. } = template.schedule {
                            self.cache.invalidate(&instance_id(template.id, start));
                        }
                    }
                    None => warn!(
                        template_id = registration.template_id,
                        "Cancelled registration references a missing template"
                    ),
                }
            }
        }

        log_registration_outcome(
            registration.template_id,
            registration.instance_id.as_deref(),
            registration.attendee_id,
            "cancelled",
        );
        Ok(registration)
    }

    /// Current confirmed count for display, served through the cache.
    ///
    /// A miss or an expired entry falls back to a direct recount and
    /// refreshes the cache; it is never an error.
    pub async fn attendee_count(
        &self,
        template_id: i64,
        instance_id_arg: Option<&str>,
    ) -> Result<i64> {
        let key = match instance_id_arg {
            Some(id) => id.to_string(),
            None => {
                let template = self
                    .templates
                    .find_by_id(template_id)
                    .await?
                    .ok_or(CadenzaError::TemplateNotFound { template_id })?;
                match template.schedule {
                    Schedule::FixedOccurrence { start, .. } => instance_id(template.id, start),
                    Schedule::RecurringSeries { .. } => {
                        return Err(CadenzaError::InvalidInput(
                            "recurring templates require an instance id".to_string(),
                        ))
                    }
                }
            }
        };

        if let Some(count) = self.cache.get(&key) {
            debug!(instance_id = %key, count = count, "Attendee count served from cache");
            return Ok(count);
        }

        // Snapshot the generation before recounting; if a registration lands
        // and invalidates the key while the recount is in flight, this
        // populate is discarded rather than masking the write.
        let generation = self.cache.generation(&key);
        let count = self
            .registrations
            .count_confirmed(template_id, instance_id_arg)
            .await?;
        self.cache.put(&key, count, generation);
        Ok(count)
    }

    /// Per-instance capacity override when one exists, the template's
    /// capacity otherwise. Also refuses individually cancelled occurrences.
    async fn effective_capacity(&self, template: &EventTemplate, key: &str) -> Result<i32> {
        let record = self.overrides.find_by_instance(key).await?;
        if record.as_ref().is_some_and(|r| r.is_cancelled) {
            return Err(CadenzaError::SlotUnavailable);
        }
        Ok(record
            .and_then(|r| r.capacity)
            .unwrap_or(template.capacity))
    }

    /// Check that an instance id names a real occurrence of the template:
    /// same template, start reproducible from the pattern, inside the
    /// pattern's date range and the generation horizon.
    fn verify_instance(
        &self,
        template: &EventTemplate,
        pattern: &RecurrencePattern,
        id: &str,
    ) -> Result<()> {
        let not_found = || CadenzaError::InstanceNotFound {
            instance_id: id.to_string(),
        };

        let (parsed_template_id, start) = parse_instance_id(id).ok_or_else(not_found)?;
        if parsed_template_id != template.id {
            return Err(not_found());
        }

        let tz = template.tz()?;
        let local = start.with_timezone(&tz);
        let local_date = local.date_naive();

        if !pattern.occurs_on(local_date.weekday()) {
            return Err(not_found());
        }
        if local_date < pattern.start_date {
            return Err(not_found());
        }
        if pattern.end_date.is_some_and(|end| local_date > end) {
            return Err(not_found());
        }

        let expected = resolve_local_datetime(tz, local_date, pattern.time_of_day)?;
        if expected.with_timezone(&Utc) != start {
            return Err(not_found());
        }

        if start > self.clock.now() + Duration::days(self.horizon_days) {
            return Err(not_found());
        }

        Ok(())
    }
}
