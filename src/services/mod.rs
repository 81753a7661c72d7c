//! Services module
//!
//! This module contains the scheduling engine's business logic services

pub mod availability;
pub mod cache;
pub mod coordinator;
pub mod generator;
pub mod validator;

// Re-export commonly used services
pub use availability::{AvailabilityCalculator, Slot};
pub use cache::AttendeeCountCache;
pub use coordinator::RegistrationCoordinator;
pub use generator::InstanceGenerator;
pub use validator::{PatternValidator, ValidationResult};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::models::instance::{EventInstance, InstanceOverride};
use crate::models::registration::Registration;
use crate::models::template::{
    CreateTemplateRequest, EventTemplate, Schedule, UpdateTemplateRequest,
};
use crate::models::working_hours::WorkingHoursConfig;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::errors::{CadenzaError, Result};
use crate::utils::intervals::Interval;

/// Service factory wiring repositories and engine services together.
///
/// Also carries the public query surface consumed by the API layer; payload
/// formats, authentication, and transport live outside this crate.
#[derive(Clone)]
pub struct ServiceFactory {
    pub validator: PatternValidator,
    pub generator: Arc<InstanceGenerator>,
    pub availability: AvailabilityCalculator,
    pub cache: Arc<AttendeeCountCache>,
    pub coordinator: Arc<RegistrationCoordinator>,
    db: DatabaseService,
    clock: Arc<dyn Clock>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(db: DatabaseService, settings: &Settings) -> Self {
        Self::with_clock(db, settings, Arc::new(SystemClock))
    }

    /// Create a factory on an explicit clock, used by tests to pin time
    pub fn with_clock(db: DatabaseService, settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let scheduling = &settings.scheduling;
        let generator = Arc::new(InstanceGenerator::with_limits(
            clock.clone(),
            scheduling.horizon_days,
            scheduling.max_instances,
        ));
        let cache = Arc::new(AttendeeCountCache::with_ttl(
            clock.clone(),
            scheduling.cache_ttl_seconds,
        ));
        let coordinator = Arc::new(
            RegistrationCoordinator::new(
                Arc::new(db.templates.clone()),
                Arc::new(db.overrides.clone()),
                Arc::new(db.registrations.clone()),
                cache.clone(),
                clock.clone(),
            )
            .with_horizon(scheduling.horizon_days),
        );

        Self {
            validator: PatternValidator::new(),
            generator,
            availability: AvailabilityCalculator::new(),
            cache,
            coordinator,
            db,
            clock,
        }
    }

    /// Create an event template, refusing invalid recurrence patterns
    pub async fn create_template(&self, request: CreateTemplateRequest) -> Result<EventTemplate> {
        self.validate_schedule(&request.schedule)?;
        request
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| CadenzaError::UnknownTimezone(request.timezone.clone()))?;

        let template = self.db.templates.create(request).await?;
        info!(template_id = template.id, "Template created");
        Ok(template)
    }

    /// Update a template; pattern edits are re-validated before persisting
    pub async fn update_template(
        &self,
        template_id: i64,
        request: UpdateTemplateRequest,
    ) -> Result<EventTemplate> {
        if let Some(schedule) = &request.schedule {
            self.validate_schedule(schedule)?;
        }
        self.db.templates.update(template_id, request).await
    }

    /// All instances of a template within the date range
    pub async fn list_instances(
        &self,
        template_id: i64,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<EventInstance>> {
        let template = self
            .db
            .templates
            .find_by_id(template_id)
            .await?
            .ok_or(CadenzaError::TemplateNotFound { template_id })?;

        let overrides = self.override_map(template_id).await?;
        self.generator
            .generate(&template, range_start, range_end, &overrides)
    }

    /// Free bookable slots for an owner on a date
    pub async fn get_availability(&self, owner_id: i64, date: NaiveDate) -> Result<Vec<Slot>> {
        let config = self.get_preferences(owner_id).await?;
        let booked = self.booked_intervals(owner_id, date).await?;
        self.availability.available_slots(
            &config,
            &booked,
            date,
            &config.allowed_durations,
            self.clock.now(),
        )
    }

    /// Register an attendee against a template or a specific instance
    pub async fn register(
        &self,
        template_id: i64,
        instance_id: Option<&str>,
        attendee_id: i64,
    ) -> Result<Registration> {
        self.coordinator
            .register(template_id, instance_id, attendee_id)
            .await
    }

    /// Cancel a registration
    pub async fn cancel_registration(&self, registration_id: Uuid) -> Result<Registration> {
        self.coordinator.cancel(registration_id).await
    }

    /// The owner's working hours, falling back to the default week when none
    /// are stored yet
    pub async fn get_preferences(&self, owner_id: i64) -> Result<WorkingHoursConfig> {
        match self.db.preferences.find_by_owner(owner_id).await? {
            Some(config) => Ok(config),
            None => Ok(WorkingHoursConfig::new(owner_id)),
        }
    }

    /// Replace the owner's working hours configuration
    pub async fn update_preferences(
        &self,
        config: WorkingHoursConfig,
    ) -> Result<WorkingHoursConfig> {
        config.tz()?;
        if config.buffer_minutes < 0 {
            return Err(CadenzaError::InvalidInput(
                "buffer minutes must not be negative".to_string(),
            ));
        }
        if config.allowed_durations.is_empty()
            || config.allowed_durations.iter().any(|d| *d <= 0)
        {
            return Err(CadenzaError::InvalidInput(
                "allowed durations must be a non-empty list of positive minutes".to_string(),
            ));
        }

        self.db.preferences.upsert(&config).await
    }

    /// Cancel one occurrence of a recurring template without touching the
    /// rest of the series
    pub async fn cancel_occurrence(
        &self,
        template_id: i64,
        instance_id: &str,
    ) -> Result<InstanceOverride> {
        let mut record = match self.db.overrides.find_by_instance(instance_id).await? {
            Some(existing) => existing,
            None => InstanceOverride::new(template_id, instance_id.to_string()),
        };
        record.is_cancelled = true;

        let saved = self.db.overrides.upsert(&record).await?;
        self.cache.invalidate(instance_id);
        info!(template_id = template_id, instance_id = instance_id, "Occurrence cancelled");
        Ok(saved)
    }

    /// Set or clear a per-instance capacity override
    pub async fn override_capacity(
        &self,
        template_id: i64,
        instance_id: &str,
        capacity: Option<i32>,
    ) -> Result<InstanceOverride> {
        let mut record = match self.db.overrides.find_by_instance(instance_id).await? {
            Some(existing) => existing,
            None => InstanceOverride::new(template_id, instance_id.to_string()),
        };
        record.capacity = capacity;

        let saved = self.db.overrides.upsert(&record).await?;
        self.cache.invalidate(instance_id);
        Ok(saved)
    }

    fn validate_schedule(&self, schedule: &Schedule) -> Result<()> {
        match schedule {
            Schedule::FixedOccurrence {
                duration_minutes, ..
            } => {
                if *duration_minutes <= 0 {
                    return Err(CadenzaError::InvalidInput(
                        "duration must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
            Schedule::RecurringSeries { pattern } => self.validator.validate(pattern).into_result(),
        }
    }

    async fn override_map(&self, template_id: i64) -> Result<HashMap<String, InstanceOverride>> {
        let records = self.db.overrides.list_by_template(template_id).await?;
        Ok(records
            .into_iter()
            .map(|record| (record.instance_id.clone(), record))
            .collect())
    }

    /// The owner's own scheduled occurrences on a date, treated as busy time
    /// for slot computation
    async fn booked_intervals(&self, owner_id: i64, date: NaiveDate) -> Result<Vec<Interval>> {
        let mut intervals = Vec::new();
        for template in self.db.templates.list_by_owner(owner_id).await? {
            let overrides = self.override_map(template.id).await?;
            let instances = self.generator.generate(&template, date, date, &overrides)?;
            intervals.extend(instances.iter().map(EventInstance::interval));
        }
        Ok(intervals)
    }
}
