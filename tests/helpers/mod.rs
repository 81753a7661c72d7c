//! Shared test infrastructure
//!
//! Provides an in-memory implementation of the store traits so coordinator
//! behaviour, including the atomic capacity guard, can be tested without a
//! live Postgres instance.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use cadenza::database::repositories::{OverrideStore, RegistrationStore, TemplateStore};
use cadenza::models::{
    CreateRegistrationRequest, EventTemplate, InstanceOverride, RecurrencePattern, Registration,
    RegistrationStatus, Schedule,
};
use cadenza::utils::errors::{CadenzaError, Result};

/// In-memory store implementing the repository traits.
///
/// `register_if_capacity` holds one lock across the count and the insert,
/// which gives it the same indivisibility the Postgres implementation gets
/// from its transaction and row lock.
#[derive(Default)]
pub struct InMemoryStore {
    templates: Mutex<HashMap<i64, EventTemplate>>,
    overrides: Mutex<HashMap<String, InstanceOverride>>,
    registrations: Mutex<Vec<Registration>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_template(&self, template: EventTemplate) {
        self.templates
            .lock()
            .unwrap()
            .insert(template.id, template);
    }

    pub fn insert_override(&self, record: InstanceOverride) {
        self.overrides
            .lock()
            .unwrap()
            .insert(record.instance_id.clone(), record);
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<EventTemplate>> {
        Ok(self.templates.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl OverrideStore for InMemoryStore {
    async fn find_by_instance(&self, instance_id: &str) -> Result<Option<InstanceOverride>> {
        Ok(self.overrides.lock().unwrap().get(instance_id).cloned())
    }

    async fn list_by_template(&self, template_id: i64) -> Result<Vec<InstanceOverride>> {
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.template_id == template_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn register_if_capacity(
        &self,
        request: &CreateRegistrationRequest,
        capacity: i32,
    ) -> Result<Registration> {
        let mut registrations = self.registrations.lock().unwrap();

        let current = registrations
            .iter()
            .filter(|registration| {
                registration.template_id == request.template_id
                    && registration.instance_id == request.instance_id
                    && registration.status == RegistrationStatus::Confirmed.as_str()
            })
            .count() as i64;

        if capacity > 0 && current >= i64::from(capacity) {
            return Err(CadenzaError::CapacityExceeded {
                template_id: request.template_id,
            });
        }

        let registration = Registration {
            id: Uuid::new_v4(),
            template_id: request.template_id,
            instance_id: request.instance_id.clone(),
            attendee_id: request.attendee_id,
            status: RegistrationStatus::Confirmed.as_str().to_string(),
            registered_at: Utc::now(),
        };
        registrations.push(registration.clone());
        Ok(registration)
    }

    async fn count_confirmed(&self, template_id: i64, instance_id: Option<&str>) -> Result<i64> {
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|registration| {
                registration.template_id == template_id
                    && registration.instance_id.as_deref() == instance_id
                    && registration.status == RegistrationStatus::Confirmed.as_str()
            })
            .count() as i64)
    }

    async fn cancel(&self, registration_id: Uuid) -> Result<Registration> {
        let mut registrations = self.registrations.lock().unwrap();
        let registration = registrations
            .iter_mut()
            .find(|registration| registration.id == registration_id)
            .ok_or(CadenzaError::RegistrationNotFound { registration_id })?;
        registration.status = RegistrationStatus::Cancelled.as_str().to_string();
        Ok(registration.clone())
    }
}

pub fn weekly_pattern(weekdays: Vec<Weekday>, hour: u32, start: NaiveDate) -> RecurrencePattern {
    RecurrencePattern {
        weekdays,
        time_of_day: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        start_date: start,
        end_date: None,
        duration_minutes: 60,
    }
}

pub fn recurring_template(
    id: i64,
    pattern: RecurrencePattern,
    capacity: i32,
    timezone: &str,
) -> EventTemplate {
    EventTemplate {
        id,
        owner_id: 100,
        title: "Weekly session".to_string(),
        description: None,
        schedule: Schedule::RecurringSeries { pattern },
        capacity,
        timezone: timezone.to_string(),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn fixed_template(id: i64, start: DateTime<Utc>, capacity: i32) -> EventTemplate {
    EventTemplate {
        id,
        owner_id: 100,
        title: "One-off session".to_string(),
        description: None,
        schedule: Schedule::FixedOccurrence {
            start,
            duration_minutes: 60,
        },
        capacity,
        timezone: "UTC".to_string(),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
