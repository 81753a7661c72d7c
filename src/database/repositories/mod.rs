//! Database repositories module
//!
//! This module contains all repository implementations for data access, plus
//! the narrow store traits the registration coordinator depends on. The traits
//! exist so the atomic capacity path can be exercised against an in-memory
//! store in tests while production wiring uses the Postgres repositories.

pub mod overrides;
pub mod preferences;
pub mod registration;
pub mod template;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CreateRegistrationRequest, EventTemplate, InstanceOverride, Registration,
};
use crate::utils::errors::Result;

// Re-export repositories
pub use overrides::OverrideRepository;
pub use preferences::PreferencesRepository;
pub use registration::RegistrationRepository;
pub use template::TemplateRepository;

/// Read access to event templates
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<EventTemplate>>;
}

/// Read access to per-occurrence override records
#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn find_by_instance(&self, instance_id: &str) -> Result<Option<InstanceOverride>>;
    async fn list_by_template(&self, template_id: i64) -> Result<Vec<InstanceOverride>>;
}

/// Registration persistence with an atomic capacity guard.
///
/// `register_if_capacity` must run the count and the insert as one indivisible
/// unit against the backing store; a plain read-then-write is not an acceptable
/// implementation of this trait.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn register_if_capacity(
        &self,
        request: &CreateRegistrationRequest,
        capacity: i32,
    ) -> Result<Registration>;

    async fn count_confirmed(
        &self,
        template_id: i64,
        instance_id: Option<&str>,
    ) -> Result<i64>;

    async fn cancel(&self, registration_id: Uuid) -> Result<Registration>;
}
