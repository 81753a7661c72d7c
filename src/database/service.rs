//! Database service layer
//!
//! This module bundles the repositories behind one handle, mirroring the
//! boundary the engine expects from its persistent store.

use crate::database::{
    DatabasePool, OverrideRepository, PreferencesRepository, RegistrationRepository,
    TemplateRepository,
};

#[derive(Clone)]
pub struct DatabaseService {
    pub templates: TemplateRepository,
    pub overrides: OverrideRepository,
    pub registrations: RegistrationRepository,
    pub preferences: PreferencesRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            templates: TemplateRepository::new(pool.clone()),
            overrides: OverrideRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            preferences: PreferencesRepository::new(pool),
        }
    }
}
