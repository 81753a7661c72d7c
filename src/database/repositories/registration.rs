//! Registration repository implementation
//!
//! Holds the one operation in the engine where a race has real consequences:
//! the capacity check and the registration insert run inside a single
//! transaction with a row lock on the owning template, so two concurrent
//! registrations for the last seat can never both succeed.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::repositories::RegistrationStore;
use crate::models::registration::{CreateRegistrationRequest, Registration, RegistrationStatus};
use crate::utils::errors::{CadenzaError, Result};

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT id, template_id, instance_id, attendee_id, status, registered_at FROM registrations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// List registrations made by an attendee
    pub async fn list_by_attendee(&self, attendee_id: i64) -> Result<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(
            "SELECT id, template_id, instance_id, attendee_id, status, registered_at FROM registrations WHERE attendee_id = $1 ORDER BY registered_at ASC"
        )
        .bind(attendee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// List confirmed registrations for one instance (or for the template
    /// itself when `instance_id` is absent)
    pub async fn list_confirmed(
        &self,
        template_id: i64,
        instance_id: Option<&str>,
    ) -> Result<Vec<Registration>> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, template_id, instance_id, attendee_id, status, registered_at
            FROM registrations
            WHERE template_id = $1 AND instance_id IS NOT DISTINCT FROM $2 AND status = $3
            ORDER BY registered_at ASC
            "#,
        )
        .bind(template_id)
        .bind(instance_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }
}

/// Map Postgres serialization and deadlock failures to the retryable
/// `TransactionConflict` variant; everything else passes through.
fn map_tx_error(err: sqlx::Error) -> CadenzaError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(code) = db_err.code() {
            if code == "40001" || code == "40P01" {
                return CadenzaError::TransactionConflict;
            }
        }
    }
    CadenzaError::Database(err)
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn register_if_capacity(
        &self,
        request: &CreateRegistrationRequest,
        capacity: i32,
    ) -> Result<Registration> {
        let mut tx = self.pool.begin().await.map_err(map_tx_error)?;

        // Serialize concurrent registrations for this template behind a row
        // lock; the count below is then stable until commit.
        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM event_templates WHERE id = $1 FOR UPDATE")
                .bind(request.template_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_tx_error)?;

        if locked.is_none() {
            return Err(CadenzaError::TemplateNotFound {
                template_id: request.template_id,
            });
        }

        let (current,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE template_id = $1 AND instance_id IS NOT DISTINCT FROM $2 AND status = $3
            "#,
        )
        .bind(request.template_id)
        .bind(request.instance_id.as_deref())
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_tx_error)?;

        // capacity 0 means unlimited
        if capacity > 0 && current >= i64::from(capacity) {
            debug!(
                template_id = request.template_id,
                instance_id = request.instance_id.as_deref(),
                current = current,
                capacity = capacity,
                "Registration rejected, no seats left"
            );
            return Err(CadenzaError::CapacityExceeded {
                template_id: request.template_id,
            });
        }

        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (id, template_id, instance_id, attendee_id, status, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, template_id, instance_id, attendee_id, status, registered_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.template_id)
        .bind(request.instance_id.as_deref())
        .bind(request.attendee_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_tx_error)?;

        tx.commit().await.map_err(map_tx_error)?;

        Ok(registration)
    }

    async fn count_confirmed(&self, template_id: i64, instance_id: Option<&str>) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE template_id = $1 AND instance_id IS NOT DISTINCT FROM $2 AND status = $3
            "#,
        )
        .bind(template_id)
        .bind(instance_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn cancel(&self, registration_id: Uuid) -> Result<Registration> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = $2
            WHERE id = $1
            RETURNING id, template_id, instance_id, attendee_id, status, registered_at
            "#,
        )
        .bind(registration_id)
        .bind(RegistrationStatus::Cancelled.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CadenzaError::RegistrationNotFound { registration_id })?;

        Ok(registration)
    }
}
