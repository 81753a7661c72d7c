//! Per-occurrence override repository implementation
//!
//! Overrides are the sparse exception records for generated instances: a
//! cancellation flag and/or a capacity override, keyed by instance id.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::repositories::OverrideStore;
use crate::models::instance::InstanceOverride;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct OverrideRepository {
    pool: PgPool,
}

impl OverrideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the override record for one instance
    pub async fn upsert(&self, record: &InstanceOverride) -> Result<InstanceOverride> {
        let saved = sqlx::query_as::<_, InstanceOverride>(
            r#"
            INSERT INTO instance_overrides (id, template_id, instance_id, is_cancelled, capacity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (instance_id) DO UPDATE
            SET is_cancelled = EXCLUDED.is_cancelled,
                capacity = EXCLUDED.capacity
            RETURNING id, template_id, instance_id, is_cancelled, capacity, created_at
            "#,
        )
        .bind(record.id)
        .bind(record.template_id)
        .bind(&record.instance_id)
        .bind(record.is_cancelled)
        .bind(record.capacity)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Find the override for one instance, if any
    pub async fn find_by_instance(&self, instance_id: &str) -> Result<Option<InstanceOverride>> {
        let record = sqlx::query_as::<_, InstanceOverride>(
            "SELECT id, template_id, instance_id, is_cancelled, capacity, created_at FROM instance_overrides WHERE instance_id = $1"
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List all overrides recorded for a template
    pub async fn list_by_template(&self, template_id: i64) -> Result<Vec<InstanceOverride>> {
        let records = sqlx::query_as::<_, InstanceOverride>(
            "SELECT id, template_id, instance_id, is_cancelled, capacity, created_at FROM instance_overrides WHERE template_id = $1 ORDER BY created_at ASC"
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Remove the override for one instance
    pub async fn delete(&self, instance_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM instance_overrides WHERE instance_id = $1")
            .bind(instance_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl OverrideStore for OverrideRepository {
    async fn find_by_instance(&self, instance_id: &str) -> Result<Option<InstanceOverride>> {
        OverrideRepository::find_by_instance(self, instance_id).await
    }

    async fn list_by_template(&self, template_id: i64) -> Result<Vec<InstanceOverride>> {
        OverrideRepository::list_by_template(self, template_id).await
    }
}
