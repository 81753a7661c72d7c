//! Event template repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::repositories::TemplateStore;
use crate::models::template::{CreateTemplateRequest, EventTemplate, UpdateTemplateRequest};
use crate::utils::errors::{CadenzaError, Result};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event template
    pub async fn create(&self, request: CreateTemplateRequest) -> Result<EventTemplate> {
        let schedule = serde_json::to_value(&request.schedule)?;
        let template = sqlx::query_as::<_, EventTemplate>(
            r#"
            INSERT INTO event_templates (owner_id, title, description, schedule, capacity, timezone, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, true, $7, $7)
            RETURNING id, owner_id, title, description, schedule, capacity, timezone, is_active, created_at, updated_at
            "#
        )
        .bind(request.owner_id)
        .bind(request.title)
        .bind(request.description)
        .bind(schedule)
        .bind(request.capacity)
        .bind(request.timezone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(template)
    }

    /// Find template by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<EventTemplate>> {
        let template = sqlx::query_as::<_, EventTemplate>(
            "SELECT id, owner_id, title, description, schedule, capacity, timezone, is_active, created_at, updated_at FROM event_templates WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    /// Update template
    pub async fn update(&self, id: i64, request: UpdateTemplateRequest) -> Result<EventTemplate> {
        let schedule = request
            .schedule
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let template = sqlx::query_as::<_, EventTemplate>(
            r#"
            UPDATE event_templates
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                schedule = COALESCE($4, schedule),
                capacity = COALESCE($5, capacity),
                timezone = COALESCE($6, timezone),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING id, owner_id, title, description, schedule, capacity, timezone, is_active, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(schedule)
        .bind(request.capacity)
        .bind(request.timezone)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CadenzaError::TemplateNotFound { template_id: id })?;

        Ok(template)
    }

    /// Deactivate a template, cancelling the whole series
    pub async fn deactivate(&self, id: i64) -> Result<EventTemplate> {
        self.update(
            id,
            UpdateTemplateRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    /// List templates owned by an organizer
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<EventTemplate>> {
        let templates = sqlx::query_as::<_, EventTemplate>(
            "SELECT id, owner_id, title, description, schedule, capacity, timezone, is_active, created_at, updated_at FROM event_templates WHERE owner_id = $1 AND is_active = true ORDER BY created_at ASC"
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }
}

#[async_trait]
impl TemplateStore for TemplateRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<EventTemplate>> {
        TemplateRepository::find_by_id(self, id).await
    }
}
