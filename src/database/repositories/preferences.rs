//! Working hours preferences repository implementation

use sqlx::PgPool;

use crate::models::working_hours::WorkingHoursConfig;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct PreferencesRepository {
    pool: PgPool,
}

impl PreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the working hours configuration for an owner
    pub async fn find_by_owner(&self, owner_id: i64) -> Result<Option<WorkingHoursConfig>> {
        let config = sqlx::query_as::<_, WorkingHoursConfig>(
            "SELECT owner_id, week, buffer_minutes, allowed_durations, allow_weekends, advance_booking_days, timezone FROM working_hours WHERE owner_id = $1"
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Insert or replace the working hours configuration for an owner
    pub async fn upsert(&self, config: &WorkingHoursConfig) -> Result<WorkingHoursConfig> {
        let week = serde_json::to_value(&config.week)?;
        let saved = sqlx::query_as::<_, WorkingHoursConfig>(
            r#"
            INSERT INTO working_hours (owner_id, week, buffer_minutes, allowed_durations, allow_weekends, advance_booking_days, timezone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (owner_id) DO UPDATE
            SET week = EXCLUDED.week,
                buffer_minutes = EXCLUDED.buffer_minutes,
                allowed_durations = EXCLUDED.allowed_durations,
                allow_weekends = EXCLUDED.allow_weekends,
                advance_booking_days = EXCLUDED.advance_booking_days,
                timezone = EXCLUDED.timezone
            RETURNING owner_id, week, buffer_minutes, allowed_durations, allow_weekends, advance_booking_days, timezone
            "#,
        )
        .bind(config.owner_id)
        .bind(week)
        .bind(config.buffer_minutes)
        .bind(&config.allowed_durations)
        .bind(config.allow_weekends)
        .bind(config.advance_booking_days)
        .bind(&config.timezone)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
