//! Device registration queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sp_protocol::DeviceRegistration;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    pub user_id: String,
    pub device_id: String,
    pub model_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationRow> for DeviceRegistration {
    fn from(row: RegistrationRow) -> Self {
        DeviceRegistration::new(row.user_id, row.device_id, row.model_number)
    }
}

pub async fn get(
    pool: &PgPool,
    user_id: &str,
    device_id: &str,
) -> Result<Option<RegistrationRow>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationRow>(
        "SELECT * FROM registrations WHERE user_id = $1 AND device_id = $2",
    )
    .bind(user_id)
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the model of a registration.
pub async fn upsert(pool: &PgPool, registration: &DeviceRegistration) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO registrations (user_id, device_id, model_number)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, device_id) DO UPDATE SET model_number = EXCLUDED.model_number",
    )
    .bind(&registration.user_id)
    .bind(&registration.device_id)
    .bind(&registration.model_number)
    .execute(pool)
    .await?;
    Ok(())
}
