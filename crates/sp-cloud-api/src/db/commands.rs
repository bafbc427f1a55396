//! Command record queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sp_protocol::{Command, CommandStatus};

use crate::store::{CursorKey, StoreError};

/// Command row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommandRow {
    pub command_id: Uuid,
    pub device_id: String,
    pub user_id: String,
    pub status: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CommandRow> for Command {
    type Error = StoreError;

    fn try_from(row: CommandRow) -> Result<Self, Self::Error> {
        let status: CommandStatus = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "command {} has status '{}'",
                row.command_id, row.status
            ))
        })?;
        Ok(Command {
            command_id: row.command_id,
            device_id: row.device_id,
            user_id: row.user_id,
            status,
            details: row.details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn insert(pool: &PgPool, command: &Command) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO commands (command_id, device_id, user_id, status, details, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(command.command_id)
    .bind(&command.device_id)
    .bind(&command.user_id)
    .bind(command.status.as_str())
    .bind(&command.details)
    .bind(command.created_at)
    .bind(command.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(
    pool: &PgPool,
    device_id: &str,
    command_id: Uuid,
) -> Result<Option<CommandRow>, sqlx::Error> {
    sqlx::query_as::<_, CommandRow>(
        "SELECT * FROM commands WHERE command_id = $1 AND device_id = $2",
    )
    .bind(command_id)
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

/// Up to `limit` commands of a device, newest first, strictly past `after`.
pub async fn list_page(
    pool: &PgPool,
    device_id: &str,
    after: Option<CursorKey>,
    limit: i64,
) -> Result<Vec<CommandRow>, sqlx::Error> {
    match after {
        Some(after) => {
            sqlx::query_as::<_, CommandRow>(
                "SELECT * FROM commands
                 WHERE device_id = $1 AND (updated_at, command_id) < ($2, $3)
                 ORDER BY updated_at DESC, command_id DESC
                 LIMIT $4",
            )
            .bind(device_id)
            .bind(after.updated_at)
            .bind(after.command_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, CommandRow>(
                "SELECT * FROM commands
                 WHERE device_id = $1
                 ORDER BY updated_at DESC, command_id DESC
                 LIMIT $2",
            )
            .bind(device_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}

/// Set status and `updated_at`, returning the updated row.
pub async fn update_status(
    pool: &PgPool,
    command_id: Uuid,
    status: CommandStatus,
    updated_at: DateTime<Utc>,
) -> Result<Option<CommandRow>, sqlx::Error> {
    sqlx::query_as::<_, CommandRow>(
        "UPDATE commands SET status = $1, updated_at = $2
         WHERE command_id = $3
         RETURNING *",
    )
    .bind(status.as_str())
    .bind(updated_at)
    .bind(command_id)
    .fetch_optional(pool)
    .await
}
