//! PostgreSQL-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sp_protocol::{Command, CommandStatus, DeviceRegistration};

use super::{
    CommandPage, CommandQuery, CommandStore, CursorKey, RegistrationStore, StoreResult, page_from,
};
use crate::db;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Ok(Self::new(db::connect(database_url).await?))
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn get_registration(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> StoreResult<Option<DeviceRegistration>> {
        let row = db::registrations::get(&self.pool, user_id, device_id).await?;
        Ok(row.map(Into::into))
    }

    async fn put_registration(&self, registration: &DeviceRegistration) -> StoreResult<()> {
        db::registrations::upsert(&self.pool, registration).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandStore for PgStore {
    async fn put_command(&self, command: &Command) -> StoreResult<()> {
        db::commands::insert(&self.pool, command).await?;
        Ok(())
    }

    async fn get_command(&self, device_id: &str, command_id: Uuid) -> StoreResult<Option<Command>> {
        db::commands::get(&self.pool, device_id, command_id)
            .await?
            .map(Command::try_from)
            .transpose()
    }

    async fn query_commands(&self, query: &CommandQuery) -> StoreResult<CommandPage> {
        let after = query.cursor.as_deref().map(CursorKey::decode).transpose()?;
        let limit = query.limit.max(1);
        let fetch = i64::try_from(limit + 1).unwrap_or(i64::MAX);

        let rows = db::commands::list_page(&self.pool, &query.device_id, after, fetch).await?;
        let commands = rows
            .into_iter()
            .map(Command::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(page_from(commands, limit, query.status))
    }

    async fn update_status(
        &self,
        command_id: Uuid,
        status: CommandStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Command>> {
        db::commands::update_status(&self.pool, command_id, status, updated_at)
            .await?
            .map(Command::try_from)
            .transpose()
    }
}
