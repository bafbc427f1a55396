//! In-memory store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use sp_protocol::{Command, CommandStatus, DeviceRegistration};

use super::{
    CommandPage, CommandQuery, CommandStore, CursorKey, RegistrationStore, StoreResult, page_from,
};

#[derive(Default)]
pub struct MemoryStore {
    /// Keyed by (user_id, device_id).
    registrations: RwLock<HashMap<(String, String), DeviceRegistration>>,
    commands: RwLock<HashMap<Uuid, Command>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with registrations.
    pub fn with_registrations(registrations: impl IntoIterator<Item = DeviceRegistration>) -> Self {
        let registrations = registrations
            .into_iter()
            .map(|r| ((r.user_id.clone(), r.device_id.clone()), r))
            .collect();
        Self {
            registrations: RwLock::new(registrations),
            commands: RwLock::new(HashMap::new()),
        }
    }

    pub async fn command_count(&self) -> usize {
        self.commands.read().await.len()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn get_registration(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> StoreResult<Option<DeviceRegistration>> {
        let key = (user_id.to_string(), device_id.to_string());
        Ok(self.registrations.read().await.get(&key).cloned())
    }

    async fn put_registration(&self, registration: &DeviceRegistration) -> StoreResult<()> {
        let key = (registration.user_id.clone(), registration.device_id.clone());
        self.registrations
            .write()
            .await
            .insert(key, registration.clone());
        Ok(())
    }
}

#[async_trait]
impl CommandStore for MemoryStore {
    async fn put_command(&self, command: &Command) -> StoreResult<()> {
        self.commands
            .write()
            .await
            .insert(command.command_id, command.clone());
        Ok(())
    }

    async fn get_command(&self, device_id: &str, command_id: Uuid) -> StoreResult<Option<Command>> {
        Ok(self
            .commands
            .read()
            .await
            .get(&command_id)
            .filter(|c| c.device_id == device_id)
            .cloned())
    }

    async fn query_commands(&self, query: &CommandQuery) -> StoreResult<CommandPage> {
        let after = query.cursor.as_deref().map(CursorKey::decode).transpose()?;

        let commands = self.commands.read().await;
        let mut rows: Vec<Command> = commands
            .values()
            .filter(|c| c.device_id == query.device_id)
            .filter(|c| after.is_none_or(|after| CursorKey::of(c) < after))
            .cloned()
            .collect();
        rows.sort_by_key(|c| std::cmp::Reverse(CursorKey::of(c)));

        let limit = query.limit.max(1);
        rows.truncate(limit + 1);
        Ok(page_from(rows, limit, query.status))
    }

    async fn update_status(
        &self,
        command_id: Uuid,
        status: CommandStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Command>> {
        let mut commands = self.commands.write().await;
        Ok(commands.get_mut(&command_id).map(|command| {
            command.status = status;
            command.updated_at = updated_at;
            command.clone()
        }))
    }
}
