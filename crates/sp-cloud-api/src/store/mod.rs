//! Backing key-value store for registrations and command records.
//!
//! Commands are listed newest-first by `updated_at`, one page at a time.
//! Pages are keyset-paginated: the cursor names the last item evaluated,
//! and a status filter is applied after the page is read (so a page may
//! come back short or empty while more pages remain).
//!
//! Acknowledging a command bumps its `updated_at`, moving it ahead of any
//! open cursor. A listing that spans an ack therefore never returns the
//! acked command on a later page; restart from the first page to see it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use sp_protocol::{Command, CommandStatus, DeviceRegistration};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid cursor '{0}'")]
    InvalidCursor(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a command listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPage {
    pub items: Vec<Command>,
    /// Cursor of the last evaluated item when more pages remain.
    pub cursor: Option<String>,
}

/// Parameters of one page read.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandQuery {
    pub device_id: String,
    pub status: Option<CommandStatus>,
    pub cursor: Option<String>,
    /// Items evaluated per page, before the status filter.
    pub limit: usize,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Registration binding `user_id` to `device_id`, if any.
    async fn get_registration(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> StoreResult<Option<DeviceRegistration>>;

    async fn put_registration(&self, registration: &DeviceRegistration) -> StoreResult<()>;
}

#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn put_command(&self, command: &Command) -> StoreResult<()>;

    async fn get_command(&self, device_id: &str, command_id: Uuid) -> StoreResult<Option<Command>>;

    async fn query_commands(&self, query: &CommandQuery) -> StoreResult<CommandPage>;

    /// Set status and `updated_at`. Returns the updated record, or `None`
    /// when the command is unknown.
    async fn update_status(
        &self,
        command_id: Uuid,
        status: CommandStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Command>>;
}

/// Keyset position of a command in the newest-first ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CursorKey {
    pub updated_at: DateTime<Utc>,
    pub command_id: Uuid,
}

impl CursorKey {
    /// Key of `command`, truncated to the microsecond precision cursors
    /// (and PostgreSQL) carry.
    pub fn of(command: &Command) -> Self {
        let micros = command.updated_at.timestamp_micros();
        Self {
            updated_at: Utc
                .timestamp_micros(micros)
                .single()
                .unwrap_or(command.updated_at),
            command_id: command.command_id,
        }
    }

    /// `<updated_at micros>.<command_id>`
    pub fn encode(&self) -> String {
        format!("{}.{}", self.updated_at.timestamp_micros(), self.command_id)
    }

    pub fn decode(cursor: &str) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidCursor(cursor.to_string());
        let (micros, id) = cursor.split_once('.').ok_or_else(invalid)?;
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let updated_at = Utc.timestamp_micros(micros).single().ok_or_else(invalid)?;
        let command_id = Uuid::parse_str(id).map_err(|_| invalid())?;
        Ok(Self {
            updated_at,
            command_id,
        })
    }
}

/// Cut newest-first `rows` (at most `limit + 1` of them, past the cursor)
/// into a page, then apply the status filter.
pub(crate) fn page_from(
    mut rows: Vec<Command>,
    limit: usize,
    status: Option<CommandStatus>,
) -> CommandPage {
    let more = rows.len() > limit;
    rows.truncate(limit);
    let cursor = if more {
        rows.last().map(|c| CursorKey::of(c).encode())
    } else {
        None
    };
    rows.retain(|c| status.is_none_or(|s| c.status == s));
    CommandPage {
        items: rows,
        cursor,
    }
}
