//! Command use cases: create, read, list and acknowledge.
//!
//! `create_command` runs as one sequential chain: registration lookup,
//! strategy selection, validation, persistence, twin patch, notification.
//! Nothing is written until the command validated and its twin patch was
//! computed. Once the record is stored it is never rolled back; a failing
//! twin patch or notification leaves it `pending` for operators to find.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use sp_commands::{CommandCatalog, CommandStrategy, StrategyError};
use sp_protocol::{
    Command, CommandAck, CommandNotification, CommandStatus, DeviceRegistration, Ticket,
};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{CommandError, CommandResult};
use crate::events::WsEvent;
use crate::store::{CommandPage, CommandQuery, CommandStore, RegistrationStore};
use crate::twin::{Notifier, TwinService};

pub struct CommandService {
    registrations: Arc<dyn RegistrationStore>,
    commands: Arc<dyn CommandStore>,
    twin: Arc<dyn TwinService>,
    notifier: Arc<dyn Notifier>,
    catalog: CommandCatalog,
    page_size: usize,
    event_tx: broadcast::Sender<WsEvent>,
}

impl CommandService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        commands: Arc<dyn CommandStore>,
        twin: Arc<dyn TwinService>,
        notifier: Arc<dyn Notifier>,
        catalog: CommandCatalog,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            registrations,
            commands,
            twin,
            notifier,
            catalog,
            page_size: DEFAULT_PAGE_SIZE,
            event_tx,
        }
    }

    /// Minimum number of items `get_commands` gathers before returning.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_event_sender(mut self, event_tx: broadcast::Sender<WsEvent>) -> Self {
        self.event_tx = event_tx;
        self
    }

    pub fn event_sender(&self) -> &broadcast::Sender<WsEvent> {
        &self.event_tx
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Validate, persist and dispatch a command.
    ///
    /// Not idempotent: identical calls create distinct commands.
    pub async fn create_command(
        &self,
        ticket: &Ticket,
        device_id: &str,
        raw: Value,
    ) -> CommandResult<Command> {
        let registration = self.registration(ticket, device_id).await?;

        let mut strategy = CommandStrategy::select(&registration.model_number, raw, &self.catalog)
            .map_err(strategy_error)?;
        if !strategy.validate() {
            return Err(CommandError::InvalidParameter(format!(
                "{} rejected for model '{}'",
                strategy.details(),
                registration.model_number
            )));
        }
        let patch = strategy.shadow_details().map_err(strategy_error)?;

        let command = Command::new(device_id, &ticket.user_id, strategy.details());
        self.commands
            .put_command(&command)
            .await
            .map_err(CommandError::PersistFailure)?;
        tracing::info!(
            command_id = %command.command_id,
            device_id = %device_id,
            model = %registration.model_number,
            "command stored"
        );

        // Independent side effects: both are attempted regardless of the other.
        let twin_result = self.twin.patch_desired(device_id, &patch).await;
        if let Err(e) = &twin_result {
            tracing::warn!(command_id = %command.command_id, error = %e, "twin patch failed");
        }

        let notification = CommandNotification {
            command_id: command.command_id,
            device_id: device_id.to_string(),
            status: CommandStatus::Pending,
            details: patch,
        };
        let notify_result = self.notifier.notify(&notification).await;
        if let Err(e) = &notify_result {
            tracing::warn!(command_id = %command.command_id, error = %e, "notification failed");
        }

        twin_result.map_err(|source| CommandError::TwinPatchFailure {
            command_id: command.command_id,
            source,
        })?;
        notify_result.map_err(|source| CommandError::NotifyFailure {
            command_id: command.command_id,
            source,
        })?;

        let _ = self.event_tx.send(WsEvent::CommandCreated {
            command_id: command.command_id,
            device_id: command.device_id.clone(),
            user_id: command.user_id.clone(),
            details: command.details.clone(),
            created_at: command.created_at,
        });

        Ok(command)
    }

    pub async fn get_command(
        &self,
        ticket: &Ticket,
        device_id: &str,
        command_id: Uuid,
    ) -> CommandResult<Command> {
        self.registration(ticket, device_id).await?;

        self.commands
            .get_command(device_id, command_id)
            .await
            .map_err(CommandError::QueryFailure)?
            .ok_or_else(|| CommandError::MissingCommand {
                device_id: device_id.to_string(),
                command_id,
            })
    }

    /// Commands of a device, newest first.
    ///
    /// Store pages are read until at least `page_size` items were gathered
    /// or the store runs out; the returned cursor continues from there.
    pub async fn get_commands(
        &self,
        ticket: &Ticket,
        device_id: &str,
        status: Option<CommandStatus>,
        cursor: Option<String>,
    ) -> CommandResult<CommandPage> {
        self.registration(ticket, device_id).await?;

        let mut query = CommandQuery {
            device_id: device_id.to_string(),
            status,
            cursor,
            limit: self.page_size,
        };
        let mut items = Vec::new();
        loop {
            let page = self
                .commands
                .query_commands(&query)
                .await
                .map_err(CommandError::QueryFailure)?;
            items.extend(page.items);
            query.cursor = page.cursor;

            if items.len() >= self.page_size || query.cursor.is_none() {
                break;
            }
        }

        Ok(CommandPage {
            items,
            cursor: query.cursor,
        })
    }

    /// Record a device acknowledgment.
    ///
    /// Returns the updated command, or `None` when the ack was not
    /// terminal or names a command this device does not own.
    pub async fn acknowledge(&self, ack: &CommandAck) -> CommandResult<Option<Command>> {
        if !ack.status.is_terminal() {
            return Ok(None);
        }

        let known = self
            .commands
            .get_command(&ack.device_id, ack.command_id)
            .await
            .map_err(CommandError::QueryFailure)?;
        if known.is_none() {
            tracing::warn!(
                command_id = %ack.command_id,
                device_id = %ack.device_id,
                "ack for unknown command"
            );
            return Ok(None);
        }

        let updated = self
            .commands
            .update_status(ack.command_id, ack.status, Utc::now())
            .await
            .map_err(CommandError::PersistFailure)?;

        if let Some(command) = &updated {
            tracing::info!(
                command_id = %command.command_id,
                status = %command.status.as_str(),
                reason = %ack.reason,
                "command acknowledged"
            );
            let _ = self.event_tx.send(WsEvent::CommandStatusChanged {
                command_id: command.command_id,
                device_id: command.device_id.clone(),
                status: command.status,
                updated_at: command.updated_at,
            });
        }
        Ok(updated)
    }

    async fn registration(&self, ticket: &Ticket, device_id: &str) -> CommandResult<DeviceRegistration> {
        self.registrations
            .get_registration(&ticket.user_id, device_id)
            .await
            .map_err(CommandError::QueryFailure)?
            .ok_or_else(|| CommandError::MissingRegistration {
                user_id: ticket.user_id.clone(),
                device_id: device_id.to_string(),
            })
    }
}

fn strategy_error(err: StrategyError) -> CommandError {
    match err {
        StrategyError::UnknownModel(model) => CommandError::UnknownModel(model),
        StrategyError::Transform(e) => CommandError::InvalidParameter(e.to_string()),
    }
}
