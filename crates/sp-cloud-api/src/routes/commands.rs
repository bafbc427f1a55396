//! Command endpoints, scoped to one device.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use sp_protocol::{Command, CommandStatus};

use crate::error::{ApiError, ApiResult};
use crate::routes::AuthTicket;
use crate::state::AppState;

/// Query string of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandList {
    pub items: Vec<Command>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// POST /api/v1/devices/{id}/commands: validate and dispatch a command.
///
/// The body is the raw command, e.g.
/// `{"command": "set-fan-power", "value": true, "address": 3}`.
pub async fn create_command(
    State(state): State<AppState>,
    AuthTicket(ticket): AuthTicket,
    Path(device_id): Path<String>,
    Json(raw): Json<Value>,
) -> ApiResult<(StatusCode, Json<Command>)> {
    let command = state
        .commands
        .create_command(&ticket, &device_id, raw)
        .await?;
    Ok((StatusCode::CREATED, Json(command)))
}

/// GET /api/v1/devices/{id}/commands: newest first, optionally by status.
pub async fn list_commands(
    State(state): State<AppState>,
    AuthTicket(ticket): AuthTicket,
    Path(device_id): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<CommandList>> {
    let status = params
        .status
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<CommandStatus>()
                .map_err(|_| ApiError::BadRequest(format!("unknown status '{s}'")))
        })
        .transpose()?;

    let page = state
        .commands
        .get_commands(&ticket, &device_id, status, params.cursor)
        .await?;
    Ok(Json(CommandList {
        items: page.items,
        cursor: page.cursor,
    }))
}

/// GET /api/v1/devices/{id}/commands/{command_id}
pub async fn get_command(
    State(state): State<AppState>,
    AuthTicket(ticket): AuthTicket,
    Path((device_id, command_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<Command>> {
    let command = state
        .commands
        .get_command(&ticket, &device_id, command_id)
        .await?;
    Ok(Json(command))
}
