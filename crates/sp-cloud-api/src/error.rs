//! Command service errors and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;
use crate::twin::TwinError;

/// Failures of the command use cases.
///
/// Persist, twin and notify failures happen after validation passed; none of
/// them rolls back a command that was already written.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown model number '{0}', no commands associated with model")]
    UnknownModel(String),

    #[error("invalid command parameters: {0}")]
    InvalidParameter(String),

    #[error("no registration of device '{device_id}' for user '{user_id}'")]
    MissingRegistration { user_id: String, device_id: String },

    #[error("command {command_id} not found for device '{device_id}'")]
    MissingCommand { device_id: String, command_id: Uuid },

    #[error("failed to persist command: {0}")]
    PersistFailure(#[source] StoreError),

    #[error("command {command_id} stored but twin update failed: {source}")]
    TwinPatchFailure {
        command_id: Uuid,
        #[source]
        source: TwinError,
    },

    #[error("command {command_id} stored but notification failed: {source}")]
    NotifyFailure {
        command_id: Uuid,
        #[source]
        source: TwinError,
    },

    #[error("query failed: {0}")]
    QueryFailure(#[source] StoreError),
}

impl CommandError {
    /// Stable error code rendered in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::UnknownModel(_) => "UnknownModel",
            CommandError::InvalidParameter(_) => "InvalidParameter",
            CommandError::MissingRegistration { .. } => "MissingRegistration",
            CommandError::MissingCommand { .. } => "MissingCommand",
            CommandError::PersistFailure(_) => "PersistFailure",
            CommandError::TwinPatchFailure { .. } => "TwinPatchFailure",
            CommandError::NotifyFailure { .. } => "NotifyFailure",
            CommandError::QueryFailure(_) => "QueryFailure",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CommandError::UnknownModel(_)
            | CommandError::InvalidParameter(_)
            | CommandError::MissingRegistration { .. }
            | CommandError::MissingCommand { .. } => StatusCode::BAD_REQUEST,
            CommandError::QueryFailure(StoreError::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// API error type that converts to proper HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing caller identity")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Command(err) => (err.status_code(), err.code()),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "error": code,
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience alias.
pub type ApiResult<T> = Result<T, ApiError>;
