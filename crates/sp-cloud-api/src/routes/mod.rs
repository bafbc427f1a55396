//! API route definitions and router builder.

pub mod commands;
pub mod health;
pub mod ws;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sp_protocol::Ticket;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller identity established by the upstream
/// authorizer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity extracted from the request. Rejects with 401 when absent.
pub struct AuthTicket(pub Ticket);

impl<S: Send + Sync> FromRequestParts<S> for AuthTicket {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|user_id| AuthTicket(Ticket::new(user_id)))
            .ok_or(ApiError::Unauthorized)
    }
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/devices/{id}/commands",
            get(commands::list_commands).post(commands::create_command),
        )
        .route(
            "/devices/{id}/commands/{command_id}",
            get(commands::get_command),
        )
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::with_sample_data().unwrap())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_command(device_id: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(format!("/api/v1/devices/{device_id}/commands"))
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn create_command_returns_pending_record() {
        let response = app()
            .oneshot(post_command(
                "controller-001",
                Some("demo-user"),
                json!({"command": "set-fan-commandedSpeedPercent", "value": 42, "address": 5}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert_eq!(json["deviceId"], "controller-001");
        assert_eq!(json["userId"], "demo-user");
        assert_eq!(json["status"], "pending");
        assert!(json["commandId"].is_string());
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let response = app()
            .oneshot(post_command(
                "controller-001",
                None,
                json!({"command": "set-fan-power", "value": true, "address": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_command_is_bad_request() {
        let response = app()
            .oneshot(post_command(
                "controller-001",
                Some("demo-user"),
                json!({"command": "set-fan-power", "value": true, "address": 248}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "InvalidParameter");
    }

    #[tokio::test]
    async fn unregistered_device_is_bad_request() {
        let response = app()
            .oneshot(post_command(
                "ghost-999",
                Some("demo-user"),
                json!({"command": "set-fan-power", "value": true, "address": 1}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "MissingRegistration");
    }

    #[tokio::test]
    async fn created_command_is_listed_and_fetchable() {
        let app = app();
        let created = json_body(
            app.clone()
                .oneshot(post_command(
                    "fan-001",
                    Some("demo-user"),
                    json!({"command": "set-fan-isForward", "value": false, "address": 1}),
                ))
                .await
                .unwrap(),
        )
        .await;
        let command_id = created["commandId"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/devices/fan-001/commands?status=pending")
                    .header(USER_ID_HEADER, "demo-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = json_body(response).await;
        assert_eq!(list["items"].as_array().unwrap().len(), 1);
        assert!(list.get("cursor").is_none());

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/devices/fan-001/commands/{command_id}"))
                    .header(USER_ID_HEADER, "demo-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["commandId"], command_id);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_rejected() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/devices/fan-001/commands?status=done")
                    .header(USER_ID_HEADER, "demo-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_command_is_bad_request() {
        let response = app()
            .oneshot(
                Request::get(format!(
                    "/api/v1/devices/fan-001/commands/{}",
                    uuid::Uuid::new_v4()
                ))
                .header(USER_ID_HEADER, "demo-user")
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "MissingCommand");
    }
}
