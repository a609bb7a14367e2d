//! HTTP gateway (Axum) in front of the moderation gate.
//!
//! This module is primarily used by the `asksphere-gate` binary. Callers are
//! expected to sit behind the forum's auth layer, which passes the member id
//! in the [`USER_ID_HEADER`] header.

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    active_bans_handler, moderate_handler, recommendations_handler, validate_content_handler,
};
pub use state::HandlerState;

/// Response header carrying a short machine-readable status.
pub const STATUS_HEADER: &str = "x-asksphere-status";

/// Request header naming the authenticated member.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/moderate", post(moderate_handler))
        .route("/v1/validate-content", post(validate_content_handler))
        .route("/v1/recommendations", post(recommendations_handler))
        .route("/v1/communities/{id}/bans", get(active_bans_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub embedder_mode: &'static str,
    pub classifier_mode: &'static str,
}

fn mode(is_stub: bool) -> &'static str {
    if is_stub { "stub" } else { "real" }
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(STATUS_HEADER, HeaderValue::from_static("healthy"));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let components = ComponentStatus {
        http: "ready",
        embedder_mode: mode(state.gate.advisor().scorer().is_stub()),
        classifier_mode: mode(state.gate.toxicity().is_stub()),
    };

    let mut headers = HeaderMap::new();
    headers.insert(STATUS_HEADER, HeaderValue::from_static("ready"));

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: "ok",
            components,
        }),
    )
        .into_response()
}
