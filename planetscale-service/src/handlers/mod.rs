//! HTTP handlers for planetscale-service.

pub mod operations;
pub mod webhook;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use reqwest::Method;
use serde_json::json;

use crate::startup::AppState;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "planetscale-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Ready only while the configured credentials are accepted by `GET /user`.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.request(Method::GET, "/user", None, None).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "error": e.to_string(),
                    "details": e.description(),
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        service_core::observability::metrics::render(),
    )
}
