//! Inbound PlanetScale webhook deliveries.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::services::metrics::record_webhook_delivery;
use crate::services::{Delivery, SIGNATURE_HEADER};
use crate::startup::AppState;

/// Authenticates, filters and forwards one delivery.
///
/// The body is taken as raw bytes so the signature is computed over exactly
/// what was sent.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    state.notice.emit();

    let Some(trigger) = state.trigger.as_ref() else {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Webhook receiver is not configured"
        )));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let secret = if trigger.verifier.verifies_signature() {
        trigger.registrar.stored_secret().await?
    } else {
        None
    };

    let delivery = match trigger.verifier.inspect(signature, secret.as_ref(), &body) {
        Ok(delivery) => delivery,
        Err(rejection) => {
            record_webhook_delivery(&format!("rejected:{}", rejection.reason()));
            tracing::warn!(reason = rejection.message(), "Rejected webhook delivery");
            return Ok(rejection.into_response());
        }
    };

    match delivery {
        Delivery::Ignored { event_type } => {
            record_webhook_delivery("ignored");
            tracing::debug!(event_type = ?event_type, "Webhook event not in allow-list");
            Ok((
                StatusCode::OK,
                Json(json!({ "received": true, "processed": false })),
            )
                .into_response())
        }
        Delivery::Forward(event) => {
            let event_type = event
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("unknown")
                .to_string();

            trigger.events.send(event).await.map_err(|_| {
                tracing::error!("Event sink closed; dropping webhook event");
                AppError::ServiceUnavailable
            })?;

            record_webhook_delivery("forwarded");
            tracing::info!(event_type = %event_type, "Forwarded webhook event");
            Ok((
                StatusCode::OK,
                Json(json!({ "received": true, "processed": true })),
            )
                .into_response())
        }
    }
}
