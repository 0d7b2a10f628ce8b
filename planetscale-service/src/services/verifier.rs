//! Inbound webhook authentication and event filtering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use service_core::utils::signature::{constant_time_eq, hmac_sha256_hex};

pub const SIGNATURE_HEADER: &str = "x-planetscale-signature";
const SIGNATURE_PREFIX: &str = "v1=";

/// `v1=` followed by the hex HMAC-SHA256 of the raw payload.
pub fn compute_signature(secret: &str, payload: &[u8]) -> Result<String, anyhow::Error> {
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hmac_sha256_hex(secret.as_bytes(), payload)?
    ))
}

/// Compares the provided header against the expected signature in constant time.
pub fn verify_signature(secret: &str, payload: &[u8], provided: &str) -> bool {
    match compute_signature(secret, payload) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), provided.as_bytes()),
        Err(_) => false,
    }
}

/// Why an inbound delivery was refused. Each maps to a fixed status and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingSignature,
    SecretNotConfigured,
    InvalidSignature,
    InvalidPayload,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::MissingSignature | Rejection::InvalidSignature => StatusCode::UNAUTHORIZED,
            Rejection::SecretNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Rejection::InvalidPayload => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingSignature => "missing_signature",
            Rejection::SecretNotConfigured => "secret_not_configured",
            Rejection::InvalidSignature => "invalid_signature",
            Rejection::InvalidPayload => "invalid_payload",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MissingSignature => "Missing signature header",
            Rejection::SecretNotConfigured => "Webhook secret not configured",
            Rejection::InvalidSignature => "Invalid signature",
            Rejection::InvalidPayload => "Invalid webhook payload",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Allow-list of event types. Empty accepts everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    events: Vec<String>,
}

impl EventFilter {
    pub fn new(events: Vec<String>) -> Self {
        Self { events }
    }

    pub fn accepts(&self, event_type: Option<&str>) -> bool {
        if self.events.is_empty() {
            return true;
        }
        event_type.is_some_and(|t| self.events.iter().any(|e| e == t))
    }
}

/// Outcome of an authenticated delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Forward(Value),
    Ignored { event_type: Option<String> },
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    verify_signature: bool,
    filter: EventFilter,
}

impl WebhookVerifier {
    pub fn new(verify_signature: bool, filter: EventFilter) -> Self {
        Self {
            verify_signature,
            filter,
        }
    }

    pub fn verifies_signature(&self) -> bool {
        self.verify_signature
    }

    /// Runs the decision table: header present, secret present, signature
    /// match, JSON decode, then the event allow-list.
    pub fn inspect(
        &self,
        signature: Option<&str>,
        secret: Option<&Secret<String>>,
        payload: &[u8],
    ) -> Result<Delivery, Rejection> {
        if self.verify_signature {
            let signature = signature
                .filter(|s| !s.is_empty())
                .ok_or(Rejection::MissingSignature)?;
            let secret = secret
                .map(ExposeSecret::expose_secret)
                .filter(|s| !s.is_empty())
                .ok_or(Rejection::SecretNotConfigured)?;

            if !verify_signature(secret, payload, signature) {
                return Err(Rejection::InvalidSignature);
            }
        }

        let event: Value =
            serde_json::from_slice(payload).map_err(|_| Rejection::InvalidPayload)?;
        let event_type = event.get("type").and_then(Value::as_str);

        if !self.filter.accepts(event_type) {
            return Ok(Delivery::Ignored {
                event_type: event_type.map(str::to_string),
            });
        }

        Ok(Delivery::Forward(event))
    }
}
