use serde::{Deserialize, Serialize};
use std::fmt;

/// Event types PlanetScale can deliver to a database webhook.
pub const SUPPORTED_EVENTS: &[&str] = &[
    "branch.created",
    "branch.deleted",
    "branch.ready",
    "branch.sleeping",
    "deploy_request.closed",
    "deploy_request.completed",
    "deploy_request.errored",
    "deploy_request.in_progress",
    "deploy_request.opened",
    "deploy_request.queued",
    "deploy_request.schema_applied",
];

pub fn is_supported_event(event: &str) -> bool {
    SUPPORTED_EVENTS.contains(&event)
}

/// Locally persisted record of the webhook this service registered.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub webhook_id: String,
    pub webhook_secret: String,
}

impl fmt::Debug for WebhookRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRegistration")
            .field("webhook_id", &self.webhook_id)
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

/// One output item of a batch execution, paired with its input index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionItem {
    pub json: serde_json::Value,
    pub paired_item: usize,
}
