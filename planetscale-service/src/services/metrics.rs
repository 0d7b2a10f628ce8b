//! Connector counters recorded through the `metrics` facade.
//!
//! The recorder itself is installed by
//! [`service_core::observability::metrics::install_recorder`].

use metrics::counter;

pub const API_REQUESTS_TOTAL: &str = "planetscale_api_requests_total";
pub const WEBHOOK_DELIVERIES_TOTAL: &str = "planetscale_webhook_deliveries_total";
pub const OPERATIONS_TOTAL: &str = "planetscale_operations_total";

/// `2xx`, `4xx` and so on.
pub fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

/// One outbound API call. `status_class` is `transport_error` when no
/// response arrived.
pub fn record_api_request(method: &str, status_class: &str) {
    counter!(
        API_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status_class" => status_class.to_string()
    )
    .increment(1);
}

/// One inbound delivery: `forwarded`, `ignored` or `rejected:<reason>`.
pub fn record_webhook_delivery(outcome: &str) {
    counter!(WEBHOOK_DELIVERIES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// One executed item of a batch.
pub fn record_operation(resource: &str, outcome: &'static str) {
    counter!(
        OPERATIONS_TOTAL,
        "resource" => resource.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
