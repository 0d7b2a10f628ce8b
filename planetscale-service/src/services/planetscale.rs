//! PlanetScale API client.
//!
//! Every connector operation goes through [`PlanetScaleClient::request`], which
//! attaches credentials, omits empty bodies and query strings, and normalizes
//! failures into [`ServiceError`]. [`PlanetScaleClient::request_all_items`]
//! follows the API's cursor pagination and flattens the pages.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{Map, Value};

use super::metrics::{record_api_request, status_class};
use super::{Credential, ServiceError};

pub const DEFAULT_BASE_URL: &str = "https://api.planetscale.com/v1";

/// JSON object used for request bodies and query strings.
pub type JsonObject = Map<String, Value>;

#[derive(Clone, Debug)]
pub struct PlanetScaleClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl PlanetScaleClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one authenticated call to `base_url + endpoint`.
    ///
    /// An empty response body (e.g. `204 No Content`) is returned as `{}`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&JsonObject>,
        query: Option<&JsonObject>,
    ) -> Result<Value, ServiceError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(AUTHORIZATION, self.credential.authorization_header()?)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            builder = builder.json(body);
        }

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            builder = builder.query(&query_pairs(query));
        }

        let response = builder.send().await.map_err(|e| {
            record_api_request(method.as_str(), "transport_error");
            tracing::warn!(method = %method, endpoint = %endpoint, error = %e, "PlanetScale request failed");
            ServiceError::from(e)
        })?;

        let status = response.status();
        record_api_request(method.as_str(), &status_class(status.as_u16()));
        let text = response.text().await?;

        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            status = %status,
            "PlanetScale API response"
        );

        if !status.is_success() {
            let err = ServiceError::from_status(status.as_u16(), &text);
            tracing::warn!(
                method = %method,
                endpoint = %endpoint,
                status = %status,
                error = %err,
                "PlanetScale API returned an error"
            );
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_str(&text).map_err(|e| ServiceError::Api {
            status: Some(status.as_u16()),
            body: format!("Invalid JSON in response: {}", e),
        })
    }

    /// Collect every page of a list endpoint.
    ///
    /// Pages are fetched strictly in order; `starting_after` carries the
    /// previous page's `cursor_end`. Pagination stops when `has_next` is false
    /// or when the service omits `cursor_end`. Pages whose `data` is missing or
    /// not an array contribute nothing. Any failed page aborts the collection.
    pub async fn request_all_items(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&JsonObject>,
        query: Option<&JsonObject>,
    ) -> Result<Vec<Value>, ServiceError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut page_query = query.cloned().unwrap_or_default();
            if let Some(cursor) = &cursor {
                page_query.insert("starting_after".to_string(), Value::String(cursor.clone()));
            }

            let response = self
                .request(method.clone(), endpoint, body, Some(&page_query))
                .await?;
            pages += 1;

            cursor = next_cursor(&response);

            if let Value::Object(mut page) = response {
                if let Some(Value::Array(data)) = page.remove("data") {
                    items.extend(data);
                }
            }

            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(
            endpoint = %endpoint,
            pages,
            items = items.len(),
            "Collected paginated results"
        );

        Ok(items)
    }
}

fn next_cursor(page: &Value) -> Option<String> {
    let has_next = page.get("has_next").and_then(Value::as_bool).unwrap_or(false);
    if !has_next {
        return None;
    }

    page.get("cursor_end")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string)
}

/// Flattens a JSON object into query pairs. Arrays repeat the key; `null` is skipped.
fn query_pairs(query: &JsonObject) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.len());
    for (key, value) in query {
        match value {
            Value::Null => {}
            Value::Array(values) => {
                for value in values {
                    if let Some(rendered) = render_query_value(value) {
                        pairs.push((key.clone(), rendered));
                    }
                }
            }
            other => {
                if let Some(rendered) = render_query_value(other) {
                    pairs.push((key.clone(), rendered));
                }
            }
        }
    }
    pairs
}

fn render_query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
