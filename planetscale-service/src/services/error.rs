//! Error taxonomy for PlanetScale API calls and connector operations.

use axum::http::StatusCode;
use serde_json::Value;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required identifier was empty or blank. Raised before any network call.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Missing required parameter \"{0}\"")]
    MissingParameter(String),

    #[error("The resource \"{0}\" is not supported")]
    UnsupportedResource(String),

    #[error("The operation \"{operation}\" is not supported for {resource} resource")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("Rate limit exceeded. Maximum 600 requests per minute.")]
    RateLimited,

    #[error("Invalid credentials. Please check your PlanetScale API credentials.")]
    InvalidCredentials,

    #[error("Insufficient permissions. Your service token may not have the required access.")]
    Forbidden,

    #[error("Resource not found. The requested resource does not exist.")]
    NotFound,

    #[error("Resource conflict. The resource already exists.")]
    Conflict { remote_message: Option<String> },

    #[error("Validation error. The request parameters are invalid.")]
    Validation { remote_message: Option<String> },

    /// Any other status, or a transport failure (`status` is `None`).
    #[error("The PlanetScale API request failed")]
    Api { status: Option<u16>, body: String },

    #[error("Failed to create webhook: {0}")]
    WebhookCreation(String),

    #[error("Webhook registration storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Maps a non-success HTTP status and its response body onto the taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => ServiceError::RateLimited,
            401 => ServiceError::InvalidCredentials,
            403 => ServiceError::Forbidden,
            404 => ServiceError::NotFound,
            409 => ServiceError::Conflict {
                remote_message: remote_message(body),
            },
            422 => ServiceError::Validation {
                remote_message: remote_message(body),
            },
            _ => ServiceError::Api {
                status: Some(status),
                body: body.to_string(),
            },
        }
    }

    /// Human-readable hint shown alongside the stable message.
    pub fn description(&self) -> Option<String> {
        match self {
            ServiceError::RateLimited => {
                Some("Please wait before making additional requests.".to_string())
            }
            ServiceError::InvalidCredentials => Some(
                "Verify your service token ID and secret, or OAuth access token.".to_string(),
            ),
            ServiceError::Forbidden => Some(
                "Check the service token permissions in the PlanetScale dashboard.".to_string(),
            ),
            ServiceError::NotFound => Some(
                "Verify the organization, database, or branch name is correct.".to_string(),
            ),
            ServiceError::Conflict { remote_message } => Some(
                remote_message
                    .clone()
                    .unwrap_or_else(|| "A resource with this name may already exist.".to_string()),
            ),
            ServiceError::Validation { remote_message } => Some(
                remote_message
                    .clone()
                    .unwrap_or_else(|| "Check the input parameters and try again.".to_string()),
            ),
            ServiceError::Api { status, body } => Some(match status {
                Some(status) => format!("HTTP {}: {}", status, body),
                None => body.clone(),
            }),
            _ => None,
        }
    }
}

/// PlanetScale error bodies look like `{"code": "...", "message": "..."}`.
fn remote_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Api {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        let description = err.description();
        let upstream = |status: StatusCode| AppError::Upstream {
            status,
            message: message.clone(),
            description: description.clone(),
        };

        match &err {
            ServiceError::InvalidInput(_)
            | ServiceError::MissingParameter(_)
            | ServiceError::UnsupportedResource(_)
            | ServiceError::UnsupportedOperation { .. } => upstream(StatusCode::BAD_REQUEST),
            ServiceError::RateLimited => {
                AppError::TooManyRequests(message.clone(), Some(60))
            }
            ServiceError::InvalidCredentials => upstream(StatusCode::UNAUTHORIZED),
            ServiceError::Forbidden => upstream(StatusCode::FORBIDDEN),
            ServiceError::NotFound => upstream(StatusCode::NOT_FOUND),
            ServiceError::Conflict { .. } => upstream(StatusCode::CONFLICT),
            ServiceError::Validation { .. } => upstream(StatusCode::UNPROCESSABLE_ENTITY),
            ServiceError::Api { .. } | ServiceError::WebhookCreation(_) => {
                AppError::BadGateway(message.clone(), description.clone())
            }
            ServiceError::Storage(_) => AppError::InternalError(anyhow::anyhow!(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_exact() {
        assert!(matches!(ServiceError::from_status(429, ""), ServiceError::RateLimited));
        assert!(matches!(
            ServiceError::from_status(401, ""),
            ServiceError::InvalidCredentials
        ));
        assert!(matches!(ServiceError::from_status(403, ""), ServiceError::Forbidden));
        assert!(matches!(ServiceError::from_status(404, ""), ServiceError::NotFound));
        assert!(matches!(
            ServiceError::from_status(409, ""),
            ServiceError::Conflict { .. }
        ));
        assert!(matches!(
            ServiceError::from_status(422, ""),
            ServiceError::Validation { .. }
        ));
        assert!(matches!(
            ServiceError::from_status(500, "boom"),
            ServiceError::Api { status: Some(500), .. }
        ));
        assert!(matches!(
            ServiceError::from_status(400, "bad"),
            ServiceError::Api { status: Some(400), .. }
        ));
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            ServiceError::from_status(429, "").to_string(),
            "Rate limit exceeded. Maximum 600 requests per minute."
        );
        assert_eq!(
            ServiceError::from_status(401, "").to_string(),
            "Invalid credentials. Please check your PlanetScale API credentials."
        );
        assert_eq!(
            ServiceError::from_status(403, "").to_string(),
            "Insufficient permissions. Your service token may not have the required access."
        );
        assert_eq!(
            ServiceError::from_status(404, "").to_string(),
            "Resource not found. The requested resource does not exist."
        );
        assert_eq!(
            ServiceError::from_status(409, "").to_string(),
            "Resource conflict. The resource already exists."
        );
        assert_eq!(
            ServiceError::from_status(422, "").to_string(),
            "Validation error. The request parameters are invalid."
        );
    }

    #[test]
    fn conflict_description_prefers_remote_message() {
        let err = ServiceError::from_status(
            409,
            r#"{"code":"conflict","message":"Name has already been taken"}"#,
        );
        assert_eq!(err.description().as_deref(), Some("Name has already been taken"));

        let err = ServiceError::from_status(409, "not json");
        assert_eq!(
            err.description().as_deref(),
            Some("A resource with this name may already exist.")
        );
    }

    #[test]
    fn validation_description_falls_back() {
        let err = ServiceError::from_status(422, r#"{"message":""}"#);
        assert_eq!(
            err.description().as_deref(),
            Some("Check the input parameters and try again.")
        );
    }

    #[test]
    fn generic_error_wraps_body() {
        let err = ServiceError::from_status(503, "upstream down");
        assert_eq!(err.description().as_deref(), Some("HTTP 503: upstream down"));
    }

    #[test]
    fn unsupported_operation_message() {
        let err = ServiceError::UnsupportedOperation {
            resource: "branch".to_string(),
            operation: "explode".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "The operation \"explode\" is not supported for branch resource"
        );
    }
}
