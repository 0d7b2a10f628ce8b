//! PlanetScale API credentials and the `Authorization` header they produce.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, Secret};

use super::ServiceError;

/// Credential used for every outbound request.
#[derive(Clone)]
pub enum Credential {
    /// Service token pair, sent as `{id}:{token}`.
    ServiceToken {
        id: String,
        token: Secret<String>,
    },
    /// OAuth access token, sent as `Bearer {token}`.
    OAuth { access_token: Secret<String> },
}

impl Credential {
    pub fn service_token(id: impl Into<String>, token: impl Into<String>) -> Self {
        Credential::ServiceToken {
            id: id.into(),
            token: Secret::new(token.into()),
        }
    }

    pub fn oauth(access_token: impl Into<String>) -> Self {
        Credential::OAuth {
            access_token: Secret::new(access_token.into()),
        }
    }

    pub fn auth_type(&self) -> &'static str {
        match self {
            Credential::ServiceToken { .. } => "serviceToken",
            Credential::OAuth { .. } => "oauth",
        }
    }

    /// Builds the header value, marked sensitive so it never shows up in logs.
    pub fn authorization_header(&self) -> Result<HeaderValue, ServiceError> {
        let raw = match self {
            Credential::ServiceToken { id, token } => {
                format!("{}:{}", id, token.expose_secret())
            }
            Credential::OAuth { access_token } => {
                format!("Bearer {}", access_token.expose_secret())
            }
        };

        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            ServiceError::InvalidInput("Credential contains invalid header characters".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ServiceToken { id, .. } => f
                .debug_struct("ServiceToken")
                .field("id", id)
                .field("token", &"[REDACTED]")
                .finish(),
            Credential::OAuth { .. } => f
                .debug_struct("OAuth")
                .field("access_token", &"[REDACTED]")
                .finish(),
        }
    }
}
