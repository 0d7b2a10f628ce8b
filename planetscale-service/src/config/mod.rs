use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::ServerConfig;
use service_core::error::AppError;

use crate::models::is_supported_event;
use crate::services::{Credential, DEFAULT_BASE_URL};

pub const ENV_PREFIX: &str = "PLANETSCALE";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub auth: AuthConfig,
    #[serde(default)]
    pub trigger: Option<TriggerConfig>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum AuthType {
    #[serde(rename = "serviceToken")]
    ServiceToken,
    #[serde(rename = "oauth")]
    OAuth,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub auth_type: AuthType,
    #[serde(default)]
    pub service_token_id: Option<String>,
    #[serde(default)]
    pub service_token: Option<Secret<String>>,
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
}

/// Inbound webhook settings. Absent means the receiver is not mounted.
#[derive(Deserialize, Clone, Debug)]
pub struct TriggerConfig {
    pub organization: String,
    pub database: String,
    /// Public URL PlanetScale will post to; registered on startup.
    pub callback_url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub webhook_secret: Option<Secret<String>>,
    #[serde(default = "default_true")]
    pub verify_signature: bool,
    /// JSON file holding the webhook id and secret. In-memory when unset.
    #[serde(default)]
    pub registration_store: Option<String>,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_service_name() -> String {
    "planetscale-service".to_string()
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Reads `configuration.*` and `PLANETSCALE__*` variables, then validates.
    pub fn load() -> Result<Self, AppError> {
        let config: Config = service_core::config::load(ENV_PREFIX, &["trigger.events"])?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.auth.credential()?;

        if let Some(trigger) = &self.trigger {
            if let Some(unknown) = trigger.events.iter().find(|e| !is_supported_event(e)) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Unsupported webhook event \"{}\"",
                    unknown
                )));
            }
            if trigger.callback_url.trim().is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "trigger.callback_url is required"
                )));
            }
            if trigger.event_buffer == 0 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "trigger.event_buffer must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}

impl AuthConfig {
    /// Builds the outbound credential for the configured `auth_type`.
    pub fn credential(&self) -> Result<Credential, AppError> {
        let present = |secret: &Option<Secret<String>>| {
            secret
                .as_ref()
                .map(|s| s.expose_secret().clone())
                .filter(|s| !s.is_empty())
        };

        match self.auth_type {
            AuthType::ServiceToken => {
                let id = self
                    .service_token_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        AppError::ConfigError(anyhow::anyhow!("auth.service_token_id is required"))
                    })?;
                let token = present(&self.service_token).ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("auth.service_token is required"))
                })?;
                Ok(Credential::service_token(id, token))
            }
            AuthType::OAuth => {
                let token = present(&self.access_token).ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("auth.access_token is required"))
                })?;
                Ok(Credential::oauth(token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_token_auth() -> AuthConfig {
        AuthConfig {
            auth_type: AuthType::ServiceToken,
            service_token_id: Some("id".to_string()),
            service_token: Some(Secret::new("token".to_string())),
            access_token: None,
        }
    }

    fn config(trigger: Option<TriggerConfig>) -> Config {
        Config {
            server: ServerConfig::default(),
            api_base_url: default_api_base_url(),
            auth: service_token_auth(),
            trigger,
            observability: ObservabilityConfig::default(),
            service_name: default_service_name(),
        }
    }

    fn trigger(events: &[&str]) -> TriggerConfig {
        TriggerConfig {
            organization: "org".to_string(),
            database: "db".to_string(),
            callback_url: "https://hooks.example/webhook".to_string(),
            events: events.iter().map(|e| e.to_string()).collect(),
            webhook_secret: None,
            verify_signature: true,
            registration_store: None,
            event_buffer: 16,
        }
    }

    #[test]
    fn service_token_credential() {
        let credential = service_token_auth().credential().unwrap();
        assert_eq!(credential.auth_type(), "serviceToken");
    }

    #[test]
    fn oauth_requires_access_token() {
        let auth = AuthConfig {
            auth_type: AuthType::OAuth,
            service_token_id: None,
            service_token: None,
            access_token: Some(Secret::new(String::new())),
        };
        assert!(matches!(auth.credential(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn unknown_events_are_rejected() {
        assert!(config(Some(trigger(&["branch.ready"]))).validate().is_ok());
        assert!(config(Some(trigger(&["database.created"]))).validate().is_err());
        assert!(config(None).validate().is_ok());
    }

    #[test]
    fn auth_type_names() {
        let auth: AuthType = serde_json::from_str("\"serviceToken\"").unwrap();
        assert_eq!(auth, AuthType::ServiceToken);
        let auth: AuthType = serde_json::from_str("\"oauth\"").unwrap();
        assert_eq!(auth, AuthType::OAuth);
    }
}
