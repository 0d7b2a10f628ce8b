//! Webhook registration lifecycle.
//!
//! A registration moves Absent -> Registered -> Absent. The only state kept
//! across runs is the remote webhook id and the signing secret, held by a
//! [`RegistrationStore`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{JsonObject, PlanetScaleClient, ServiceError};
use crate::models::WebhookRegistration;
use crate::utils::{build_endpoint, validate_database_name, validate_organization_name};

/// Key-value persistence for the single webhook registration.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn load(&self) -> Result<Option<WebhookRegistration>, ServiceError>;
    async fn save(&self, registration: &WebhookRegistration) -> Result<(), ServiceError>;
    async fn clear(&self) -> Result<(), ServiceError>;
}

#[derive(Default)]
pub struct InMemoryRegistrationStore {
    inner: RwLock<Option<WebhookRegistration>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registration(registration: WebhookRegistration) -> Self {
        Self {
            inner: RwLock::new(Some(registration)),
        }
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn load(&self) -> Result<Option<WebhookRegistration>, ServiceError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, registration: &WebhookRegistration) -> Result<(), ServiceError> {
        *self.inner.write().await = Some(registration.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        *self.inner.write().await = None;
        Ok(())
    }
}

/// Stores the registration as a small JSON document. A missing file means Absent.
pub struct FileRegistrationStore {
    path: PathBuf,
}

impl FileRegistrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "registration".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

#[async_trait]
impl RegistrationStore for FileRegistrationStore {
    async fn load(&self) -> Result<Option<WebhookRegistration>, ServiceError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ServiceError::Storage(e.to_string())),
        };

        let registration = serde_json::from_slice(&raw)
            .map_err(|e| ServiceError::Storage(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(registration))
    }

    async fn save(&self, registration: &WebhookRegistration) -> Result<(), ServiceError> {
        let raw = serde_json::to_vec_pretty(registration)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        // Write beside the target and rename over it so readers never see a
        // partially written document.
        let staging = self.staging_path();
        tokio::fs::write(&staging, raw)
            .await
            .map_err(|e| ServiceError::Storage(format!("{}: {}", staging.display(), e)))?;

        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            tokio::fs::remove_file(&staging).await.ok();
            return Err(ServiceError::Storage(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }
}

/// Where and for what the webhook is registered.
#[derive(Clone, Debug)]
pub struct WebhookTarget {
    pub organization: String,
    pub database: String,
    pub callback_url: String,
    pub events: Vec<String>,
    pub secret: Option<Secret<String>>,
}

impl WebhookTarget {
    pub fn new(
        organization: &str,
        database: &str,
        callback_url: impl Into<String>,
        events: Vec<String>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            organization: validate_organization_name(organization)?,
            database: validate_database_name(database)?,
            callback_url: callback_url.into(),
            events,
            secret: None,
        })
    }

    pub fn with_secret(mut self, secret: Option<Secret<String>>) -> Self {
        self.secret = secret.filter(|s| !s.expose_secret().is_empty());
        self
    }

    fn collection_endpoint(&self) -> String {
        build_endpoint(&[
            "organizations",
            &self.organization,
            "databases",
            &self.database,
            "webhooks",
        ])
    }

    fn webhook_endpoint(&self, webhook_id: &str) -> String {
        build_endpoint(&[
            "organizations",
            &self.organization,
            "databases",
            &self.database,
            "webhooks",
            webhook_id,
        ])
    }
}

#[derive(Clone)]
pub struct WebhookRegistrar {
    client: PlanetScaleClient,
    store: Arc<dyn RegistrationStore>,
    target: WebhookTarget,
}

impl WebhookRegistrar {
    pub fn new(
        client: PlanetScaleClient,
        store: Arc<dyn RegistrationStore>,
        target: WebhookTarget,
    ) -> Self {
        Self {
            client,
            store,
            target,
        }
    }

    pub fn target(&self) -> &WebhookTarget {
        &self.target
    }

    /// Secret used to verify inbound deliveries, if a webhook is registered.
    pub async fn stored_secret(&self) -> Result<Option<Secret<String>>, ServiceError> {
        Ok(self
            .store
            .load()
            .await?
            .map(|registration| Secret::new(registration.webhook_secret)))
    }

    /// Whether the stored webhook still exists remotely and points at our callback.
    ///
    /// Absent state answers `false` without a network call; any remote error
    /// also answers `false`.
    pub async fn check_exists(&self) -> Result<bool, ServiceError> {
        let Some(registration) = self.store.load().await? else {
            return Ok(false);
        };

        let endpoint = self.target.webhook_endpoint(&registration.webhook_id);
        match self.client.request(Method::GET, &endpoint, None, None).await {
            Ok(response) => Ok(response.get("url").and_then(Value::as_str)
                == Some(self.target.callback_url.as_str())),
            Err(e) => {
                tracing::debug!(
                    webhook_id = %registration.webhook_id,
                    error = %e,
                    "Stored webhook could not be fetched"
                );
                Ok(false)
            }
        }
    }

    /// Registers the webhook remotely and persists its id and secret.
    ///
    /// Returns `false` when the service answers without an `id`.
    pub async fn create(&self) -> Result<bool, ServiceError> {
        let secret = match &self.target.secret {
            Some(secret) => secret.expose_secret().clone(),
            None => generate_secret(),
        };

        let mut body = JsonObject::new();
        body.insert("url".to_string(), json!(self.target.callback_url));
        body.insert("events".to_string(), json!(self.target.events));
        body.insert("secret".to_string(), json!(secret));
        body.insert("active".to_string(), Value::Bool(true));

        let response = self
            .client
            .request(
                Method::POST,
                &self.target.collection_endpoint(),
                Some(&body),
                None,
            )
            .await
            .map_err(|e| ServiceError::WebhookCreation(e.to_string()))?;

        let Some(webhook_id) = response.get("id").and_then(id_string) else {
            tracing::warn!("Webhook creation response carried no id");
            return Ok(false);
        };

        self.store
            .save(&WebhookRegistration {
                webhook_id: webhook_id.clone(),
                webhook_secret: secret,
            })
            .await?;

        tracing::info!(
            webhook_id = %webhook_id,
            organization = %self.target.organization,
            database = %self.target.database,
            "Webhook registered"
        );
        Ok(true)
    }

    /// Removes the remote webhook and always clears local state.
    pub async fn delete(&self) -> Result<bool, ServiceError> {
        let Some(registration) = self.store.load().await? else {
            return Ok(true);
        };

        let endpoint = self.target.webhook_endpoint(&registration.webhook_id);
        if let Err(e) = self
            .client
            .request(Method::DELETE, &endpoint, None, None)
            .await
        {
            tracing::warn!(
                webhook_id = %registration.webhook_id,
                error = %e,
                "Failed to delete remote webhook"
            );
        }

        self.store.clear().await?;
        tracing::info!(webhook_id = %registration.webhook_id, "Webhook registration cleared");
        Ok(true)
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const SECRET_FRAGMENTS: usize = 3;
const FRAGMENT_LEN: usize = 11;

/// Three 11-character base-36 fragments, concatenated.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_FRAGMENTS)
        .map(|_| base36_fragment(&mut rng, FRAGMENT_LEN))
        .collect()
}

fn base36_fragment(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_base36() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 33);
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn staging_file_sits_next_to_target() {
        let store = FileRegistrationStore::new("/var/lib/connector/registration.json");
        assert_eq!(
            store.staging_path(),
            PathBuf::from("/var/lib/connector/.registration.json.tmp")
        );
    }

    #[test]
    fn id_accepts_strings_and_numbers() {
        assert_eq!(id_string(&json!("wh_1")), Some("wh_1".to_string()));
        assert_eq!(id_string(&json!(42)), Some("42".to_string()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn target_normalizes_names_and_drops_blank_secret() {
        let target = WebhookTarget::new(" MyOrg ", "MyDB", "https://hooks.example/cb", vec![])
            .unwrap()
            .with_secret(Some(Secret::new(String::new())));
        assert_eq!(target.organization, "myorg");
        assert_eq!(target.database, "mydb");
        assert!(target.secret.is_none());
        assert_eq!(
            target.webhook_endpoint("wh_1"),
            "/organizations/myorg/databases/mydb/webhooks/wh_1"
        );
    }

    #[test]
    fn target_rejects_blank_organization() {
        let err = WebhookTarget::new("  ", "db", "https://x", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "Organization name is required");
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryRegistrationStore::new();
        assert!(store.load().await.unwrap().is_none());

        let registration = WebhookRegistration {
            webhook_id: "wh_1".to_string(),
            webhook_secret: "s".to_string(),
        };
        store.save(&registration).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(registration));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
