#![allow(dead_code)]

use planetscale_service::config::{
    AuthConfig, AuthType, Config, ObservabilityConfig, TriggerConfig,
};
use planetscale_service::models::WebhookRegistration;
use planetscale_service::services::{
    Credential, InMemoryRegistrationStore, PlanetScaleClient, RegistrationStore,
};
use planetscale_service::startup::Application;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::ServerConfig;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use wiremock::{Match, Mock, MockServer, Request};

pub const TEST_ORG: &str = "acme";
pub const TEST_DB: &str = "orders";
pub const TEST_TOKEN_ID: &str = "tkn_id";
pub const TEST_TOKEN: &str = "pscale_tkn_secret";
pub const TEST_CALLBACK_URL: &str = "https://hooks.example.com/webhook";
pub const TEST_WEBHOOK_ID: &str = "wh_123";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

/// `Authorization` header produced by the test service token.
pub fn service_token_header() -> String {
    format!("{}:{}", TEST_TOKEN_ID, TEST_TOKEN)
}

pub fn service_token_client(server: &MockServer) -> PlanetScaleClient {
    PlanetScaleClient::new(
        server.uri(),
        Credential::service_token(TEST_TOKEN_ID, TEST_TOKEN),
    )
}

pub fn trigger_config(events: &[&str], verify_signature: bool) -> TriggerConfig {
    TriggerConfig {
        organization: TEST_ORG.to_string(),
        database: TEST_DB.to_string(),
        callback_url: TEST_CALLBACK_URL.to_string(),
        events: events.iter().map(|e| e.to_string()).collect(),
        webhook_secret: None,
        verify_signature,
        registration_store: None,
        event_buffer: 16,
    }
}

pub fn test_config(api_base_url: &str, trigger: Option<TriggerConfig>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        api_base_url: api_base_url.to_string(),
        auth: AuthConfig {
            auth_type: AuthType::ServiceToken,
            service_token_id: Some(TEST_TOKEN_ID.to_string()),
            service_token: Some(Secret::new(TEST_TOKEN.to_string())),
            access_token: None,
        },
        trigger,
        observability: ObservabilityConfig::default(),
        service_name: "planetscale-service-test".to_string(),
    }
}

pub fn registered() -> WebhookRegistration {
    WebhookRegistration {
        webhook_id: TEST_WEBHOOK_ID.to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
    }
}

/// Matches requests that carry no `starting_after` query parameter.
pub struct NoCursor;

impl Match for NoCursor {
    fn matches(&self, request: &Request) -> bool {
        !request
            .url
            .query_pairs()
            .any(|(key, _)| key == "starting_after")
    }
}

/// Matches requests sent without a body.
pub struct EmptyBody;

impl Match for EmptyBody {
    fn matches(&self, request: &Request) -> bool {
        request.body.is_empty()
    }
}

/// Matches requests sent without any query string.
pub struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().map_or(true, str::is_empty)
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api: MockServer,
    pub store: Arc<InMemoryRegistrationStore>,
    pub events: Option<mpsc::Receiver<Value>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestApp {
    /// Spawn the service against a fresh mock PlanetScale API.
    ///
    /// `mocks` are mounted before the server starts, so they also serve the
    /// startup webhook registration.
    pub async fn spawn(
        trigger: Option<TriggerConfig>,
        registration: Option<WebhookRegistration>,
        mocks: Vec<Mock>,
    ) -> Self {
        let api = MockServer::start().await;
        for mock in mocks {
            mock.mount(&api).await;
        }

        let store = Arc::new(match registration {
            Some(registration) => InMemoryRegistrationStore::with_registration(registration),
            None => InMemoryRegistrationStore::new(),
        });

        let config = test_config(&api.uri(), trigger);
        let mut app = Application::build_with_store(config, store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let events = app.take_events();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            app.run_with_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            api,
            store,
            events,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub async fn stored_registration(&self) -> Option<WebhookRegistration> {
        self.store.load().await.expect("store load failed")
    }

    /// Trigger graceful shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        self.handle.await.expect("server task panicked")
    }
}
