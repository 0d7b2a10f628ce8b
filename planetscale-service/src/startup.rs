//! Application startup and lifecycle management.
//!
//! Hosts `POST /operations`, the webhook receiver (when a trigger is
//! configured), the health probes and `/metrics`. The webhook is registered
//! remotely on startup and removed again after graceful shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::middleware::from_fn;
use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::config::{Config, TriggerConfig};
use crate::handlers;
use crate::services::{
    EventFilter, FileRegistrationStore, InMemoryRegistrationStore, NoticeOnce, PlanetScaleClient,
    RegistrationStore, WebhookRegistrar, WebhookTarget, WebhookVerifier,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: PlanetScaleClient,
    pub notice: Arc<NoticeOnce>,
    pub trigger: Option<TriggerState>,
}

/// Everything the webhook receiver needs.
#[derive(Clone)]
pub struct TriggerState {
    pub registrar: WebhookRegistrar,
    pub verifier: WebhookVerifier,
    pub events: mpsc::Sender<Value>,
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/operations", post(handlers::operations::execute));

    if state.trigger.is_some() {
        router = router.route("/webhook", post(handlers::webhook::receive));
    }

    router
        .route_layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    events: Option<mpsc::Receiver<Value>>,
}

impl Application {
    /// Build the application, picking the registration store from configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let store: Arc<dyn RegistrationStore> = match config
            .trigger
            .as_ref()
            .and_then(|t| t.registration_store.as_ref())
        {
            Some(path) => Arc::new(FileRegistrationStore::new(path)),
            None => Arc::new(InMemoryRegistrationStore::new()),
        };

        Self::build_with_store(config, store).await
    }

    pub async fn build_with_store(
        config: Config,
        store: Arc<dyn RegistrationStore>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        service_core::observability::metrics::install_recorder();

        let credential = config.auth.credential()?;
        let auth_type = credential.auth_type();
        let client = PlanetScaleClient::new(config.api_base_url.clone(), credential);
        tracing::info!(
            base_url = %client.base_url(),
            auth_type,
            "PlanetScale client initialized"
        );

        let (trigger, events) = match &config.trigger {
            Some(trigger_config) => {
                let (state, receiver) = trigger_state(trigger_config, client.clone(), store)?;
                (Some(state), Some(receiver))
            }
            None => {
                tracing::info!("No trigger configured; webhook receiver disabled");
                (None, None)
            }
        };

        let state = AppState {
            config: config.clone(),
            client,
            notice: Arc::new(NoticeOnce::licensing()),
            trigger,
        };

        // Port 0 binds a random port for testing.
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("PlanetScale service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
            events,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Receiving end of the event sink. Available once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<Value>> {
        self.events.take()
    }

    /// Registers the webhook unless the stored one still points at us.
    pub async fn ensure_webhook(&self) -> Result<(), AppError> {
        let Some(trigger) = &self.state.trigger else {
            return Ok(());
        };

        if trigger.registrar.check_exists().await? {
            tracing::info!("Existing webhook registration is current");
            return Ok(());
        }

        if !trigger.registrar.create().await? {
            return Err(AppError::BadGateway(
                "Failed to create webhook".to_string(),
                Some("The PlanetScale API response did not include a webhook id".to_string()),
            ));
        }

        Ok(())
    }

    /// Run until Ctrl+C, then remove the webhook registration.
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    pub async fn run_with_shutdown<F>(self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.state.notice.emit();
        self.ensure_webhook().await?;

        let router = build_router(self.state.clone());
        axum::serve(self.listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        if let Some(trigger) = &self.state.trigger {
            if let Err(e) = trigger.registrar.delete().await {
                tracing::warn!(error = %e, "Failed to clear webhook registration");
            }
        }

        tracing::info!("PlanetScale service stopped");
        Ok(())
    }
}

fn trigger_state(
    config: &TriggerConfig,
    client: PlanetScaleClient,
    store: Arc<dyn RegistrationStore>,
) -> Result<(TriggerState, mpsc::Receiver<Value>), AppError> {
    let target = WebhookTarget::new(
        &config.organization,
        &config.database,
        config.callback_url.clone(),
        config.events.clone(),
    )?
    .with_secret(config.webhook_secret.clone());

    let verifier = WebhookVerifier::new(
        config.verify_signature,
        EventFilter::new(config.events.clone()),
    );
    if !config.verify_signature {
        tracing::warn!("Webhook signature verification is disabled");
    }

    let (sender, receiver) = mpsc::channel(config.event_buffer);

    Ok((
        TriggerState {
            registrar: WebhookRegistrar::new(client, store, target),
            verifier,
            events: sender,
        },
        receiver,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
