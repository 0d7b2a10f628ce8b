use planetscale_service::{config::Config, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    service_core::observability::init_tracing(
        &config.service_name,
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    )?;

    let mut application = Application::build(config).await?;

    if let Some(mut events) = application.take_events() {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::info!(
                    event_id = event.get("id").and_then(|v| v.as_str()).unwrap_or("-"),
                    event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or("-"),
                    payload = %event,
                    "PlanetScale event received"
                );
            }
        });
    }

    application.run_until_stopped().await?;

    Ok(())
}
