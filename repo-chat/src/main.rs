use chat_core::observability::{init_metrics, init_tracing, TracingOptions};
use repo_chat::config::get_configuration;
use repo_chat::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(&TracingOptions {
        service_name: "repo-chat",
        log_level: &settings.observability.log_level,
        json: settings.observability.json_logs,
        otlp_endpoint: settings.observability.otlp_endpoint.as_deref(),
    })?;
    init_metrics()?;

    let app = Application::build(&settings).await?;

    if app.backend_available().await {
        tracing::info!(base_url = %settings.backend.base_url, "Backend server detected");
    } else if settings.backend.require_healthy_on_start {
        tracing::error!(
            base_url = %settings.backend.base_url,
            "Backend server not detected; start it and try again"
        );
        anyhow::bail!("backend not reachable at {}", settings.backend.base_url);
    } else {
        tracing::warn!(
            base_url = %settings.backend.base_url,
            "Backend server not detected; chat commands will fail until it is up"
        );
    }

    app.run_until_stopped().await?;
    Ok(())
}
