use std::time::Duration;

use dotenvy::dotenv;
use scholauxil_frontend::config::get_configuration;
use scholauxil_frontend::startup::build_router;
use scholauxil_frontend::AppState;
use service_core::observability::init_tracing;
use tracing::info;

const WORKSPACE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("scholauxil-frontend", &configuration.telemetry)?;

    scholauxil_frontend::services::metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );

    let state = AppState::new(configuration);
    state.workspaces.spawn_reaper(
        state.settings.server.session_idle_limit(),
        WORKSPACE_SWEEP_INTERVAL,
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting scholauxil-frontend on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
