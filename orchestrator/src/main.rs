mod agent_client;
mod config;
mod enrich;
mod error;
mod handlers;
mod jobs;
mod snapshot;
mod state;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::agent_client::HttpAgent;
use crate::config::OrchestratorConfig;
use crate::enrich::HttpFieldFetcher;
use crate::snapshot::FileSnapshotStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("orchestrator=debug,axum=info,tower_http=info")),
        )
        .init();

    let config = OrchestratorConfig::from_env();
    info!("config: {:?}", config);

    // cliente hacia el agente, con deadline para la extracción
    let agent_client = Client::builder()
        .timeout(config.agent_timeout)
        .build()
        .context("no se pudo crear el cliente HTTP")?;
    // cliente para el enriquecimiento, con deadline por request
    let fetch_client = Client::builder()
        .timeout(config.fetch_timeout)
        .build()
        .context("no se pudo crear el cliente HTTP")?;

    let state = AppState::new(
        Arc::new(HttpAgent::new(agent_client, config.agent_url.clone())),
        Arc::new(HttpFieldFetcher::new(fetch_client)),
        Arc::new(FileSnapshotStore::new(config.snapshot_path.clone())),
        config.pipeline(),
    );

    let app = handlers::build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("orquestador escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
