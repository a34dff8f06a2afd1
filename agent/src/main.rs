mod extract;
mod handlers;
mod page;

use anyhow::{Context, Result};
use reqwest::Client;
use std::{env, time::Duration};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handlers::AgentState;

const DEFAULT_AGENT_ADDR: &str = "0.0.0.0:8081";
const PAGE_TIMEOUT_SECS: u64 = 30;

/// Dirección donde escucha el agente.
/// - En Docker: AGENT_ADDR=0.0.0.0:8081
fn agent_addr() -> String {
    env::var("AGENT_ADDR").unwrap_or_else(|_| DEFAULT_AGENT_ADDR.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agent=debug,tower_http=info")),
        )
        .init();

    let client = Client::builder()
        .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
        .build()
        .context("no se pudo crear el cliente HTTP")?;

    let app = handlers::build_router(AgentState { client });

    let listener = TcpListener::bind(agent_addr()).await?;
    info!("agente escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
