use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

use crate::state::PipelineSettings;

pub const DEFAULT_ORCHESTRATOR_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8081";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/snapshot.json";
pub const DEFAULT_ENRICH_THROTTLE_MS: u64 = 250;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SNAPSHOT_EVERY: u32 = 5;

/// Configuración del orquestador, se lee una vez al arrancar.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub bind_addr: String,
    /// - En Docker: AGENT_URL=http://agent:8081
    pub agent_url: String,
    /// Deadline de la llamada de extracción al agente
    pub agent_timeout: Duration,
    pub snapshot_path: PathBuf,
    /// Pausa entre registros durante el enriquecimiento
    pub throttle: Duration,
    /// Deadline de cada fetch de enriquecimiento
    pub fetch_timeout: Duration,
    /// Cada cuántos registros se persiste el snapshot
    pub snapshot_every: u32,
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Lee y parsea una env var; si no parsea usa el default y avisa.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("valor inválido para {}={:?}, usando el default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_string("ORCHESTRATOR_ADDR", DEFAULT_ORCHESTRATOR_ADDR),
            agent_url: env_string("AGENT_URL", DEFAULT_AGENT_URL),
            agent_timeout: Duration::from_secs(env_parse(
                "AGENT_TIMEOUT_SECS",
                DEFAULT_AGENT_TIMEOUT_SECS,
            )),
            snapshot_path: PathBuf::from(env_string("SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH)),
            throttle: Duration::from_millis(env_parse(
                "ENRICH_THROTTLE_MS",
                DEFAULT_ENRICH_THROTTLE_MS,
            )),
            fetch_timeout: Duration::from_secs(env_parse(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            snapshot_every: env_parse("SNAPSHOT_EVERY", DEFAULT_SNAPSHOT_EVERY).max(1),
        }
    }

    pub fn pipeline(&self) -> PipelineSettings {
        PipelineSettings {
            throttle: self.throttle,
            snapshot_every: self.snapshot_every,
        }
    }
}
