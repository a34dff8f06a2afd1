use thiserror::Error;

/// Fallos que terminan el job entero. Lo que falla por registro no llega
/// acá: se absorbe como campo vacío.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("agente de extracción inalcanzable: {0}")]
    AgentUnreachable(#[from] reqwest::Error),

    #[error("el agente de extracción respondió HTTP {0}")]
    AgentStatus(reqwest::StatusCode),

    #[error("falló la extracción: {0}")]
    Extraction(String),

    #[error("detenido por el usuario")]
    Stopped,
}
