use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Extracting,
    Enriching,
    Done,
    Error,
}

impl JobState {
    /// Hay un pipeline corriendo (un start en este estado es no-op).
    pub fn is_running(self) -> bool {
        matches!(self, JobState::Extracting | JobState::Enriching)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

/// La única unidad de trabajo orquestado.
///
/// El orquestador es el único que la escribe; todos los demás reciben copias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub state: JobState,

    /// Registros a enriquecer; se fija cuando termina la extracción
    pub total: u32,
    /// Avance dentro de la fase actual, nunca decrece y nunca supera `total`
    pub processed: u32,

    /// Texto de progreso para humanos, no se parsea
    pub message: String,
    pub results: Vec<Record>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// -------- Parámetros y tiempos --------
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub enrich: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Estado inicial del proceso: no se pidió ningún job todavía.
    pub fn idle() -> Self {
        Self {
            id: String::new(),
            state: JobState::Idle,
            total: 0,
            processed: 0,
            message: String::new(),
            results: Vec::new(),
            error: None,
            source: String::new(),
            enrich: false,
            started_at: None,
            finished_at: None,
        }
    }

    /// Job recién creado por un start, ya en fase de extracción.
    pub fn start(source: &str, enrich: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: JobState::Extracting,
            message: "Extrayendo de la página…".to_string(),
            source: source.to_string(),
            enrich,
            started_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    /// Cuántos registros tienen el campo de enriquecimiento vacío.
    pub fn missing_enrichment(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.last_updated.is_empty())
            .count()
    }
}
