use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::record::Record;

/* --------- Mensajes hacia el orquestador --------- */

/// Un mensaje por tipo; el orquestador los resuelve con un `match` exhaustivo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    JobStart {
        source: String,
        #[serde(default)]
        enrich: bool,
    },
    JobStatus,
    JobStop,
    LoadLastResults,
    ClearResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStartRequest {
    pub source: String,
    #[serde(default)]
    pub enrich: bool,
}

impl From<JobStartRequest> for Request {
    fn from(req: JobStartRequest) -> Self {
        Request::JobStart {
            source: req.source,
            enrich: req.enrich,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub ok: bool,
    pub job: Job,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastResultsResponse {
    pub ok: bool,
    pub last_results: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Job(JobResponse),
    LastResults(LastResultsResponse),
    Ack(AckResponse),
}

/* --------- Mensajes hacia el agente de extracción --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    /// Página a escanear: URL http(s), file:// o ruta local
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub ok: bool,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
