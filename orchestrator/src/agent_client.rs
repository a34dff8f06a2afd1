use async_trait::async_trait;
use common::{ExtractRequest, ExtractResponse, Record};
use reqwest::Client;

use crate::error::JobError;

/// Contexto de página: devuelve los registros de una sola pasada.
#[async_trait]
pub trait ExtractionAgent: Send + Sync {
    async fn extract(&self, source: &str) -> Result<Vec<Record>, JobError>;
}

/// Habla con el binario `agent` por HTTP.
pub struct HttpAgent {
    client: Client,
    base_url: String,
}

impl HttpAgent {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ExtractionAgent for HttpAgent {
    async fn extract(&self, source: &str) -> Result<Vec<Record>, JobError> {
        let url = format!("{}/api/v1/extract", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&ExtractRequest {
                source: source.to_string(),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(JobError::AgentStatus(resp.status()));
        }

        let body: ExtractResponse = resp.json().await?;
        if !body.ok {
            return Err(JobError::Extraction(
                body.error
                    .unwrap_or_else(|| "el agente no pudo extraer la página".to_string()),
            ));
        }

        Ok(body.records)
    }
}
