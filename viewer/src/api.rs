use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::{AckResponse, Job, JobResponse, LastResultsResponse, Record, Request};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Lo que el viewer necesita del orquestador para seguir un job.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn status(&self) -> Result<Job>;
    async fn last_results(&self) -> Result<Vec<Record>>;
}

pub struct OrchestratorApi {
    client: Client,
    base_url: String,
}

impl OrchestratorApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: &Request) -> Result<T> {
        let url = format!("{}/api/v1/messages", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .with_context(|| format!("no se pudo contactar al orquestador en {}", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("el orquestador respondió {}", status);
        }
        Ok(resp.json().await?)
    }

    pub async fn start(&self, source: &str, enrich: bool) -> Result<Job> {
        let resp: JobResponse = self
            .send(&Request::JobStart {
                source: source.to_string(),
                enrich,
            })
            .await?;
        Ok(resp.job)
    }

    pub async fn stop(&self) -> Result<Job> {
        let resp: JobResponse = self.send(&Request::JobStop).await?;
        Ok(resp.job)
    }

    pub async fn clear(&self) -> Result<bool> {
        let resp: AckResponse = self.send(&Request::ClearResults).await?;
        Ok(resp.ok)
    }
}

#[async_trait]
impl JobSource for OrchestratorApi {
    async fn status(&self) -> Result<Job> {
        let resp: JobResponse = self.send(&Request::JobStatus).await?;
        Ok(resp.job)
    }

    async fn last_results(&self) -> Result<Vec<Record>> {
        let resp: LastResultsResponse = self.send(&Request::LoadLastResults).await?;
        if !resp.ok {
            bail!("el orquestador no pudo leer el último snapshot");
        }
        Ok(resp.last_results)
    }
}
