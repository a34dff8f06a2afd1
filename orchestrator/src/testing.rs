//! Dobles en memoria para los tests del pipeline y de los handlers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use common::{Job, Record};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::Notify;

use crate::agent_client::ExtractionAgent;
use crate::enrich::FieldFetcher;
use crate::error::JobError;
use crate::snapshot::SnapshotStore;
use crate::state::{AppState, PipelineSettings};

pub fn records(urls: &[&str]) -> Vec<Record> {
    urls.iter()
        .map(|u| Record {
            title: format!("curso {u}"),
            ..Record::with_url(*u)
        })
        .collect()
}

pub struct FakeAgent {
    records: Vec<Record>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
}

impl FakeAgent {
    pub fn returning(records: Vec<Record>) -> Self {
        Self {
            records,
            failure: None,
            gate: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            failure: Some(msg.to_string()),
            ..Self::returning(Vec::new())
        }
    }

    /// No responde hasta que alguien haga `notify_one` sobre `gate`.
    pub fn gated(records: Vec<Record>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::returning(records)
        }
    }
}

#[async_trait]
impl ExtractionAgent for FakeAgent {
    async fn extract(&self, _source: &str) -> Result<Vec<Record>, JobError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.failure {
            Some(msg) => Err(JobError::Extraction(msg.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

pub struct ScriptedFetcher {
    failing: HashSet<String>,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn ok() -> Self {
        Self {
            failing: HashSet::new(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::ok()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl FieldFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(url) {
            bail!("fetch falló para {url}");
        }
        Ok("2025-01-01".to_string())
    }
}

/// Guarda en memoria y recuerda cada escritura.
#[derive(Default)]
pub struct MemorySnapshotStore {
    current: Mutex<Vec<Record>>,
    history: Mutex<Vec<Vec<Record>>>,
}

impl MemorySnapshotStore {
    pub fn saves(&self) -> Vec<Vec<Record>> {
        self.history.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Vec<Record>> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        *self.current.lock().unwrap() = records.to_vec();
        self.history.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.current.lock().unwrap().clear();
        Ok(())
    }
}

pub fn test_state(
    agent: FakeAgent,
    fetcher: ScriptedFetcher,
) -> (AppState, Arc<MemorySnapshotStore>) {
    let store = Arc::new(MemorySnapshotStore::default());
    let state = AppState::new(
        Arc::new(agent),
        Arc::new(fetcher),
        store.clone(),
        PipelineSettings {
            throttle: Duration::ZERO,
            snapshot_every: 5,
        },
    );
    (state, store)
}

/// Espera (con límite) a que el job llegue a done/error.
pub async fn wait_terminal(state: &AppState) -> Job {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let job = state.snapshot();
            if job.state.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("el job no terminó a tiempo")
}
