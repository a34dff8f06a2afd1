// orchestrator/src/state.rs

use common::Job;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use crate::agent_client::ExtractionAgent;
use crate::enrich::FieldFetcher;
use crate::snapshot::SnapshotStore;

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub throttle: Duration,
    pub snapshot_every: u32,
}

#[derive(Clone)]
pub struct AppState {
    // el único job vivo; sólo el pipeline lo escribe
    job: Arc<Mutex<Job>>,
    // pedido de stop para el job en curso
    stop_requested: Arc<AtomicBool>,

    pub agent: Arc<dyn ExtractionAgent>,
    pub fetcher: Arc<dyn FieldFetcher>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub settings: PipelineSettings,
}

impl AppState {
    pub fn new(
        agent: Arc<dyn ExtractionAgent>,
        fetcher: Arc<dyn FieldFetcher>,
        snapshots: Arc<dyn SnapshotStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            job: Arc::new(Mutex::new(Job::idle())),
            stop_requested: Arc::new(AtomicBool::new(false)),
            agent,
            fetcher,
            snapshots,
            settings,
        }
    }

    /// Copia del job actual. Nadie fuera del pipeline ve la referencia viva.
    pub fn snapshot(&self) -> Job {
        self.job.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Muta el job bajo el lock. El closure no puede hacer await, así que
    /// el lock nunca cruza un punto de suspensión.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Job) -> R) -> R {
        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut job)
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn reset_stop(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}
