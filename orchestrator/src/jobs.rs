use chrono::Utc;
use common::{dedup_by_url, Job, JobId, JobState, Record};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::enrich::fetch_field;
use crate::error::JobError;
use crate::state::AppState;

#[derive(Debug)]
pub enum StartOutcome {
    Started(Job),
    /// Ya había un job corriendo; se devuelve tal cual
    AlreadyRunning(Job),
}

/// Chequeo de single-flight y creación del job nuevo, bajo el mismo lock.
pub fn begin_job(state: &AppState, source: &str, enrich: bool) -> StartOutcome {
    state.update(|job| {
        if job.state.is_running() {
            return StartOutcome::AlreadyRunning(job.clone());
        }
        *job = Job::start(source, enrich);
        state.reset_stop();
        StartOutcome::Started(job.clone())
    })
}

/// JOB_START: arranca el pipeline en segundo plano o devuelve el job en curso.
pub fn start_job(state: &AppState, source: &str, enrich: bool) -> Job {
    match begin_job(state, source, enrich) {
        StartOutcome::Started(job) => {
            info!(
                "job {} iniciado (source={}, enrich={})",
                job.id, job.source, job.enrich
            );
            tokio::spawn(run_pipeline(state.clone(), job.id.clone()));
            job
        }
        StartOutcome::AlreadyRunning(job) => {
            info!("start ignorado: job {} sigue en {:?}", job.id, job.state);
            job
        }
    }
}

/// JOB_STOP: sólo marca el pedido; el pipeline lo mira antes de cada paso.
pub fn stop_job(state: &AppState) -> Job {
    state.update(|job| {
        if job.state.is_running() {
            state.request_stop();
            job.message = "Deteniendo…".to_string();
            info!("stop pedido para job {}", job.id);
        }
        job.clone()
    })
}

fn persist(state: &AppState, results: &[Record]) {
    if let Err(e) = state.snapshots.save(results) {
        warn!("no se pudo guardar el snapshot: {:#}", e);
    }
}

fn fail_job(state: &AppState, job_id: &JobId, err: JobError) {
    warn!("job {} terminó con error: {}", job_id, err);
    state.update(|job| {
        job.state = JobState::Error;
        job.error = Some(err.to_string());
        job.message = "Error.".to_string();
        job.finished_at = Some(Utc::now());
    });
}

/// extract -> (enrich) -> done | error
pub async fn run_pipeline(state: AppState, job_id: JobId) {
    let (source, enrich) = state.update(|job| (job.source.clone(), job.enrich));

    // 1) Extracción: una sola llamada al agente
    let records = match state.agent.extract(&source).await {
        Ok(records) => dedup_by_url(records),
        Err(e) => {
            fail_job(&state, &job_id, e);
            return;
        }
    };

    let total = records.len() as u32;

    if state.stop_requested() {
        // lo extraído se guarda igual, sin enriquecer
        let results = state.update(|job| {
            job.results = records;
            job.total = total;
            job.results.clone()
        });
        persist(&state, &results);
        fail_job(&state, &job_id, JobError::Stopped);
        return;
    }

    let enriching = enrich && total > 0;

    let results = state.update(|job| {
        job.results = records;
        job.total = total;
        if enriching {
            job.state = JobState::Enriching;
            job.processed = 0;
            job.message =
                format!("Encontrados {total} registros. Buscando \"última actualización\"…");
        } else {
            job.state = JobState::Done;
            job.processed = total;
            job.message = format!("Listo. Encontrados {total} registros.");
            job.finished_at = Some(Utc::now());
        }
        job.results.clone()
    });
    persist(&state, &results);
    info!("job {}: {} registros extraídos", job_id, total);

    if enriching {
        enrich_records(&state, &job_id, total).await;
    }
}

/// Un registro por vez, en orden. Un fallo deja el campo vacío y se sigue.
async fn enrich_records(state: &AppState, job_id: &JobId, total: u32) {
    let every = state.settings.snapshot_every.max(1);

    for i in 0..total as usize {
        if state.stop_requested() {
            let results = state.update(|job| job.results.clone());
            persist(state, &results);
            fail_job(state, job_id, JobError::Stopped);
            return;
        }

        let url = state.update(|job| {
            job.results
                .get(i)
                .map(|r| r.url.clone())
                .unwrap_or_default()
        });
        let value = fetch_field(state.fetcher.as_ref(), &url).await;

        let processed = i as u32 + 1;
        let checkpoint = state.update(|job| {
            if let Some(record) = job.results.get_mut(i) {
                record.last_updated = value;
            }
            job.processed = processed;
            job.message = format!("Buscando \"última actualización\"… {processed}/{total}");
            (processed % every == 0 && processed < total).then(|| job.results.clone())
        });
        if let Some(results) = checkpoint {
            persist(state, &results);
        }

        if processed < total {
            sleep(state.settings.throttle).await;
        }
    }

    let results = state.update(|job| {
        job.state = JobState::Done;
        job.message = format!(
            "Listo. Encontrados {} registros ({} sin fecha de actualización).",
            job.total,
            job.missing_enrichment()
        );
        job.finished_at = Some(Utc::now());
        job.results.clone()
    });
    persist(state, &results);
    info!("job {} terminado", job_id);
}
