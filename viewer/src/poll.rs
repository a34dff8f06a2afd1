use anyhow::Result;
use common::{Job, JobState};
use std::{io::Write, time::Duration};
use tokio::time::{interval, MissedTickBehavior};

use crate::api::JobSource;
use crate::render::{render_frame, status_line};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Abre el viewer y sigue el job actual hasta que llegue a un estado final.
///
/// 1. muestra el último snapshot guardado (aunque no haya job corriendo)
/// 2. consulta el estado enseguida y después cada `every`
/// 3. mientras está en extracting/enriching redibuja progreso y parciales
/// 4. en done / error / idle dibuja el estado final y sale del loop
///
/// Devuelve el último job visto.
pub async fn watch<S, W>(source: &S, every: Duration, out: &mut W) -> Result<Job>
where
    S: JobSource + ?Sized,
    W: Write,
{
    match source.last_results().await {
        Ok(last) if !last.is_empty() => {
            let status = format!("Cargados {} resultados.", last.len());
            write!(out, "{}", render_frame(&status, &last))?;
            out.flush()?;
        }
        Ok(_) => {}
        // sin snapshot igual se puede seguir el job
        Err(e) => {
            writeln!(out, "No se pudieron cargar los últimos resultados: {e:#}")?;
            out.flush()?;
        }
    }

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // el primer tick es inmediato
        ticker.tick().await;

        let job = source.status().await?;
        let status = status_line(&job);

        match job.state {
            JobState::Extracting | JobState::Enriching => {
                write!(out, "{}", render_frame(&status, &job.results))?;
                out.flush()?;
            }
            JobState::Done | JobState::Error => {
                write!(out, "{}", render_frame(&status, &job.results))?;
                out.flush()?;
                return Ok(job);
            }
            JobState::Idle => {
                // nada corriendo: lo que se ve es el snapshot previo
                writeln!(out, "{status}")?;
                out.flush()?;
                return Ok(job);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CLEAR_SCREEN;
    use anyhow::bail;
    use async_trait::async_trait;
    use common::Record;
    use std::collections::VecDeque;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    /// Devuelve los jobs en orden; consultar de más es un error del test.
    struct ScriptedSource {
        last: Option<Vec<Record>>,
        script: Mutex<VecDeque<Job>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(last: Vec<Record>, script: Vec<Job>) -> Self {
            Self {
                last: Some(last),
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Igual que `new`, pero el snapshot no se puede leer.
        fn without_snapshot(script: Vec<Job>) -> Self {
            Self {
                last: None,
                ..Self::new(vec![], script)
            }
        }
    }

    #[async_trait]
    impl JobSource for ScriptedSource {
        async fn status(&self) -> Result<Job> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(job) => Ok(job),
                None => bail!("se consultó el estado después de un estado final"),
            }
        }

        async fn last_results(&self) -> Result<Vec<Record>> {
            match &self.last {
                Some(last) => Ok(last.clone()),
                None => bail!("el orquestador no pudo leer el último snapshot"),
            }
        }
    }

    fn job_in(state: JobState, processed: u32, total: u32, results: Vec<Record>) -> Job {
        let mut job = Job::start("s", true);
        job.state = state;
        job.processed = processed;
        job.total = total;
        job.results = results;
        job.message = format!("{state:?}");
        job
    }

    const TICK: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn se_detiene_al_llegar_a_done() {
        let rows = vec![Record::with_url("a"), Record::with_url("b")];
        let source = ScriptedSource::new(
            vec![],
            vec![
                job_in(JobState::Extracting, 0, 0, vec![]),
                job_in(JobState::Enriching, 1, 2, rows.clone()),
                job_in(JobState::Done, 2, 2, rows.clone()),
            ],
        );
        let mut out = Vec::new();

        let job = watch(&source, TICK, &mut out).await.unwrap();

        assert_eq!(job.state, JobState::Done);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(CLEAR_SCREEN).count(), 3);
        assert!(text.contains("[1/2] Enriching"));
    }

    #[tokio::test]
    async fn se_detiene_al_llegar_a_error() {
        let mut failed = job_in(JobState::Error, 0, 0, vec![]);
        failed.error = Some("agente de extracción inalcanzable".to_string());
        let source = ScriptedSource::new(
            vec![],
            vec![job_in(JobState::Extracting, 0, 0, vec![]), failed],
        );
        let mut out = Vec::new();

        let job = watch(&source, TICK, &mut out).await.unwrap();

        assert_eq!(job.state, JobState::Error);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: agente de extracción inalcanzable"));
    }

    #[tokio::test]
    async fn al_abrir_muestra_el_snapshot_anterior() {
        let mut prev = Record::with_url("https://x/course/viejo");
        prev.title = "Curso anterior".to_string();
        let source = ScriptedSource::new(vec![prev], vec![Job::idle()]);
        let mut out = Vec::new();

        let job = watch(&source, TICK, &mut out).await.unwrap();

        assert_eq!(job.state, JobState::Idle);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Cargados 1 resultados."));
        assert!(text.contains("Curso anterior"));
    }

    #[tokio::test]
    async fn snapshot_ilegible_no_impide_seguir_el_job() {
        let rows = vec![Record::with_url("a")];
        let source = ScriptedSource::without_snapshot(vec![
            job_in(JobState::Enriching, 0, 1, rows.clone()),
            job_in(JobState::Done, 1, 1, rows),
        ]);
        let mut out = Vec::new();

        let job = watch(&source, TICK, &mut out).await.unwrap();

        assert_eq!(job.state, JobState::Done);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No se pudieron cargar los últimos resultados"));
    }
}
