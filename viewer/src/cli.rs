use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::{records_to_csv, sort_by_last_updated, Job, SortOrder};
use std::{env, io, time::Duration};

use crate::api::{JobSource, OrchestratorApi};
use crate::poll::{watch, DEFAULT_POLL_INTERVAL_MS};
use crate::render::{render_table, status_line};

/// Igual que en el orquestador:
/// - En Docker: ORCHESTRATOR_URL=http://orchestrator:8080
/// - Local: default http://localhost:8080
fn orchestrator_base_url() -> String {
    env::var("ORCHESTRATOR_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// `--interval-ms` gana sobre POLL_INTERVAL_MS.
fn poll_interval(flag: Option<u64>) -> Duration {
    let ms = flag
        .or_else(|| {
            env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
        })
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    Duration::from_millis(ms.max(1))
}

#[derive(Parser)]
#[command(name = "viewer")]
#[command(about = "Visor de resultados: lanza y sigue el job del orquestador")]
struct Cli {
    /// Intervalo de polling en milisegundos
    #[arg(long, global = true, value_name = "MS")]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Ascending,
            SortArg::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Lanza un job sobre una página (URL o archivo) y lo sigue hasta el final
    Start {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Busca "última actualización" en cada registro
        #[arg(long)]
        enrich: bool,

        /// Solo lanza el job, sin quedarse mirando
        #[arg(long)]
        no_watch: bool,
    },
    /// Consulta el estado del job actual
    Status,
    /// Muestra el último snapshot y sigue el job actual
    Watch,
    /// Pide detener el job en curso
    Stop,
    /// Imprime los últimos resultados guardados
    Last {
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Exporta los últimos resultados a CSV
    Export {
        /// Archivo de salida; sin esto va a stdout
        #[arg(long, short)]
        output: Option<String>,

        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Borra el snapshot guardado
    Clear,
}

fn print_job(job: &Job) {
    println!("Job:");
    println!("  id: {}", job.id);
    println!("  estado: {:?}", job.state);
    println!("  progreso: {}/{}", job.processed, job.total);
    println!("  mensaje: {}", job.message);
    if !job.source.is_empty() {
        println!("  source: {}", job.source);
        println!("  enrich: {}", job.enrich);
    }
    if let Some(ref error) = job.error {
        println!("  error: {}", error);
    }
    if let Some(ref started) = job.started_at {
        println!("  iniciado: {}", started);
    }
    if let Some(ref done) = job.finished_at {
        println!("  finalizado: {}", done);
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let api = OrchestratorApi::new(orchestrator_base_url());
    let every = poll_interval(cli.interval_ms);

    match cli.command {
        Commands::Start {
            source,
            enrich,
            no_watch,
        } => {
            let job = api.start(&source, enrich).await?;
            if no_watch {
                print_job(&job);
            } else {
                let job = watch(&api, every, &mut io::stdout()).await?;
                println!();
                println!("{}", status_line(&job));
            }
        }

        Commands::Status => {
            let job = api.status().await?;
            print_job(&job);
        }

        Commands::Watch => {
            watch(&api, every, &mut io::stdout()).await?;
        }

        Commands::Stop => {
            let job = api.stop().await?;
            print_job(&job);
        }

        Commands::Last { sort } => {
            let mut rows = api.last_results().await?;
            if rows.is_empty() {
                println!("No hay resultados guardados.");
            } else {
                if let Some(order) = sort {
                    sort_by_last_updated(&mut rows, order.into());
                }
                print!("{}", render_table(&rows));
                println!("{} resultados.", rows.len());
            }
        }

        Commands::Export { output, sort } => {
            let mut rows = api.last_results().await?;
            if let Some(order) = sort {
                sort_by_last_updated(&mut rows, order.into());
            }
            let csv = records_to_csv(&rows)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("no se pudo escribir {}", path))?;
                    eprintln!("Exportados {} resultados a {}", rows.len(), path);
                }
                None => print!("{}", csv),
            }
        }

        Commands::Clear => {
            if api.clear().await? {
                println!("Resultados borrados.");
            } else {
                eprintln!("El orquestador no pudo borrar los resultados.");
            }
        }
    }

    Ok(())
}
