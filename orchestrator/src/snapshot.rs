use anyhow::{Context, Result};
use common::Record;
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::warn;

/// Clave bajo la que se guardan los últimos resultados.
pub const LAST_RESULTS_KEY: &str = "lastResults";

/// Almacenamiento durable de los resultados (clave-valor).
pub trait SnapshotStore: Send + Sync {
    /// Últimos resultados guardados, vacío si no hay nada.
    fn load(&self) -> Result<Vec<Record>>;
    fn save(&self, records: &[Record]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Snapshot en un archivo JSON `{ "lastResults": [...], ...otras claves }`.
/// Las claves que no son nuestras se conservan al reescribir.
pub struct FileSnapshotStore {
    path: PathBuf,
    // serializa escrituras del pipeline y de los handlers
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("leyendo {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        let map: Map<String, Value> = serde_json::from_str(&raw)
            .with_context(|| format!("snapshot corrupto en {}", self.path.display()))?;
        Ok(map)
    }

    /// Escribe a un temporal y renombra, así un lector nunca ve medio archivo.
    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)
            .with_context(|| format!("escribiendo {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renombrando a {}", self.path.display()))?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Vec<Record>> {
        let mut map = self.read_map()?;
        match map.remove(LAST_RESULTS_KEY) {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // un archivo dañado no puede bloquear las escrituras siguientes
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!("{:#}; se reescribe desde cero", e);
            Map::new()
        });
        map.insert(LAST_RESULTS_KEY.to_string(), serde_json::to_value(records)?);
        self.write_map(&map)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        if map.remove(LAST_RESULTS_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
