use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

/// HTML de la página a escanear y la URL contra la que resolver links.
#[derive(Debug)]
pub struct Page {
    pub html: String,
    pub base: Option<Url>,
}

/// Carga la página indicada por `source`:
/// - `http(s)://...` se descarga
/// - `file://...` o una ruta se lee de disco (sin base para links relativos)
pub async fn load_page(client: &Client, source: &str) -> Result<Page> {
    let source = source.trim();
    if source.is_empty() {
        bail!("source vacío");
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let url = Url::parse(source).with_context(|| format!("URL inválida: {source}"))?;
        let resp = client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("no se pudo descargar {source}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {} para {}", status, source);
        }

        let html = resp.text().await.context("no se pudo leer el body")?;
        return Ok(Page {
            html,
            base: Some(url),
        });
    }

    let path = if source.starts_with("file://") {
        Url::parse(source)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .with_context(|| format!("file URL inválida: {source}"))?
    } else {
        PathBuf::from(source)
    };

    let html = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("no se pudo leer {}", path.display()))?;

    Ok(Page { html, base: None })
}
