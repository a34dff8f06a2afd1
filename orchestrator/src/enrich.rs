use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::canonical_date;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use tracing::{debug, warn};

static LAST_UPDATED_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Last updated\s*[:\-]?\s*([0-9]{1,2}/[0-9]{4})").expect("regex mm/yyyy")
});
static LAST_UPDATED_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Last updated\s*[:\-]?\s*([A-Za-z]+\s+\d{4})").expect("regex month yyyy")
});
// la fecha envuelta en markup: "Last updated <span>12/2025</span>"
static LAST_UPDATED_WRAPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Last updated\s*[:\-]?\s*(?:<[^>]*>\s*)+([0-9]{1,2}/[0-9]{4}|[A-Za-z]+\s+\d{4})")
        .expect("regex wrapped")
});

struct DatePattern {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
}

/// Se prueban en orden; el primero que matchea gana.
static LAST_UPDATED_PATTERNS: &[DatePattern] = &[
    DatePattern {
        name: "mm/yyyy",
        regex: &LAST_UPDATED_NUMERIC,
    },
    DatePattern {
        name: "month yyyy",
        regex: &LAST_UPDATED_MONTH_NAME,
    },
    DatePattern {
        name: "wrapped",
        regex: &LAST_UPDATED_WRAPPED,
    },
];

/// Busca la fecha de "última actualización" en el HTML crudo y la pasa a
/// `YYYY-MM-01` cuando el formato se reconoce.
pub fn find_last_updated(html: &str) -> Option<String> {
    LAST_UPDATED_PATTERNS.iter().find_map(|p| {
        let raw = p.regex.captures(html)?.get(1)?.as_str().trim().to_string();
        debug!("last updated via patrón {}: {:?}", p.name, raw);
        Some(canonical_date(&raw))
    })
}

/// Trae un campo extra para una url. Los errores se devuelven; quien
/// llama decide (ver `fetch_field`).
#[async_trait]
pub trait FieldFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFieldFetcher {
    client: Client,
}

impl HttpFieldFetcher {
    /// El `client` ya tiene que venir con el timeout por request configurado.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FieldFetcher for HttpFieldFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {} para {}", status, url);
        }

        let html = resp.text().await.context("leyendo body")?;
        Ok(find_last_updated(&html).unwrap_or_default())
    }
}

/// Red caída, status malo, patrón que no matchea: todo termina en "".
pub async fn fetch_field(fetcher: &dyn FieldFetcher, url: &str) -> String {
    match fetcher.fetch(url).await {
        Ok(v) => v,
        Err(e) => {
            warn!("no se pudo enriquecer {}: {:#}", url, e);
            String::new()
        }
    }
}
