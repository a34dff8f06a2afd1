use axum::{extract::State, routing::{get, post}, Json, Router};
use common::{ExtractRequest, ExtractResponse};
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::extract::{extract, COURSE_CARDS};
use crate::page::load_page;

#[derive(Clone)]
pub struct AgentState {
    pub client: Client,
}

pub fn build_router(state: AgentState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/extract", post(extract_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Carga la página y la escanea una sola vez
async fn extract_page(
    State(state): State<AgentState>,
    Json(req): Json<ExtractRequest>,
) -> Json<ExtractResponse> {
    let page = match load_page(&state.client, &req.source).await {
        Ok(page) => page,
        Err(e) => {
            warn!("no se pudo cargar {}: {:#}", req.source, e);
            return Json(ExtractResponse {
                ok: false,
                records: Vec::new(),
                error: Some(format!("{e:#}")),
            });
        }
    };

    let records = extract(&page.html, page.base.as_ref(), &COURSE_CARDS);
    info!("extraídos {} registros de {}", records.len(), req.source);

    Json(ExtractResponse {
        ok: true,
        records,
        error: None,
    })
}
