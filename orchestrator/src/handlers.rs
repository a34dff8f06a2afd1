use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{
    AckResponse, JobResponse, JobStartRequest, LastResultsResponse, Request, Response,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::jobs::{start_job, stop_job};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/messages", post(handle_message))
        .route("/api/v1/jobs", post(create_job))
        .route("/api/v1/jobs/current", get(get_job))
        .route("/api/v1/jobs/current/stop", post(stop_current_job))
        .route("/api/v1/results/last", get(get_last_results).delete(clear_last_results))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resuelve un mensaje. Todas las rutas terminan acá.
pub fn dispatch(state: &AppState, req: Request) -> Response {
    match req {
        Request::JobStart { source, enrich } => Response::Job(JobResponse {
            ok: true,
            job: start_job(state, &source, enrich),
        }),
        Request::JobStatus => Response::Job(JobResponse {
            ok: true,
            job: state.snapshot(),
        }),
        Request::JobStop => Response::Job(JobResponse {
            ok: true,
            job: stop_job(state),
        }),
        Request::LoadLastResults => match state.snapshots.load() {
            Ok(last_results) => Response::LastResults(LastResultsResponse {
                ok: true,
                last_results,
            }),
            Err(e) => {
                warn!("no se pudo leer el snapshot: {:#}", e);
                Response::LastResults(LastResultsResponse {
                    ok: false,
                    last_results: Vec::new(),
                })
            }
        },
        Request::ClearResults => {
            let ok = match state.snapshots.clear() {
                Ok(()) => true,
                Err(e) => {
                    warn!("no se pudo borrar el snapshot: {:#}", e);
                    false
                }
            };
            Response::Ack(AckResponse { ok })
        }
    }
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

async fn handle_message(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Json<Response> {
    Json(dispatch(&state, req))
}

// Arranca un job (o devuelve el que ya está corriendo)
async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<JobStartRequest>,
) -> Json<Response> {
    Json(dispatch(&state, req.into()))
}

async fn get_job(State(state): State<AppState>) -> Json<Response> {
    Json(dispatch(&state, Request::JobStatus))
}

async fn stop_current_job(State(state): State<AppState>) -> Json<Response> {
    Json(dispatch(&state, Request::JobStop))
}

async fn get_last_results(State(state): State<AppState>) -> Json<Response> {
    Json(dispatch(&state, Request::LoadLastResults))
}

async fn clear_last_results(State(state): State<AppState>) -> Json<Response> {
    Json(dispatch(&state, Request::ClearResults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotStore;
    use crate::testing::{records, test_state, wait_terminal, FakeAgent, ScriptedFetcher};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request as HttpRequest, StatusCode},
    };
    use common::JobState;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_sin_jobs_devuelve_idle() {
        let (state, _store) = test_state(FakeAgent::returning(vec![]), ScriptedFetcher::ok());
        let app = build_router(state);

        let v = call(&app, Method::POST, "/api/v1/messages", Some(json!({"type": "JOB_STATUS"}))).await;

        assert_eq!(v["ok"], true);
        assert_eq!(v["job"]["state"], "idle");
    }

    #[tokio::test]
    async fn doble_start_por_mensajes_devuelve_el_mismo_job() {
        let gate = Arc::new(Notify::new());
        let agent = FakeAgent::gated(records(&["a", "b"]), gate.clone());
        let (state, _store) = test_state(agent, ScriptedFetcher::ok());
        let app = build_router(state.clone());

        let start = json!({"type": "JOB_START", "source": "file:///x.html", "enrich": true});
        let first = call(&app, Method::POST, "/api/v1/messages", Some(start.clone())).await;
        let second = call(&app, Method::POST, "/api/v1/jobs", Some(json!({"source": "otra"}))).await;

        assert_eq!(first["job"]["state"], "extracting");
        assert_eq!(first["job"]["id"], second["job"]["id"]);

        gate.notify_one();
        let done = wait_terminal(&state).await;
        assert_eq!(done.state, JobState::Done);
        assert_eq!(done.processed, 2);

        let status = call(&app, Method::GET, "/api/v1/jobs/current", None).await;
        assert_eq!(status["job"]["state"], "done");
        assert_eq!(status["job"]["results"][0]["lastUpdated"], "2025-01-01");
    }

    #[tokio::test]
    async fn last_results_y_clear() {
        let (state, store) = test_state(FakeAgent::returning(vec![]), ScriptedFetcher::ok());
        store.save(&records(&["a"])).unwrap();
        let app = build_router(state);

        let v = call(&app, Method::POST, "/api/v1/messages", Some(json!({"type": "LOAD_LAST_RESULTS"}))).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["lastResults"][0]["url"], "a");

        let v = call(&app, Method::DELETE, "/api/v1/results/last", None).await;
        assert_eq!(v, json!({"ok": true}));

        let v = call(&app, Method::GET, "/api/v1/results/last", None).await;
        assert_eq!(v["lastResults"], json!([]));
    }

    #[tokio::test]
    async fn mensaje_desconocido_se_rechaza() {
        let (state, _store) = test_state(FakeAgent::returning(vec![]), ScriptedFetcher::ok());
        let app = build_router(state);

        let resp = app
            .oneshot(
                HttpRequest::post("/api/v1/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"type":"OPEN_PANEL"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(resp.status().is_client_error());
    }
}
