//! REST endpoints for job records.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::error;

use super::model::{AddOutcome, ApplyOutcome, JobFilter, NewJob};
use super::store::JobStore;
use crate::error::StoreError;

/// Shared state for job routes.
#[derive(Clone)]
pub struct JobsState {
    pub store: Arc<JobStore>,
}

impl JobsState {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }
}

/// Build the job REST routes.
pub fn job_routes(state: JobsState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/{id}", get(get_job).delete(delete_job))
        .route("/api/jobs/{id}/apply", post(apply_job))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "job-tracker"
    }))
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse::<u64>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid job ID"})),
        )
            .into_response()
    })
}

fn store_failure(e: StoreError) -> Response {
    error!(error = %e, "Job store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(serde_json::json!({"error": rejection.body_text()})),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Job not found"})),
    )
        .into_response()
}

// ── Handlers ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    filter: Option<String>,
}

/// GET /api/jobs?filter=all|open
async fn list_jobs(State(state): State<JobsState>, Query(query): Query<ListQuery>) -> Response {
    let filter = query
        .filter
        .as_deref()
        .map(JobFilter::parse)
        .unwrap_or_default();

    match state.store.list(filter).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => store_failure(e),
    }
}

/// GET /api/jobs/{id}
async fn get_job(State(state): State<JobsState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.get(id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => not_found(),
        Err(e) => store_failure(e),
    }
}

/// POST /api/jobs
///
/// Returns 201 with the stored record, or 422 naming the empty required
/// fields. A body that is not a JSON object gets the extractor's status
/// with a JSON error.
async fn create_job(
    State(state): State<JobsState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match state.store.add(&body).await {
        Ok(AddOutcome::Created(job)) => (StatusCode::CREATED, Json(job)).into_response(),
        Ok(AddOutcome::Invalid(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": e.to_string(),
                "missing": e.missing,
            })),
        )
            .into_response(),
        Err(e) => store_failure(e),
    }
}

/// POST /api/jobs/{id}/apply
async fn apply_job(State(state): State<JobsState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.mark_applied(id).await {
        Ok(ApplyOutcome::Applied(job)) => {
            Json(serde_json::json!({"status": "applied", "job": job})).into_response()
        }
        Ok(ApplyOutcome::AlreadyApplied(job)) => {
            Json(serde_json::json!({"status": "already_applied", "job": job})).into_response()
        }
        Ok(ApplyOutcome::NotFound) => not_found(),
        Err(e) => store_failure(e),
    }
}

/// DELETE /api/jobs/{id}
///
/// Idempotent: deleting an unknown id still returns 200.
async fn delete_job(State(state): State<JobsState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.delete(id).await {
        Ok(deleted) => Json(serde_json::json!({"deleted": deleted})).into_response(),
        Err(e) => store_failure(e),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> (Router, Arc<JobStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path().join("jobs.json")));
        let app = job_routes(JobsState::new(Arc::clone(&store)));
        (app, store, dir)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        respond(app, req.body(body).unwrap()).await
    }

    async fn send_raw(
        app: &Router,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(Method::POST).uri("/api/jobs");
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        respond(app, req.body(Body::from(body)).unwrap()).await
    }

    async fn respond(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_ok() {
        let (app, _store, _dir) = test_app();
        let (status, json) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn create_returns_record() {
        let (app, _store, _dir) = test_app();
        let (status, json) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(serde_json::json!({
                "title": "Backend Engineer",
                "company": "Acme",
                "link": "",
                "notes": "",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["id"], 1);
        assert_eq!(json["applied"], false);
        assert!(json["link"].is_null());
        assert!(json["notes"].is_null());
    }

    #[tokio::test]
    async fn create_missing_company_is_422() {
        let (app, store, _dir) = test_app();
        let (status, json) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(serde_json::json!({"title": "Dev", "company": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["missing"], serde_json::json!(["company"]));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_json_400() {
        let (app, store, _dir) = test_app();
        let (status, json) = send_raw(&app, Some("application/json"), "{\"title\": ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!json["error"].as_str().unwrap().is_empty());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_body_shape_is_json_422() {
        let (app, _store, _dir) = test_app();
        let (status, json) = send_raw(&app, Some("application/json"), "[1, 2]").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn missing_content_type_is_json_415() {
        let (app, store, _dir) = test_app();
        let (status, json) = send_raw(&app, None, r#"{"title": "Dev", "company": "Acme"}"#).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(json["error"].as_str().unwrap().contains("Content-Type"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_open_jobs() {
        let (app, store, _dir) = test_app();
        for t in ["a", "b", "c"] {
            store.add(&NewJob::new(t, "Co")).await.unwrap();
        }
        store.mark_applied(1).await.unwrap();

        let (status, json) = send(&app, Method::GET, "/api/jobs?filter=open", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 3]);

        let (_, json) = send(&app, Method::GET, "/api/jobs", None).await;
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn apply_then_apply_again() {
        let (app, store, _dir) = test_app();
        store.add(&NewJob::new("Dev", "Acme")).await.unwrap();

        let (status, json) = send(&app, Method::POST, "/api/jobs/1/apply", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "applied");
        assert_eq!(json["job"]["applied"], true);
        let first_date = json["job"]["date_applied"].clone();
        assert!(first_date.is_string());

        let (status, json) = send(&app, Method::POST, "/api/jobs/1/apply", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "already_applied");
        assert_eq!(json["job"]["date_applied"], first_date);
    }

    #[tokio::test]
    async fn apply_unknown_is_404() {
        let (app, _store, _dir) = test_app();
        let (status, _) = send(&app, Method::POST, "/api/jobs/9/apply", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_id_is_400() {
        let (app, _store, _dir) = test_app();
        let (status, json) = send(&app, Method::POST, "/api/jobs/abc/apply", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid job ID");

        let (status, _) = send(&app, Method::DELETE, "/api/jobs/-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (app, store, _dir) = test_app();
        store.add(&NewJob::new("Dev", "Acme")).await.unwrap();

        let (status, json) = send(&app, Method::DELETE, "/api/jobs/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], true);

        let (status, json) = send(&app, Method::DELETE, "/api/jobs/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], false);

        let (status, _) = send(&app, Method::GET, "/api/jobs/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JobStore::new(dir.path()));
        let app = job_routes(JobsState::new(store));

        let (status, json) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(serde_json::json!({"title": "Dev", "company": "Acme"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("IO error"));
    }
}
