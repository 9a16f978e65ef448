//! HTTP surface of the task API.
//!
//! Routing, body decoding and the response contract live here; the
//! task semantics live in `persist` and `api`. Every failure maps to a
//! JSON `{"error": ...}` body, and a not-found additionally echoes the
//! id that missed. Handlers hold the file lock for the whole
//! read-modify-write cycle, so concurrent requests serialize instead
//! of clobbering each other's writes.

use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{ApiError, ApiTask, CreateTaskRequest};
use crate::persist::TasksFile;

// ── State ────────────────────────────────────────────────────────────

/// Shared application state: the tasks file behind a lock so each
/// read-modify-write cycle runs alone.
pub struct AppState {
    pub tasks: Mutex<TasksFile>,
}

pub type SharedState = Arc<AppState>;

// ── Router ───────────────────────────────────────────────────────────

/// Build the application router around shared state. CORS is wide
/// open and panics surface as the uniform 500 body instead of a
/// dropped connection.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", put(update_task).delete(delete_task))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
}

// ── Body extraction ──────────────────────────────────────────────────

/// `axum::Json` with its rejection collapsed to this API's uniform
/// malformed-body error.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(_) => Err(ApiError::Validation("invalid JSON body".into())),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Liveness probe: a static status plus the current server time.
async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now() }))
}

async fn list_tasks(State(state): State<SharedState>) -> Result<Json<Vec<ApiTask>>, ApiError> {
    let tasks = state.tasks.lock().unwrap().list_all()?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<ApiTask>), ApiError> {
    let req = CreateTaskRequest::from_value(&body)?;
    let task = state.tasks.lock().unwrap().create(&req)?;
    tracing::info!(id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ApiTask>, ApiError> {
    let id = parse_id(&id)?;
    let task = state.tasks.lock().unwrap().update(id, &body)?;
    tracing::info!(id = task.id, "task updated");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ApiTask>, ApiError> {
    let id = parse_id(&id)?;
    let task = state.tasks.lock().unwrap().delete(id)?;
    tracing::info!(id = task.id, "task deleted");
    Ok(Json(task))
}

/// The id segment comes in as text so that its failure is this API's
/// 400, not the framework's.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("id must be a number".into()))
}

/// Uniform body for anything that escapes a handler.
fn handle_panic(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}
