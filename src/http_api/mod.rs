use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Column, ExportError, FieldAnomaly, ImportError, RowError, Session, Task, TaskEdit, TaskId,
    TimelineEngine, TimelineError, TimelineView,
    schema::{SAMPLE_CSV, SAMPLE_FILE_NAME},
};

const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }

    pub fn with_shared(session: Arc<RwLock<Session>>) -> Self {
        Self { session }
    }

    fn session(&self) -> Arc<RwLock<Session>> {
        self.session.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Unreadable(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<TimelineError> for ApiError {
    fn from(value: TimelineError) -> Self {
        match value {
            TimelineError::UnknownTask(_) => ApiError::NotFound(value.to_string()),
            TimelineError::NotReady | TimelineError::DuplicateId(_) => {
                ApiError::Conflict(value.to_string())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(value: ImportError) -> Self {
        ApiError::Unreadable(format!("Error reading CSV file: {value}"))
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unreadable(message) => {
                (StatusCode::BAD_REQUEST, "source_unreadable", message)
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ImportParams {
    file_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    file_name: String,
    task_count: usize,
    anomalies: Vec<FieldAnomaly>,
    row_errors: Vec<RowError>,
    missing_columns: Vec<Column>,
    skipped_blank_rows: usize,
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    file_name: Option<String>,
    error: Option<String>,
    task_count: usize,
    ready: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/import", axum::routing::post(import_csv))
        .route("/session", get(get_session).delete(clear_session))
        .route("/timeline", get(get_timeline))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/export", get(export_csv))
        .route(&format!("/{SAMPLE_FILE_NAME}"), get(sample_csv))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, session: Session) -> std::io::Result<()> {
    let state = AppState::new(session);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn import_csv(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: Bytes,
) -> Result<Json<ImportSummary>, ApiError> {
    let file_name = params
        .file_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
    let session = state.session();
    let outcome = {
        let mut guard = session.write();
        guard.import(file_name.clone(), body.as_ref())?
    };
    Ok(Json(ImportSummary {
        file_name,
        task_count: outcome.tasks.len(),
        anomalies: outcome.anomalies,
        row_errors: outcome.row_errors,
        missing_columns: outcome.missing_columns,
        skipped_blank_rows: outcome.skipped_blank_rows,
    }))
}

async fn get_session(State(state): State<AppState>) -> Json<SessionStatus> {
    let session = state.session();
    let guard = session.read();
    Json(SessionStatus {
        file_name: guard.file_name().map(ToOwned::to_owned),
        error: guard.error().map(ToOwned::to_owned),
        task_count: guard.tasks().len(),
        ready: guard.engine().is_ready(),
    })
}

async fn clear_session(State(state): State<AppState>) -> StatusCode {
    let session = state.session();
    session.write().clear();
    StatusCode::NO_CONTENT
}

async fn get_timeline(State(state): State<AppState>) -> Json<TimelineView> {
    let session = state.session();
    let view = session.read().timeline_view();
    Json(view)
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let session = state.session();
    let tasks = session.read().engine().snapshot();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let session = state.session();
    let task = session.read().engine().find(&TaskId::new(task_id.as_str()));
    match task {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

async fn create_task(
    State(state): State<AppState>,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let session = state.session();
    {
        let mut guard = session.write();
        guard.apply(TaskEdit::Add(task.clone()))?;
    }
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(task): Json<Task>,
) -> Result<Json<Task>, ApiError> {
    if task.id.as_str() != task_id {
        return Err(ApiError::invalid(
            "task id in payload does not match path parameter",
        ));
    }
    let session = state.session();
    {
        let mut guard = session.write();
        guard.apply(TaskEdit::Update(task.clone()))?;
    }
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = state.session();
    {
        let mut guard = session.write();
        guard.apply(TaskEdit::Delete(TaskId::new(task_id)))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let session = state.session();
    let artifact = {
        let guard = session.read();
        guard.export_csv(Utc::now())?
    };
    let Some(artifact) = artifact else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.content,
    )
        .into_response())
}

async fn sample_csv() -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{SAMPLE_FILE_NAME}\"");
    (
        [
            (header::CONTENT_TYPE, crate::EXPORT_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        SAMPLE_CSV,
    )
}
