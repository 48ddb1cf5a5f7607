//! REST endpoints for todos.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::model::{ListFilter, ListQuery, TodoItem, TodoPayload};
use super::response::{ApiError, Envelope};
use super::validation::validate;
use crate::error::DatabaseError;
use crate::store::Database;

/// Shared state for the todo routes.
#[derive(Clone)]
pub struct TodoState {
    pub db: Arc<dyn Database>,
    /// Deadline for each storage call made while serving a request.
    pub request_timeout: Duration,
}

impl TodoState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Builder: set the per-request storage deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run a storage call under the request deadline.
    ///
    /// On expiry the storage future is dropped, which cancels it.
    async fn storage<T>(
        &self,
        action: &'static str,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(|source| ApiError::Storage { action, source }),
            Err(_) => Err(ApiError::Storage {
                action,
                source: DatabaseError::Timeout {
                    operation: action,
                    timeout: self.request_timeout,
                },
            }),
        }
    }
}

/// Build the Axum router with the todo REST routes.
pub fn todo_routes(state: TodoState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/create/todo", post(create_todo))
        .route("/api/todo", get(list_todos))
        .route("/api/todo/{id}", get(get_todo).put(update_todo))
        .fallback(unknown_route)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Request decoding ────────────────────────────────────────────────────

/// Decode a JSON body, telling an empty body apart from a malformed one.
fn decode_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError> {
    let body = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyBody);
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Decode a todo body. A literal `null` body is an all-missing payload.
fn decode_payload(body: Result<Bytes, BytesRejection>) -> Result<TodoPayload, ApiError> {
    decode_body::<Option<TodoPayload>>(body).map(Option::unwrap_or_default)
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = path.map_err(|rejection| ApiError::InvalidId(rejection.body_text()))?;
    raw.parse().map_err(|_| {
        warn!(id = %raw, "Invalid todo ID format");
        ApiError::InvalidId(raw)
    })
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "todo-backend"
    }))
}

async fn unknown_route(uri: Uri) -> ApiError {
    debug!(%uri, "No route matched");
    ApiError::UnknownRoute(uri.path().to_string())
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    debug!(%method, %uri, "Method not allowed");
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

// ── Todo endpoints ──────────────────────────────────────────────────────

async fn create_todo(
    State(state): State<TodoState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Envelope>, ApiError> {
    info!("Received request to create todo");

    let payload = decode_payload(body)?;
    let draft = validate(payload).inspect_err(|errors| {
        warn!(errors = %errors, "Validation failed for new todo");
    })?;

    let id = state
        .storage("create todo", state.db.create_todo(&draft))
        .await?;

    info!(id, "Todo created");
    Ok(Json(
        Envelope::success("Todo created successfully").with_id(id),
    ))
}

async fn list_todos(
    State(state): State<TodoState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = query.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let filter = ListFilter::from(pairs.into_iter().collect::<ListQuery>());
    info!(filter = ?filter, "Listing todos");

    let todos: Vec<TodoItem> = match &filter {
        ListFilter::Status(status) => {
            state
                .storage("retrieve todos", state.db.list_todos_by_status(status))
                .await?
        }
        ListFilter::Upcoming => {
            state
                .storage("retrieve todos", state.db.list_upcoming_todos(Utc::now()))
                .await?
        }
        ListFilter::All => state.storage("retrieve todos", state.db.list_todos()).await?,
    };

    if todos.is_empty() {
        info!(filter = ?filter, "No todos found");
        return Ok(Json(Envelope::success("No todos found")).into_response());
    }

    info!(count = todos.len(), "Todos retrieved");
    Ok(Json(todos).into_response())
}

async fn get_todo(
    State(state): State<TodoState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TodoItem>, ApiError> {
    let id = parse_id(path)?;
    info!(id, "Get todo by ID");

    match state.storage("retrieve todo", state.db.get_todo(id)).await? {
        Some(todo) => Ok(Json(todo)),
        None => {
            info!(id, "Todo not found");
            Err(ApiError::NotFound(id))
        }
    }
}

async fn update_todo(
    State(state): State<TodoState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let id = parse_id(path)?;
    info!(id, "Update todo by ID");

    let mut payload = decode_payload(body)?;
    if let Some(body_id) = payload.id.filter(|body_id| *body_id != id) {
        debug!(id, body_id, "Body id overridden by path id");
    }
    payload.id = Some(id);

    let draft = validate(payload).inspect_err(|errors| {
        warn!(id, errors = %errors, "Validation failed for todo update");
    })?;

    let matched = state
        .storage("update todo", state.db.update_todo(id, &draft))
        .await?;
    if !matched {
        info!(id, "Todo not found for update");
        return Err(ApiError::NotFound(id));
    }

    info!(id, "Todo updated");
    Ok(Json(Envelope::success("Todo updated successfully")))
}
