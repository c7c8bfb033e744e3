use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use todo_shared::{CreateTodoRequest, Todo, UpdateTodoRequest};

use crate::error::ApiError;
use crate::store::TodoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

/// Ids are bare decimal digits; `i64::from_str` alone would also take a sign.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    Some(raw)
        .filter(|raw| !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or(ApiError::Validation("Invalid todo ID"))
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected request body");
            Err(ApiError::Validation("Invalid request payload"))
        }
    }
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

pub async fn get_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    state.store.get(id).await?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let request = payload(body)?;
    if request.title.is_empty() {
        return Err(ApiError::Validation("Title is required"));
    }

    let todo = state.store.create(request.title, request.description).await?;
    tracing::info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let request = payload(body)?;

    state
        .store
        .update(id, request)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn delete_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> &'static str {
    "ok"
}
