use axum::{extract::{rejection::JsonRejection, Path, State}, routing::{get, put}, Json, Router};
use axum::http::StatusCode;
use serde_json::Value;

use crate::{
    application::todo_service::TodoService,
    domain::todo::{trim_text, NewTodo, TodoId, TodoPatch},
    http::types::{ApiError, TodoView},
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/api/todos/:id", put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<TodoView>>, ApiError> {
    let todos = state.service.list().await.map_err(|e| ApiError::from_store(e, "failed to list todos"))?;
    Ok(Json(todos.into_iter().map(TodoView::from).collect()))
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoView>), ApiError> {
    let input = create_input(&json_body(payload)?)?;
    let todo = state.service.create(input).await.map_err(|e| ApiError::from_store(e, "failed to create todo"))?;
    Ok((StatusCode::CREATED, Json(todo.into())))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TodoView>, ApiError> {
    let patch = update_patch(&json_body(payload)?)?;
    let id = parse_id(&id)?;
    let updated = state.service.update(id, patch).await.map_err(|e| ApiError::from_store(e, "failed to update todo"))?;
    match updated {
        Some(t) => Ok(Json(t.into())),
        None => Err(ApiError::not_found("todo to update was not found")),
    }
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state.service.delete(id).await.map_err(|e| ApiError::from_store(e, "failed to delete todo"))?;
    if deleted.is_some() { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::not_found("todo to delete was not found")) }
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(v)| v).map_err(|rejection| ApiError::bad_request(format!("invalid JSON body: {}", rejection.body_text())))
}

fn create_input(body: &Value) -> Result<NewTodo, ApiError> {
    match body.get("text") {
        Some(Value::String(text)) if !trim_text(text).is_empty() => Ok(NewTodo { text: trim_text(text).to_string() }),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(ApiError::bad_request("todo text must not be empty")),
        Some(_) => Err(ApiError::bad_request("todo text must be a string")),
    }
}

/// Only a boolean `completed` and a string `text` are recognised; anything else is ignored.
fn update_patch(body: &Value) -> Result<TodoPatch, ApiError> {
    let completed = body.get("completed").and_then(Value::as_bool);
    let text = match body.get("text").and_then(Value::as_str) {
        Some(t) if trim_text(t).is_empty() => return Err(ApiError::bad_request("todo text must not be empty when updating it")),
        Some(t) => Some(trim_text(t).to_string()),
        None => None,
    };
    let patch = TodoPatch { text, completed };
    if patch.is_empty() {
        return Err(ApiError::bad_request(r#"request body must include "completed" or "text""#));
    }
    Ok(patch)
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { s.parse().map_err(|_| ApiError::bad_request("invalid todo id format")) }
