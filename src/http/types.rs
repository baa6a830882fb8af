use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::Serialize;

use crate::domain::repository::StoreError;
use crate::domain::todo::{Todo, ValidationErrors};

/// Client-facing shape of a todo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Todo> for TodoView {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            text: todo.text,
            completed: todo.completed,
            created_at: todo.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: todo.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid input: {0}")]
    Invalid(ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    /// The cause is logged; the client only sees `message`.
    #[error("{message}: {cause:#}")]
    Internal { message: &'static str, cause: anyhow::Error },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self::BadRequest(message.into()) }

    pub fn not_found(message: impl Into<String>) -> Self { Self::NotFound(message.into()) }

    /// Maps a store failure; `message` is what the client sees on a 500.
    pub fn from_store(err: StoreError, message: &'static str) -> Self {
        match err {
            StoreError::Validation(errors) => Self::Invalid(errors),
            StoreError::Backend(cause) => Self::Internal { message, cause },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorBody { message, errors: None }),
            ApiError::Invalid(errors) => (StatusCode::BAD_REQUEST, ErrorBody { message: "invalid input data".into(), errors: Some(errors) }),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody { message, errors: None }),
            ApiError::Internal { message, cause } => {
                tracing::error!(error = ?cause, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody { message: format!("server error: {message}"), errors: None })
            }
        };
        (status, axum::Json(body)).into_response()
    }
}
