use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn generate() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed todo id: {0:?}")]
pub struct InvalidTodoId(pub String);

impl FromStr for TodoId {
    type Err = InvalidTodoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TodoId).map_err(|_| InvalidTodoId(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a new todo. `completed` always starts out `false`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub text: String,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool { self.text.is_none() && self.completed.is_none() }

    pub fn apply(self, todo: &mut Todo) {
        if let Some(t) = self.text { todo.text = t; }
        if let Some(c) = self.completed { todo.completed = c; }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: String,
    pub message: String,
    pub path: String,
}

/// Field-level validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("todo validation failed: {0:?}")]
pub struct ValidationErrors(pub BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn single(path: &str, kind: &str, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(path.to_string(), FieldError { kind: kind.into(), message: message.into(), path: path.into() });
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> { self.0.get(field) }
}

/// Strips Unicode whitespace and the byte-order mark from both ends.
pub fn trim_text(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Schema rule for `text`: trimmed, and required to be non-empty afterwards.
///
/// Every store implementation runs this on insert and update, independent of
/// whatever the HTTP layer already checked.
pub fn normalize_text(raw: &str) -> Result<String, ValidationErrors> {
    let trimmed = trim_text(raw);
    if trimmed.is_empty() {
        return Err(ValidationErrors::single("text", "required", "Path `text` is required."));
    }
    Ok(trimmed.to_string())
}
