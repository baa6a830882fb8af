use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};
use tokio::sync::OnceCell;

use crate::domain::{
    repository::{StoreResult, TodoRepository},
    todo::{normalize_text, NewTodo, Todo, TodoId, TodoPatch},
};

const COLUMNS: &str = "id, text, completed, created_at, updated_at";

// The CHECK trims ASCII whitespace, NBSP and BOM only; it is a backstop for
// `normalize_text`, which already rejects every Unicode-whitespace-only text.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL CHECK (length(trim(text, char(9, 10, 11, 12, 13, 32, 160, 65279))) > 0),
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
    /// Set once the table exists; a failed attempt leaves it empty so the next call retries.
    schema: Arc<OnceCell<()>>,
}

impl SqliteTodoRepository {
    /// Opens the pool and establishes a first connection.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let (pool_options, options) = pool_options(database_url)?;
        let pool = pool_options.connect_with(options).await
            .with_context(|| format!("failed to connect to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool), schema: Arc::default() })
    }

    /// Builds the pool without touching the database; connections are made on
    /// first use, so an unreachable store surfaces as per-request failures.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let (pool_options, options) = pool_options(database_url)?;
        Ok(Self { pool: Arc::new(pool_options.connect_lazy_with(options)), schema: Arc::default() })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(SCHEMA)
                    .execute(&*self.pool)
                    .await
                    .context("failed to create todos table")?;
                Ok::<_, anyhow::Error>(())
            })
            .await?;
        Ok(())
    }
}

fn pool_options(database_url: &str) -> Result<(SqlitePoolOptions, SqliteConnectOptions)> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL {database_url:?}"))?
        .create_if_missing(true);
    // An in-memory database lives exactly as long as its connection.
    let pool_options = if database_url.starts_with("sqlite::memory:") {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    Ok((pool_options, options))
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> StoreResult<()> {
        self.ensure_schema().await?;
        Ok(())
    }

    async fn find_all(&self) -> StoreResult<Vec<Todo>> {
        self.ensure_schema().await?;
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM todos"))
            .fetch_all(&*self.pool)
            .await
            .context("failed to list todos")?;
        let todos = rows.iter().map(row_to_todo).collect::<Result<Vec<_>>>()?;
        Ok(todos)
    }

    async fn insert_one(&self, input: NewTodo) -> StoreResult<Todo> {
        let text = normalize_text(&input.text)?;
        self.ensure_schema().await?;
        let now = timestamp(Utc::now());
        let row = sqlx::query(&format!(
            "INSERT INTO todos (id, text, completed, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?3)
             RETURNING {COLUMNS}"
        ))
        .bind(TodoId::generate().to_string())
        .bind(text)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .context("failed to insert todo")?;
        Ok(row_to_todo(&row)?)
    }

    async fn find_by_id_and_update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<Option<Todo>> {
        let text = patch.text.as_deref().map(normalize_text).transpose()?;
        self.ensure_schema().await?;
        let row = sqlx::query(&format!(
            "UPDATE todos
             SET text = COALESCE(?2, text), completed = COALESCE(?3, completed), updated_at = ?4
             WHERE id = ?1
             RETURNING {COLUMNS}"
        ))
        .bind(id.to_string())
        .bind(text)
        .bind(patch.completed)
        .bind(timestamp(Utc::now()))
        .fetch_optional(&*self.pool)
        .await
        .with_context(|| format!("failed to update todo {id}"))?;
        Ok(row.as_ref().map(row_to_todo).transpose()?)
    }

    async fn find_by_id_and_delete(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        self.ensure_schema().await?;
        let row = sqlx::query(&format!("DELETE FROM todos WHERE id = ?1 RETURNING {COLUMNS}"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("failed to delete todo {id}"))?;
        Ok(row.as_ref().map(row_to_todo).transpose()?)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Todo {
        id: id.parse().with_context(|| format!("corrupt id column {id:?}"))?,
        text: row.try_get("text")?,
        completed: row.try_get("completed")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)?.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::StoreError;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn insert_trims_and_defaults_completed() {
        let repo = repo().await;
        let todo = repo.insert_one(NewTodo { text: "  Buy milk ".into() }).await.unwrap();
        assert_eq!(todo.text, "Buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(repo.find_all().await.unwrap(), vec![todo]);
    }

    #[tokio::test]
    async fn insert_rejects_blank_text() {
        let repo = repo().await;
        let err = repo.insert_one(NewTodo { text: "   ".into() }).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref e) if e.get("text").is_some()));
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let repo = repo().await;
        let created = repo.insert_one(NewTodo { text: "Walk dog".into() }).await.unwrap();
        let updated = repo
            .find_by_id_and_update(created.id, TodoPatch { text: None, completed: Some(true) })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.text, "Walk dog");
        assert!(updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let renamed = repo
            .find_by_id_and_update(created.id, TodoPatch { text: Some(" Walk cat ".into()), completed: None })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.text, "Walk cat");
        assert!(renamed.completed);
    }

    #[tokio::test]
    async fn update_and_delete_missing_return_none() {
        let repo = repo().await;
        let id = TodoId::generate();
        assert!(repo.find_by_id_and_update(id, TodoPatch { text: None, completed: Some(true) }).await.unwrap().is_none());
        assert!(repo.find_by_id_and_delete(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schema_is_created_once_the_store_becomes_available() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-yet");
        let url = format!("sqlite://{}", missing.join("todos.db").display());
        let repo = SqliteTodoRepository::connect_lazy(&url).unwrap();

        assert!(matches!(repo.init().await, Err(StoreError::Backend(_))));
        assert!(repo.find_all().await.is_err());

        std::fs::create_dir_all(&missing).unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
        let created = repo.insert_one(NewTodo { text: "Back online".into() }).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn operations_work_without_explicit_init() {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        let created = repo.insert_one(NewTodo { text: "No init".into() }).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn check_constraint_rejects_blank_rows_written_directly() {
        let repo = repo().await;
        for blank in ["", " \t\n ", "\u{a0}", "\u{feff}"] {
            let res = sqlx::query("INSERT INTO todos (id, text, completed, created_at, updated_at) VALUES (?1, ?2, 0, 'x', 'x')")
                .bind(TodoId::generate().to_string())
                .bind(blank)
                .execute(&*repo.pool)
                .await;
            assert!(res.is_err(), "{blank:?} was accepted");
        }
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let repo = repo().await;
        let created = repo.insert_one(NewTodo { text: "Gone soon".into() }).await.unwrap();
        let deleted = repo.find_by_id_and_delete(created.id).await.unwrap().unwrap();
        assert_eq!(deleted, created);
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}
