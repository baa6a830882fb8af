use async_trait::async_trait;
use super::todo::{NewTodo, Todo, TodoId, TodoPatch, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The todo collection. Implementations own id generation and timestamps.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> StoreResult<()>;
    async fn find_all(&self) -> StoreResult<Vec<Todo>>;
    async fn insert_one(&self, input: NewTodo) -> StoreResult<Todo>;
    async fn find_by_id_and_update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<Option<Todo>>;
    async fn find_by_id_and_delete(&self, id: TodoId) -> StoreResult<Option<Todo>>;
}
