use crate::domain::repository::{StoreResult, TodoRepository};
use crate::domain::todo::{NewTodo, Todo, TodoId, TodoPatch};
use async_trait::async_trait;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self) -> StoreResult<Vec<Todo>>;
    async fn create(&self, input: NewTodo) -> StoreResult<Todo>;
    async fn update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<Option<Todo>>;
    async fn delete(&self, id: TodoId) -> StoreResult<Option<Todo>>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self) -> StoreResult<Vec<Todo>> { self.repo.find_all().await }

    async fn create(&self, input: NewTodo) -> StoreResult<Todo> {
        let todo = self.repo.insert_one(input).await?;
        tracing::debug!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<Option<Todo>> {
        let updated = self.repo.find_by_id_and_update(id, patch).await?;
        tracing::debug!(%id, found = updated.is_some(), "todo update");
        Ok(updated)
    }

    async fn delete(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        let deleted = self.repo.find_by_id_and_delete(id).await?;
        tracing::debug!(%id, found = deleted.is_some(), "todo delete");
        Ok(deleted)
    }
}
