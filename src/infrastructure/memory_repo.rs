use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    repository::{StoreResult, TodoRepository},
    todo::{normalize_text, NewTodo, Todo, TodoId, TodoPatch},
};

/// Keeps the collection in process memory, in insertion order. Nothing is persisted.
#[derive(Clone, Default)]
pub struct MemoryTodoRepository {
    items: Arc<RwLock<Vec<Todo>>>,
}

impl MemoryTodoRepository {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn init(&self) -> StoreResult<()> { Ok(()) }

    async fn find_all(&self) -> StoreResult<Vec<Todo>> { Ok(self.items.read().await.clone()) }

    async fn insert_one(&self, input: NewTodo) -> StoreResult<Todo> {
        let text = normalize_text(&input.text)?;
        let now = Utc::now().trunc_subsecs(3);
        let todo = Todo { id: TodoId::generate(), text, completed: false, created_at: now, updated_at: now };
        self.items.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn find_by_id_and_update(&self, id: TodoId, mut patch: TodoPatch) -> StoreResult<Option<Todo>> {
        patch.text = patch.text.as_deref().map(normalize_text).transpose()?;
        let mut items = self.items.write().await;
        let Some(todo) = items.iter_mut().find(|t| t.id == id) else { return Ok(None) };
        patch.apply(todo);
        todo.updated_at = Utc::now().trunc_subsecs(3);
        Ok(Some(todo.clone()))
    }

    async fn find_by_id_and_delete(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        let mut items = self.items.write().await;
        let Some(pos) = items.iter().position(|t| t.id == id) else { return Ok(None) };
        Ok(Some(items.remove(pos)))
    }
}
