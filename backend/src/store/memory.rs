use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use todo_shared::{Todo, UpdateTodoRequest};
use tokio::sync::RwLock;

use super::{TodoChanges, TodoStore};
use crate::error::StoreError;

/// Process-local store for tests and `TODO_STORAGE=memory` runs.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    todos: BTreeMap<i64, Todo>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn create(&self, title: String, description: String) -> Result<Todo, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: inner.last_id,
            title,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        inner.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let inner = self.inner.read().await;
        let mut todos: Vec<Todo> = inner.todos.values().cloned().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }

    async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(self.inner.read().await.todos.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        request: UpdateTodoRequest,
    ) -> Result<Option<Todo>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(todo) = inner.todos.get_mut(&id) else {
            return Ok(None);
        };
        TodoChanges::resolve(todo, request).apply(todo, Utc::now());
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.inner.write().await.todos.remove(&id);
        Ok(())
    }
}
