use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{StoreError, TodoStore, TodoUpdate};
use pomotodo_common::{List, Todo};

#[derive(Debug, Default)]
struct Collections {
    lists: HashMap<String, List>,
    todos: HashMap<String, Todo>,
}

impl Collections {
    fn adjust_incomplete(&mut self, list_id: &str, delta: i64) {
        if let Some(list) = self.lists.get_mut(list_id) {
            let count = i64::from(list.incomplete_count) + delta;
            list.incomplete_count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        }
    }
}

/// In-memory store. Both collections share one lock so the incomplete
/// counter moves together with the todo it describes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_count(&self) -> usize {
        self.inner.read().await.lists.len()
    }

    pub async fn todo_count(&self) -> usize {
        self.inner.read().await.todos.len()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert_list(&self, list: List) -> Result<String, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.lists.contains_key(&list.id) {
            return Err(StoreError::DuplicateId(list.id));
        }
        let id = list.id.clone();
        inner.lists.insert(id.clone(), list);
        Ok(id)
    }

    async fn find_list(&self, id: &str) -> Result<Option<List>, StoreError> {
        Ok(self.inner.read().await.lists.get(id).cloned())
    }

    async fn insert_todo(&self, todo: Todo) -> Result<String, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.lists.contains_key(&todo.list_id) {
            return Err(StoreError::MissingList(todo.list_id));
        }
        if inner.todos.contains_key(&todo.id) {
            return Err(StoreError::DuplicateId(todo.id));
        }

        if !todo.checked {
            inner.adjust_incomplete(&todo.list_id, 1);
        }
        let id = todo.id.clone();
        inner.todos.insert(id.clone(), todo);
        Ok(id)
    }

    async fn find_todo(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        Ok(self.inner.read().await.todos.get(id).cloned())
    }

    async fn todos_in_list(&self, list_id: &str) -> Result<Vec<Todo>, StoreError> {
        let inner = self.inner.read().await;
        let mut todos: Vec<Todo> = inner
            .todos
            .values()
            .filter(|todo| todo.list_id == list_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(todos)
    }

    async fn update_todo(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(todo) = inner.todos.get_mut(id) else {
            return Ok(None);
        };

        let mut incomplete_delta = 0;
        match update {
            TodoUpdate::Checked(checked) => {
                if todo.checked != checked {
                    incomplete_delta = if checked { -1 } else { 1 };
                }
                todo.checked = checked;
            }
            TodoUpdate::Text(text) => todo.text = text,
            TodoUpdate::PomosEstimated(n) => todo.pomos_estimated = n,
            TodoUpdate::PomosCompleted(n) => todo.pomos_completed = n,
            TodoUpdate::IncrementPomosCompleted => {
                // Pinned at u32::MAX; the call still succeeds.
                todo.pomos_completed = todo.pomos_completed.saturating_add(1);
            }
        }

        let updated = todo.clone();
        if incomplete_delta != 0 {
            inner.adjust_incomplete(&updated.list_id, incomplete_delta);
        }
        Ok(Some(updated))
    }

    async fn remove_todo(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.todos.remove(id);
        if let Some(todo) = &removed {
            if !todo.checked {
                inner.adjust_incomplete(&todo.list_id, -1);
            }
        }
        Ok(removed)
    }
}
