//! Document storage seam.
//!
//! Method handlers talk to a [`TodoStore`]; the server ships with the
//! in-memory [`MemoryStore`]. Every store call is atomic with respect to the
//! documents it touches, including the denormalized
//! `List::incomplete_count` it maintains on todo inserts, check-state
//! changes and removals.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use pomotodo_common::{List, Todo};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document '{0}' already exists")]
    DuplicateId(String),

    #[error("list '{0}' does not exist")]
    MissingList(String),
}

/// A single-field change to a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoUpdate {
    Checked(bool),
    Text(String),
    PomosEstimated(u32),
    PomosCompleted(u32),
    /// Adds one to `pomos_completed` in place.
    IncrementPomosCompleted,
}

#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// Stores a new list and returns its id.
    async fn insert_list(&self, list: List) -> Result<String, StoreError>;

    async fn find_list(&self, id: &str) -> Result<Option<List>, StoreError>;

    /// Stores a new todo under an existing list and returns its id.
    async fn insert_todo(&self, todo: Todo) -> Result<String, StoreError>;

    async fn find_todo(&self, id: &str) -> Result<Option<Todo>, StoreError>;

    /// Todos of a list, oldest first.
    async fn todos_in_list(&self, list_id: &str) -> Result<Vec<Todo>, StoreError>;

    /// Applies `update` and returns the updated todo, or `None` if it is gone.
    async fn update_todo(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>, StoreError>;

    /// Deletes a todo and returns it, or `None` if it did not exist.
    async fn remove_todo(&self, id: &str) -> Result<Option<Todo>, StoreError>;
}
