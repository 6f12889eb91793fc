//! Todo and List documents.
//!
//! Both documents serialize with camelCase field names, matching the method
//! argument names on the wire (`listId`, `pomosEstimated`, ...).
//!
//! Ownership is expressed through the list: a list with an owner (`userId`)
//! is private and only its owner may touch it or its todos. A list without an
//! owner is public and editable by anyone, including anonymous callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn new_document_id() -> String {
    Uuid::new_v4().to_string()
}

/// A container of todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub name: String,
    /// Owner of a private list; `None` for public lists.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Number of unchecked todos in the list.
    #[serde(default)]
    pub incomplete_count: u32,
}

impl List {
    /// Creates a list with a fresh id. Passing an owner makes it private.
    pub fn new(name: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            id: new_document_id(),
            name: name.into(),
            user_id: owner,
            incomplete_count: 0,
        }
    }

    /// Creates a public list.
    pub fn public(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Creates a private list owned by `owner`.
    pub fn private(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::new(name, Some(owner.into()))
    }

    pub fn is_private(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns whether `user_id` may read or change this list and its todos.
    ///
    /// Public lists are editable by everyone. Private lists only by their owner;
    /// an anonymous caller never owns a list.
    pub fn editable_by(&self, user_id: Option<&str>) -> bool {
        match self.user_id.as_deref() {
            None => true,
            Some(owner) => user_id == Some(owner),
        }
    }
}

/// A single checklist item with pomodoro counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub list_id: String,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pomos_estimated: u32,
    /// Older documents may lack the counter; it reads as zero.
    #[serde(default)]
    pub pomos_completed: u32,
}

impl Todo {
    /// Creates an unchecked todo with no completed pomodoros.
    pub fn new(list_id: impl Into<String>, text: impl Into<String>, pomos_estimated: u32) -> Self {
        Self {
            id: new_document_id(),
            list_id: list_id.into(),
            text: text.into(),
            checked: false,
            created_at: Utc::now(),
            pomos_estimated,
            pomos_completed: 0,
        }
    }

    /// Returns whether `user_id` may change this todo, given its owning list.
    pub fn editable_by(&self, list: &List, user_id: Option<&str>) -> bool {
        self.list_id == list.id && list.editable_by(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_public_list_editable_by_anyone() {
        let list = List::public("Groceries");
        assert!(!list.is_private());
        assert!(list.editable_by(None));
        assert!(list.editable_by(Some("alice")));
    }

    #[test]
    fn test_private_list_editable_by_owner_only() {
        let list = List::private("Secrets", "alice");
        assert!(list.is_private());
        assert!(list.editable_by(Some("alice")));
        assert!(!list.editable_by(Some("bob")));
        assert!(!list.editable_by(None));
    }

    #[test]
    fn test_todo_defaults() {
        let todo = Todo::new("list-1", "Write report", 3);
        assert!(!todo.checked);
        assert_eq!(todo.pomos_estimated, 3);
        assert_eq!(todo.pomos_completed, 0);
        assert_eq!(todo.list_id, "list-1");
        assert!(!todo.id.is_empty());
    }

    #[test]
    fn test_todo_editable_follows_list() {
        let list = List::private("Work", "alice");
        let todo = Todo::new(list.id.clone(), "Plan sprint", 2);
        assert!(todo.editable_by(&list, Some("alice")));
        assert!(!todo.editable_by(&list, Some("bob")));

        let other = List::public("Elsewhere");
        assert!(!todo.editable_by(&other, Some("alice")));
    }

    #[test]
    fn test_todo_wire_format_is_camel_case() {
        let todo = Todo::new("list-1", "Read", 1);
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["listId"], "list-1");
        assert_eq!(value["pomosEstimated"], 1);
        assert_eq!(value["pomosCompleted"], 0);
        assert!(value["createdAt"].is_string());
    }

    #[test]
    fn test_todo_missing_counters_read_as_zero() {
        let todo: Todo = serde_json::from_value(json!({
            "id": "t1",
            "listId": "l1",
            "text": "Old todo",
            "createdAt": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(todo.pomos_completed, 0);
        assert_eq!(todo.pomos_estimated, 0);
        assert!(!todo.checked);
    }

    #[test]
    fn test_list_ids_are_unique() {
        assert_ne!(List::public("a").id, List::public("a").id);
    }
}
