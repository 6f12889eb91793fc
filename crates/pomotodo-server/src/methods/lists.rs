//! `lists.*` methods.

use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, require_text, MethodContext, MethodError};
use crate::store::TodoStore;
use pomotodo_common::List;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsertArgs {
    pub name: String,
    pub private: bool,
}

/// `lists.insert`: creates a list and returns its id.
///
/// A private list is owned by the caller, so anonymous callers may only
/// create public lists.
pub async fn insert(store: &dyn TodoStore, ctx: &MethodContext, params: Value) -> Result<Value, MethodError> {
    let args: InsertArgs = parse_params(params)?;
    require_text("name", &args.name)?;

    let list = if args.private {
        let owner = ctx.user_id().ok_or_else(|| {
            MethodError::access_denied(
                "api.lists.insert.notLoggedIn",
                "Must be logged in to create a private list.",
            )
        })?;
        List::private(args.name, owner)
    } else {
        List::public(args.name)
    };

    let id = store.insert_list(list).await?;
    tracing::debug!(list_id = %id, private = args.private, "list inserted");
    Ok(Value::String(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_public_list() {
        let store = MemoryStore::new();
        let id = insert(&store, &MethodContext::anonymous(), json!({"name": "Groceries", "private": false}))
            .await
            .unwrap();

        let list = store.find_list(id.as_str().unwrap()).await.unwrap().unwrap();
        assert_eq!(list.name, "Groceries");
        assert!(!list.is_private());
        assert_eq!(list.incomplete_count, 0);
    }

    #[tokio::test]
    async fn test_insert_private_list_owned_by_caller() {
        let store = MemoryStore::new();
        let id = insert(&store, &MethodContext::user("alice"), json!({"name": "Diary", "private": true}))
            .await
            .unwrap();

        let list = store.find_list(id.as_str().unwrap()).await.unwrap().unwrap();
        assert_eq!(list.user_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_insert_private_list_requires_user() {
        let store = MemoryStore::new();
        let err = insert(&store, &MethodContext::anonymous(), json!({"name": "Diary", "private": true}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("api.lists.insert.notLoggedIn"));
        assert_eq!(store.list_count().await, 0);
    }

    #[tokio::test]
    async fn test_insert_validation() {
        let store = MemoryStore::new();
        let ctx = MethodContext::anonymous();
        for params in [json!({"name": "x"}), json!({"name": "", "private": false}), json!({"name": "x", "private": "no"})] {
            let result = insert(&store, &ctx, params).await;
            assert!(matches!(result, Err(MethodError::Validation(_))));
        }
    }
}
