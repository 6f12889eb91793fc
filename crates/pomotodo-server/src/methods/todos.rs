//! `todos.*` methods.
//!
//! Access rule shared by all of them: a todo may be touched by anyone when
//! its list is public, and only by the list's owner when it is private.
//! Denials carry the code `api.todos.<handler>.accessDenied`.

use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, require_text, MethodContext, MethodError};
use crate::store::{TodoStore, TodoUpdate};
use pomotodo_common::Todo;

const EDIT_DENIED: &str = "Cannot edit todos in a private list that is not yours";

fn code(handler: &str, kind: &str) -> String {
    format!("api.todos.{}.{}", handler, kind)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsertArgs {
    pub list_id: String,
    pub text: String,
    pub pomos_estimated: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetCheckedStatusArgs {
    pub todo_id: String,
    pub new_checked_status: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTextArgs {
    pub todo_id: String,
    pub new_text: String,
}

/// Arguments of `updatePomosEstimated` and `updatePomosCompleted`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateNumberArgs {
    pub todo_id: String,
    pub new_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoIdArgs {
    pub todo_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InListArgs {
    pub list_id: String,
}

/// Loads a todo and checks the caller may edit it.
async fn editable_todo(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    todo_id: &str,
    handler: &str,
    denied_message: &str,
) -> Result<Todo, MethodError> {
    let todo = store
        .find_todo(todo_id)
        .await?
        .ok_or_else(|| MethodError::not_found(code(handler, "notFound"), "Todo not found"))?;

    let list = store
        .find_list(&todo.list_id)
        .await?
        .ok_or_else(|| MethodError::not_found(code(handler, "notFound"), "List not found"))?;

    if !todo.editable_by(&list, ctx.user_id()) {
        tracing::warn!(
            todo_id,
            list_id = %list.id,
            user_id = ctx.user_id().unwrap_or("<anonymous>"),
            handler,
            "access denied"
        );
        return Err(MethodError::access_denied(code(handler, "accessDenied"), denied_message));
    }

    Ok(todo)
}

/// Applies `update` to an editable todo.
async fn update_editable(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    todo_id: &str,
    handler: &str,
    update: TodoUpdate,
) -> Result<Value, MethodError> {
    editable_todo(store, ctx, todo_id, handler, EDIT_DENIED).await?;
    store
        .update_todo(todo_id, update)
        .await?
        .ok_or_else(|| MethodError::not_found(code(handler, "notFound"), "Todo not found"))?;
    Ok(Value::Null)
}

/// `todos.insert`: creates an unchecked todo and returns its id.
pub async fn insert(store: &dyn TodoStore, ctx: &MethodContext, params: Value) -> Result<Value, MethodError> {
    let args: InsertArgs = parse_params(params)?;
    require_text("text", &args.text)?;

    let list = store
        .find_list(&args.list_id)
        .await?
        .ok_or_else(|| MethodError::not_found(code("insert", "notFound"), "List not found"))?;

    if !list.editable_by(ctx.user_id()) {
        return Err(MethodError::access_denied(
            code("insert", "accessDenied"),
            "Cannot add todos to a private list that is not yours",
        ));
    }

    let todo = Todo::new(list.id, args.text, args.pomos_estimated);
    let id = store.insert_todo(todo).await?;
    tracing::debug!(todo_id = %id, list_id = %args.list_id, "todo inserted");
    Ok(Value::String(id))
}

/// `todos.makeChecked`: sets the checked flag. Writing the current value is a no-op.
pub async fn set_checked_status(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    params: Value,
) -> Result<Value, MethodError> {
    let args: SetCheckedStatusArgs = parse_params(params)?;
    let todo = editable_todo(
        store,
        ctx,
        &args.todo_id,
        "setCheckedStatus",
        "Cannot edit checked status in a private list that is not yours",
    )
    .await?;

    if todo.checked == args.new_checked_status {
        return Ok(Value::Null);
    }

    store
        .update_todo(&args.todo_id, TodoUpdate::Checked(args.new_checked_status))
        .await?;
    Ok(Value::Null)
}

/// `todos.updateText`
pub async fn update_text(store: &dyn TodoStore, ctx: &MethodContext, params: Value) -> Result<Value, MethodError> {
    let args: UpdateTextArgs = parse_params(params)?;
    require_text("newText", &args.new_text)?;
    update_editable(store, ctx, &args.todo_id, "updateText", TodoUpdate::Text(args.new_text)).await
}

/// `todos.updatePomosEstimated`
pub async fn update_pomos_estimated(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    params: Value,
) -> Result<Value, MethodError> {
    let args: UpdateNumberArgs = parse_params(params)?;
    update_editable(
        store,
        ctx,
        &args.todo_id,
        "updatePomosEstimated",
        TodoUpdate::PomosEstimated(args.new_number),
    )
    .await
}

/// `todos.pomosCompletedPlusPlus`: one more finished pomodoro.
pub async fn pomos_completed_plus_plus(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    params: Value,
) -> Result<Value, MethodError> {
    let args: TodoIdArgs = parse_params(params)?;
    update_editable(
        store,
        ctx,
        &args.todo_id,
        "pomosCompletedPlusPlus",
        TodoUpdate::IncrementPomosCompleted,
    )
    .await
}

/// `todos.updatePomosCompleted`
pub async fn update_pomos_completed(
    store: &dyn TodoStore,
    ctx: &MethodContext,
    params: Value,
) -> Result<Value, MethodError> {
    let args: UpdateNumberArgs = parse_params(params)?;
    update_editable(
        store,
        ctx,
        &args.todo_id,
        "updatePomosCompleted",
        TodoUpdate::PomosCompleted(args.new_number),
    )
    .await
}

/// `todos.remove`
pub async fn remove(store: &dyn TodoStore, ctx: &MethodContext, params: Value) -> Result<Value, MethodError> {
    let args: TodoIdArgs = parse_params(params)?;
    editable_todo(
        store,
        ctx,
        &args.todo_id,
        "remove",
        "Cannot remove todos in a private list that is not yours",
    )
    .await?;

    store.remove_todo(&args.todo_id).await?;
    tracing::debug!(todo_id = %args.todo_id, "todo removed");
    Ok(Value::Null)
}

/// `todos.inList`: the todos of a readable list, oldest first.
pub async fn in_list(store: &dyn TodoStore, ctx: &MethodContext, params: Value) -> Result<Value, MethodError> {
    let args: InListArgs = parse_params(params)?;
    let list = store
        .find_list(&args.list_id)
        .await?
        .ok_or_else(|| MethodError::not_found(code("inList", "notFound"), "List not found"))?;

    if !list.editable_by(ctx.user_id()) {
        return Err(MethodError::access_denied(
            code("inList", "accessDenied"),
            "Cannot read todos in a private list that is not yours",
        ));
    }

    let todos = store.todos_in_list(&list.id).await?;
    serde_json::to_value(todos).map_err(|e| MethodError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use pomotodo_common::{List, Todo};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        store: MemoryStore,
        public_list: String,
        alice_list: String,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let public_list = store.insert_list(List::public("Shared")).await.unwrap();
        let alice_list = store.insert_list(List::private("Alice's", "alice")).await.unwrap();
        Fixture {
            store,
            public_list,
            alice_list,
        }
    }

    async fn insert_todo(f: &Fixture, list_id: &str, ctx: &MethodContext) -> String {
        let id = insert(
            &f.store,
            ctx,
            json!({"listId": list_id, "text": "Write report", "pomosEstimated": 3}),
        )
        .await
        .unwrap();
        id.as_str().unwrap().to_string()
    }

    fn assert_denied(result: Result<Value, MethodError>, expected_code: &str, expected_message: &str) {
        match result {
            Err(MethodError::AccessDenied { code, message }) => {
                assert_eq!(code, expected_code);
                assert_eq!(message, expected_message);
            }
            other => panic!("expected access denied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_creates_unchecked_todo() {
        let f = fixture().await;
        let id = insert_todo(&f, &f.public_list, &MethodContext::anonymous()).await;

        let todo = f.store.find_todo(&id).await.unwrap().unwrap();
        assert_eq!(todo.list_id, f.public_list);
        assert_eq!(todo.text, "Write report");
        assert!(!todo.checked);
        assert_eq!(todo.pomos_estimated, 3);
        assert_eq!(todo.pomos_completed, 0);

        let list = f.store.find_list(&f.public_list).await.unwrap().unwrap();
        assert_eq!(list.incomplete_count, 1);
    }

    #[tokio::test]
    async fn test_insert_into_foreign_private_list_denied() {
        let f = fixture().await;
        let params = json!({"listId": f.alice_list, "text": "Sneaky", "pomosEstimated": 1});

        for ctx in [MethodContext::user("bob"), MethodContext::anonymous()] {
            assert_denied(
                insert(&f.store, &ctx, params.clone()).await,
                "api.todos.insert.accessDenied",
                "Cannot add todos to a private list that is not yours",
            );
        }
        assert_eq!(f.store.todo_count().await, 0);

        insert(&f.store, &MethodContext::user("alice"), params).await.unwrap();
        assert_eq!(f.store.todo_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_missing_list() {
        let f = fixture().await;
        let err = insert(
            &f.store,
            &MethodContext::anonymous(),
            json!({"listId": "missing", "text": "x", "pomosEstimated": 1}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some("api.todos.insert.notFound"));
    }

    #[tokio::test]
    async fn test_insert_validation() {
        let f = fixture().await;
        let ctx = MethodContext::anonymous();
        let cases = [
            json!({"listId": f.public_list, "text": "x"}),
            json!({"listId": f.public_list, "text": "x", "pomosEstimated": "3"}),
            json!({"listId": f.public_list, "text": "x", "pomosEstimated": -1}),
            json!({"listId": f.public_list, "text": "   ", "pomosEstimated": 1}),
            json!({"listId": f.public_list, "text": "x", "pomosEstimated": 1, "checked": true}),
        ];
        for params in cases {
            let result = insert(&f.store, &ctx, params).await;
            assert!(matches!(result, Err(MethodError::Validation(_))), "{:?}", result);
        }
        assert_eq!(f.store.todo_count().await, 0);
    }

    #[tokio::test]
    async fn test_set_checked_status() {
        let f = fixture().await;
        let ctx = MethodContext::anonymous();
        let id = insert_todo(&f, &f.public_list, &ctx).await;

        let params = json!({"todoId": id, "newCheckedStatus": true});
        assert_eq!(set_checked_status(&f.store, &ctx, params.clone()).await.unwrap(), Value::Null);
        assert!(f.store.find_todo(&id).await.unwrap().unwrap().checked);
        assert_eq!(f.store.find_list(&f.public_list).await.unwrap().unwrap().incomplete_count, 0);

        // Same value: returns normally, nothing moves
        set_checked_status(&f.store, &ctx, params).await.unwrap();
        assert_eq!(f.store.find_list(&f.public_list).await.unwrap().unwrap().incomplete_count, 0);

        set_checked_status(&f.store, &ctx, json!({"todoId": id, "newCheckedStatus": false}))
            .await
            .unwrap();
        assert!(!f.store.find_todo(&id).await.unwrap().unwrap().checked);
        assert_eq!(f.store.find_list(&f.public_list).await.unwrap().unwrap().incomplete_count, 1);
    }

    #[tokio::test]
    async fn test_set_checked_status_noop_still_checks_access() {
        let f = fixture().await;
        let id = insert_todo(&f, &f.alice_list, &MethodContext::user("alice")).await;

        assert_denied(
            set_checked_status(
                &f.store,
                &MethodContext::user("bob"),
                json!({"todoId": id, "newCheckedStatus": false}),
            )
            .await,
            "api.todos.setCheckedStatus.accessDenied",
            "Cannot edit checked status in a private list that is not yours",
        );
    }

    /// Delegates to a `MemoryStore` and counts `update_todo` calls.
    struct CountingStore {
        inner: MemoryStore,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl TodoStore for CountingStore {
        async fn insert_list(&self, list: List) -> Result<String, StoreError> {
            self.inner.insert_list(list).await
        }

        async fn find_list(&self, id: &str) -> Result<Option<List>, StoreError> {
            self.inner.find_list(id).await
        }

        async fn insert_todo(&self, todo: Todo) -> Result<String, StoreError> {
            self.inner.insert_todo(todo).await
        }

        async fn find_todo(&self, id: &str) -> Result<Option<Todo>, StoreError> {
            self.inner.find_todo(id).await
        }

        async fn todos_in_list(&self, list_id: &str) -> Result<Vec<Todo>, StoreError> {
            self.inner.todos_in_list(list_id).await
        }

        async fn update_todo(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>, StoreError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update_todo(id, update).await
        }

        async fn remove_todo(&self, id: &str) -> Result<Option<Todo>, StoreError> {
            self.inner.remove_todo(id).await
        }
    }

    #[tokio::test]
    async fn test_set_checked_status_same_value_skips_write() {
        let store = CountingStore {
            inner: MemoryStore::new(),
            updates: AtomicUsize::new(0),
        };
        let ctx = MethodContext::anonymous();
        let list_id = store.insert_list(List::public("Shared")).await.unwrap();
        let id = insert(&store, &ctx, json!({"listId": list_id, "text": "Stretch", "pomosEstimated": 1}))
            .await
            .unwrap();

        set_checked_status(&store, &ctx, json!({"todoId": id, "newCheckedStatus": false}))
            .await
            .unwrap();
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);

        set_checked_status(&store, &ctx, json!({"todoId": id, "newCheckedStatus": true}))
            .await
            .unwrap();
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);

        set_checked_status(&store, &ctx, json!({"todoId": id, "newCheckedStatus": true}))
            .await
            .unwrap();
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_edits_on_foreign_private_list_denied() {
        let f = fixture().await;
        let id = insert_todo(&f, &f.alice_list, &MethodContext::user("alice")).await;
        let bob = MethodContext::user("bob");

        assert_denied(
            update_text(&f.store, &bob, json!({"todoId": id, "newText": "mine now"})).await,
            "api.todos.updateText.accessDenied",
            EDIT_DENIED,
        );
        assert_denied(
            update_pomos_estimated(&f.store, &bob, json!({"todoId": id, "newNumber": 9})).await,
            "api.todos.updatePomosEstimated.accessDenied",
            EDIT_DENIED,
        );
        assert_denied(
            pomos_completed_plus_plus(&f.store, &bob, json!({"todoId": id})).await,
            "api.todos.pomosCompletedPlusPlus.accessDenied",
            EDIT_DENIED,
        );
        assert_denied(
            update_pomos_completed(&f.store, &bob, json!({"todoId": id, "newNumber": 9})).await,
            "api.todos.updatePomosCompleted.accessDenied",
            EDIT_DENIED,
        );
        assert_denied(
            remove(&f.store, &bob, json!({"todoId": id})).await,
            "api.todos.remove.accessDenied",
            "Cannot remove todos in a private list that is not yours",
        );

        let todo = f.store.find_todo(&id).await.unwrap().unwrap();
        assert_eq!(todo.text, "Write report");
        assert_eq!(todo.pomos_estimated, 3);
        assert_eq!(todo.pomos_completed, 0);
    }

    #[tokio::test]
    async fn test_owner_edits_private_todo() {
        let f = fixture().await;
        let alice = MethodContext::user("alice");
        let id = insert_todo(&f, &f.alice_list, &alice).await;

        update_text(&f.store, &alice, json!({"todoId": id, "newText": "Final report"}))
            .await
            .unwrap();
        update_pomos_estimated(&f.store, &alice, json!({"todoId": id, "newNumber": 5}))
            .await
            .unwrap();
        update_pomos_completed(&f.store, &alice, json!({"todoId": id, "newNumber": 2}))
            .await
            .unwrap();

        let todo = f.store.find_todo(&id).await.unwrap().unwrap();
        assert_eq!(todo.text, "Final report");
        assert_eq!(todo.pomos_estimated, 5);
        assert_eq!(todo.pomos_completed, 2);
    }

    #[tokio::test]
    async fn test_pomos_completed_plus_plus() {
        let f = fixture().await;
        let ctx = MethodContext::anonymous();
        let id = insert_todo(&f, &f.public_list, &ctx).await;

        pomos_completed_plus_plus(&f.store, &ctx, json!({"todoId": id})).await.unwrap();
        assert_eq!(f.store.find_todo(&id).await.unwrap().unwrap().pomos_completed, 1);

        update_pomos_completed(&f.store, &ctx, json!({"todoId": id, "newNumber": 7}))
            .await
            .unwrap();
        pomos_completed_plus_plus(&f.store, &ctx, json!({"todoId": id})).await.unwrap();
        assert_eq!(f.store.find_todo(&id).await.unwrap().unwrap().pomos_completed, 8);
    }

    #[tokio::test]
    async fn test_remove_deletes_only_that_todo() {
        let f = fixture().await;
        let ctx = MethodContext::user("carol");
        let doomed = insert_todo(&f, &f.public_list, &ctx).await;
        let kept = insert_todo(&f, &f.public_list, &ctx).await;

        assert_eq!(remove(&f.store, &ctx, json!({"todoId": doomed})).await.unwrap(), Value::Null);
        assert_eq!(f.store.find_todo(&doomed).await.unwrap(), None);
        assert!(f.store.find_todo(&kept).await.unwrap().is_some());
        assert_eq!(f.store.find_list(&f.public_list).await.unwrap().unwrap().incomplete_count, 1);

        let err = remove(&f.store, &ctx, json!({"todoId": doomed})).await.unwrap_err();
        assert_eq!(err.code(), Some("api.todos.remove.notFound"));
    }

    #[tokio::test]
    async fn test_update_text_rejects_blank() {
        let f = fixture().await;
        let ctx = MethodContext::anonymous();
        let id = insert_todo(&f, &f.public_list, &ctx).await;

        let result = update_text(&f.store, &ctx, json!({"todoId": id, "newText": ""})).await;
        assert!(matches!(result, Err(MethodError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_todo_is_not_found() {
        let f = fixture().await;
        let err = update_pomos_estimated(
            &f.store,
            &MethodContext::anonymous(),
            json!({"todoId": "ghost", "newNumber": 1}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some("api.todos.updatePomosEstimated.notFound"));
    }

    #[tokio::test]
    async fn test_in_list() {
        let f = fixture().await;
        let alice = MethodContext::user("alice");
        insert_todo(&f, &f.alice_list, &alice).await;
        insert_todo(&f, &f.alice_list, &alice).await;

        let todos = in_list(&f.store, &alice, json!({"listId": f.alice_list})).await.unwrap();
        assert_eq!(todos.as_array().unwrap().len(), 2);
        assert_eq!(todos[0]["listId"], json!(f.alice_list));

        let err = in_list(&f.store, &MethodContext::user("bob"), json!({"listId": f.alice_list}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("api.todos.inList.accessDenied"));

        let empty = in_list(&f.store, &MethodContext::anonymous(), json!({"listId": f.public_list}))
            .await
            .unwrap();
        assert_eq!(empty, json!([]));
    }
}
