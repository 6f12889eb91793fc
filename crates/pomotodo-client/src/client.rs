use pomotodo_common::auth::{API_KEY_HEADER, USER_ID_HEADER};
use pomotodo_common::protocol::builtin::{
    HealthResponse, InfoResponse, MetricsSnapshot, HEALTH_METHOD, INFO_METHOD, METRICS_METHOD,
};
use pomotodo_common::protocol::error::{PomotodoError, Result};
use pomotodo_common::protocol::{JsonRpcRequest, JsonRpcResponse};
use pomotodo_common::Todo;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Client for the pomotodo JSON-RPC server.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct TodosClient {
    base_url: String,
    http: reqwest::Client,
    user_id: Option<String>,
    api_key: Option<String>,
}

impl TodosClient {
    /// Creates a client for the server at `base_url` (`http://` or `https://`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(PomotodoError::InvalidRequest(format!(
                "server URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            user_id: None,
            api_key: None,
        })
    }

    /// Sends `X-User-Id: user_id` with every call.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sends `X-API-Key: api_key` with every call.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Calls `method` and returns its raw result.
    ///
    /// JSON-RPC errors come back as [`PomotodoError::Rpc`].
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, params, json!(id));

        let mut builder = self.http.post(&self.base_url).json(&request);
        if let Some(user_id) = &self.user_id {
            builder = builder.header(USER_ID_HEADER, user_id);
        }
        if let Some(api_key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }

        tracing::debug!(method, id, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| PomotodoError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PomotodoError::Transport(e.to_string()))?;

        // Error statuses (401, 413) still carry a JSON-RPC error body.
        let jsonrpc: JsonRpcResponse = serde_json::from_slice(&body).map_err(|e| {
            PomotodoError::InvalidResponse(format!("HTTP {}: {}", status, e))
        })?;

        Ok(jsonrpc.into_result()?)
    }

    async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// `lists.insert`: returns the new list id.
    pub async fn insert_list(&self, name: &str, private: bool) -> Result<String> {
        self.call_typed("lists.insert", json!({"name": name, "private": private}))
            .await
    }

    /// `todos.insert`: returns the new todo id.
    pub async fn insert_todo(&self, list_id: &str, text: &str, pomos_estimated: u32) -> Result<String> {
        self.call_typed(
            "todos.insert",
            json!({"listId": list_id, "text": text, "pomosEstimated": pomos_estimated}),
        )
        .await
    }

    /// `todos.makeChecked`
    pub async fn set_checked_status(&self, todo_id: &str, checked: bool) -> Result<()> {
        self.call("todos.makeChecked", json!({"todoId": todo_id, "newCheckedStatus": checked}))
            .await
            .map(drop)
    }

    pub async fn update_text(&self, todo_id: &str, new_text: &str) -> Result<()> {
        self.call("todos.updateText", json!({"todoId": todo_id, "newText": new_text}))
            .await
            .map(drop)
    }

    pub async fn update_pomos_estimated(&self, todo_id: &str, new_number: u32) -> Result<()> {
        self.call(
            "todos.updatePomosEstimated",
            json!({"todoId": todo_id, "newNumber": new_number}),
        )
        .await
        .map(drop)
    }

    pub async fn pomos_completed_plus_plus(&self, todo_id: &str) -> Result<()> {
        self.call("todos.pomosCompletedPlusPlus", json!({"todoId": todo_id}))
            .await
            .map(drop)
    }

    pub async fn update_pomos_completed(&self, todo_id: &str, new_number: u32) -> Result<()> {
        self.call(
            "todos.updatePomosCompleted",
            json!({"todoId": todo_id, "newNumber": new_number}),
        )
        .await
        .map(drop)
    }

    pub async fn remove(&self, todo_id: &str) -> Result<()> {
        self.call("todos.remove", json!({"todoId": todo_id}))
            .await
            .map(drop)
    }

    /// `todos.inList`: the list's todos, oldest first.
    pub async fn todos_in_list(&self, list_id: &str) -> Result<Vec<Todo>> {
        self.call_typed("todos.inList", json!({"listId": list_id})).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.call_typed(HEALTH_METHOD, Value::Null).await
    }

    pub async fn info(&self) -> Result<InfoResponse> {
        self.call_typed(INFO_METHOD, Value::Null).await
    }

    pub async fn metrics(&self) -> Result<MetricsSnapshot> {
        self.call_typed(METRICS_METHOD, Value::Null).await
    }
}
