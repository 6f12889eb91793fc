//! Method handlers.
//!
//! Every remote method is a plain async function taking the store, the
//! caller's [`MethodContext`] and the raw JSON params. Handlers validate the
//! params into a typed argument struct first, then check ownership, then
//! perform a single store mutation.

pub mod lists;
pub mod todos;

use pomotodo_common::protocol::jsonrpc::JsonRpcError;
use pomotodo_common::transport::ConnectionId;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

/// Remote method names.
pub mod names {
    pub const TODOS_INSERT: &str = "todos.insert";
    pub const TODOS_MAKE_CHECKED: &str = "todos.makeChecked";
    pub const TODOS_UPDATE_TEXT: &str = "todos.updateText";
    pub const TODOS_UPDATE_POMOS_ESTIMATED: &str = "todos.updatePomosEstimated";
    pub const TODOS_POMOS_COMPLETED_PLUS_PLUS: &str = "todos.pomosCompletedPlusPlus";
    pub const TODOS_UPDATE_POMOS_COMPLETED: &str = "todos.updatePomosCompleted";
    pub const TODOS_REMOVE: &str = "todos.remove";
    pub const TODOS_IN_LIST: &str = "todos.inList";
    pub const LISTS_INSERT: &str = "lists.insert";
}

/// The todo mutations sharing one per-connection call budget.
pub const RATE_LIMITED_METHODS: [&str; 7] = [
    names::TODOS_INSERT,
    names::TODOS_MAKE_CHECKED,
    names::TODOS_UPDATE_TEXT,
    names::TODOS_UPDATE_POMOS_ESTIMATED,
    names::TODOS_POMOS_COMPLETED_PLUS_PLUS,
    names::TODOS_UPDATE_POMOS_COMPLETED,
    names::TODOS_REMOVE,
];

/// Every method the router dispatches, built-ins excluded.
pub const ALL_METHODS: [&str; 9] = [
    names::TODOS_INSERT,
    names::TODOS_MAKE_CHECKED,
    names::TODOS_UPDATE_TEXT,
    names::TODOS_UPDATE_POMOS_ESTIMATED,
    names::TODOS_POMOS_COMPLETED_PLUS_PLUS,
    names::TODOS_UPDATE_POMOS_COMPLETED,
    names::TODOS_REMOVE,
    names::TODOS_IN_LIST,
    names::LISTS_INSERT,
];

/// Failure of a single method call.
#[derive(Error, Debug)]
pub enum MethodError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    AccessDenied { code: String, message: String },

    #[error("{message}")]
    NotFound { code: String, message: String },

    #[error(
        "Error, too many requests. Please slow down. You must wait {} seconds before trying again.",
        wait_seconds(.retry_after)
    )]
    RateLimited { retry_after: Duration },

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

fn wait_seconds(retry_after: &Duration) -> u64 {
    retry_after.as_millis().div_ceil(1000) as u64
}

impl MethodError {
    pub fn access_denied(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccessDenied {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable string code for errors that carry one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::AccessDenied { code, .. } | Self::NotFound { code, .. } => Some(code),
            Self::Validation(_) => Some(pomotodo_common::protocol::jsonrpc::VALIDATION_ERROR),
            Self::RateLimited { .. } => Some(pomotodo_common::protocol::jsonrpc::TOO_MANY_REQUESTS),
            _ => None,
        }
    }
}

impl From<MethodError> for JsonRpcError {
    fn from(err: MethodError) -> Self {
        match &err {
            MethodError::Validation(reason) => JsonRpcError::validation(reason),
            MethodError::AccessDenied { code, message } => JsonRpcError::access_denied(code, message),
            MethodError::NotFound { code, message } => JsonRpcError::not_found(code, message),
            MethodError::RateLimited { retry_after } => {
                JsonRpcError::rate_limited(&err.to_string(), *retry_after)
            }
            MethodError::MethodNotFound(_) => JsonRpcError::method_not_found(),
            MethodError::Storage(_) | MethodError::Internal(_) => {
                JsonRpcError::internal_error(&err.to_string())
            }
        }
    }
}

/// Per-call context: who is calling, over which connection.
#[derive(Debug, Clone)]
pub struct MethodContext {
    user_id: Option<String>,
    connection: ConnectionId,
}

impl MethodContext {
    pub fn new(user_id: Option<String>, connection: ConnectionId) -> Self {
        Self { user_id, connection }
    }

    /// Anonymous caller on a fresh connection.
    pub fn anonymous() -> Self {
        Self::new(None, ConnectionId::next())
    }

    /// Caller `user_id` on a fresh connection.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()), ConnectionId::next())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

/// Deserializes method params into an argument struct.
///
/// Params must be a JSON object; omitted params count as an empty object so
/// that missing fields are reported by name.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, MethodError> {
    let object = match params {
        Value::Null => Value::Object(Map::new()),
        Value::Object(_) => params,
        other => {
            return Err(MethodError::Validation(format!(
                "params must be an object, got {}",
                json_type(&other)
            )))
        }
    };

    serde_json::from_value(object).map_err(|e| MethodError::Validation(e.to_string()))
}

/// Rejects blank strings.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), MethodError> {
    if value.trim().is_empty() {
        return Err(MethodError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
