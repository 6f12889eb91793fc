use serde_json::Value;
use thiserror::Error;

use super::jsonrpc::JsonRpcError;

#[derive(Error, Debug)]
pub enum PomotodoError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON-RPC error object returned by the server.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<Value>,
    },
}

impl PomotodoError {
    /// Returns the stable string code of a server error, if there is one.
    ///
    /// Method failures carry their code (e.g. `api.todos.remove.accessDenied`)
    /// in `data.error`.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            PomotodoError::Rpc { data: Some(data), .. } => {
                data.get("error").and_then(Value::as_str)
            }
            _ => None,
        }
    }

    /// Returns the JSON-RPC error code for server errors.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            PomotodoError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<JsonRpcError> for PomotodoError {
    fn from(err: JsonRpcError) -> Self {
        PomotodoError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<std::net::AddrParseError> for PomotodoError {
    fn from(err: std::net::AddrParseError) -> Self {
        PomotodoError::InvalidRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PomotodoError>;
