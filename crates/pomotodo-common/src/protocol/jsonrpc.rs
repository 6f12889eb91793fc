//! JSON-RPC 2.0 Protocol Types
//!
//! This module implements the JSON-RPC 2.0 envelope used by every pomotodo
//! method call.
//!
//! # JSON-RPC 2.0 Compliance
//!
//! - Request format: `{"jsonrpc": "2.0", "method": "...", "params": ..., "id": ...}`
//! - Response format: `{"jsonrpc": "2.0", "result": ..., "error": ..., "id": ...}`
//! - Error format: `{"code": ..., "message": "...", "data": ...}`
//!
//! # Error Codes
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params (argument validation failures)
//! - `-32603`: Internal error
//!
//! Server-defined codes in the `-32000` to `-32099` range:
//! - `-32001`: Request entity too large
//! - `-32002`: Unauthorized (missing or wrong API key)
//! - `-32003`: Access denied (ownership check failed)
//! - `-32004`: Document not found
//! - `-32005`: Too many requests (method rate limit)
//!
//! Method-level errors also carry a stable string code in `data.error`,
//! e.g. `api.todos.insert.accessDenied` or `too-many-requests`.
//!
//! # Example
//!
//! ```
//! use pomotodo_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse, JsonRpcError};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(
//!     "todos.remove",
//!     json!({"todoId": "abc"}),
//!     json!(1),
//! );
//! assert_eq!(request.jsonrpc, "2.0");
//!
//! let response = JsonRpcResponse::error(json!(1), JsonRpcError::method_not_found());
//! assert!(response.result.is_none());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// The only protocol version accepted by the server.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request
///
/// `params` may be omitted by the caller, in which case it is `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Parameter values
    #[serde(default)]
    pub params: Value,
    /// Request identifier (number, string, or null)
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    /// Builds a version 2.0 request.
    pub fn new(method: impl Into<String>, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response
///
/// Exactly one of `result` and `error` is meaningful. A successful call whose
/// result is `null` deserializes with `result == None` and `error == None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Result value on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier (must match the request id)
    pub id: Value,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Additional data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Invalid JSON was received by the server
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid Request object
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;
/// Request entity too large
pub const REQUEST_TOO_LARGE: i32 = -32001;
/// Missing or invalid API key
pub const UNAUTHORIZED: i32 = -32002;
/// Caller may not touch the referenced document
pub const ACCESS_DENIED: i32 = -32003;
/// Referenced document does not exist
pub const NOT_FOUND: i32 = -32004;
/// Method rate limit exceeded for this connection
pub const RATE_LIMITED: i32 = -32005;

/// String code carried by argument validation failures.
pub const VALIDATION_ERROR: &str = "validation-error";
/// String code carried by rate limit rejections.
pub const TOO_MANY_REQUESTS: &str = "too-many-requests";

impl JsonRpcError {
    fn bare(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches a `data` payload to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        Self::bare(PARSE_ERROR, "Parse error")
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(msg: &str) -> Self {
        Self::bare(INVALID_REQUEST, format!("Invalid Request: {}", msg))
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found() -> Self {
        Self::bare(METHOD_NOT_FOUND, "Method not found")
    }

    /// Create an argument validation error (-32602)
    ///
    /// The `data.error` code is always `validation-error`.
    pub fn validation(reason: &str) -> Self {
        Self::bare(INVALID_PARAMS, reason).with_data(json!({
            "error": VALIDATION_ERROR,
            "reason": reason,
        }))
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: &str) -> Self {
        Self::bare(INTERNAL_ERROR, msg)
    }

    /// Create a request too large error (-32001)
    pub fn request_too_large(limit: usize) -> Self {
        Self::bare(
            REQUEST_TOO_LARGE,
            format!("Request body too large (max {} bytes)", limit),
        )
    }

    /// Create an unauthorized error (-32002)
    pub fn unauthorized() -> Self {
        Self::bare(UNAUTHORIZED, "Missing or invalid API key")
    }

    /// Create an access denied error (-32003) with a stable string code.
    pub fn access_denied(error_code: &str, message: &str) -> Self {
        Self::bare(ACCESS_DENIED, message).with_data(json!({ "error": error_code }))
    }

    /// Create a not found error (-32004) with a stable string code.
    pub fn not_found(error_code: &str, message: &str) -> Self {
        Self::bare(NOT_FOUND, message).with_data(json!({ "error": error_code }))
    }

    /// Create a too-many-requests error (-32005).
    ///
    /// `data.timeToReset` holds the milliseconds until the caller's window
    /// reopens.
    pub fn rate_limited(message: &str, retry_after: Duration) -> Self {
        let time_to_reset = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX);
        Self::bare(RATE_LIMITED, message).with_data(json!({
            "error": TOO_MANY_REQUESTS,
            "timeToReset": time_to_reset,
        }))
    }
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Splits the response into its result or error.
    ///
    /// A success without a result (a `null` result on the wire) yields
    /// `Value::Null`.
    pub fn into_result(self) -> std::result::Result<Value, JsonRpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
