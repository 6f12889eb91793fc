//! HTTP Transport Utilities
//!
//! Conversion between hyper HTTP messages and JSON-RPC protocol messages.
//!
//! Every JSON-RPC response, including errors, is sent with status 200 except
//! where the HTTP layer itself rejects the request (bad API key, wrong HTTP
//! method, oversized body).
//!
//! # Example
//!
//! ```
//! use pomotodo_common::transport::http::HttpTransport;
//! use pomotodo_common::protocol::{JsonRpcRequest, JsonRpcResponse};
//! use serde_json::json;
//!
//! let body = serde_json::to_vec(&JsonRpcRequest::new(
//!     "todos.updateText",
//!     json!({"todoId": "t1", "newText": "x"}),
//!     json!(1),
//! ))
//! .unwrap();
//! let request = HttpTransport::parse_jsonrpc(body.into()).unwrap();
//! assert_eq!(request.method, "todos.updateText");
//!
//! let response = HttpTransport::to_http_response(JsonRpcResponse::success(json!(1), json!(null)));
//! assert_eq!(response.status(), hyper::StatusCode::OK);
//! ```

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;

use crate::protocol::error::{PomotodoError, Result};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};

/// Default upper bound for a request body (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Type alias for hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for hyper responses with a full body
pub type HyperResponse = Response<Full<Bytes>>;

/// HTTP <-> JSON-RPC conversion helpers.
pub struct HttpTransport;

impl HttpTransport {
    /// Parses a JSON-RPC request from an HTTP body.
    ///
    /// ```
    /// use pomotodo_common::transport::http::HttpTransport;
    /// use hyper::body::Bytes;
    ///
    /// let body = Bytes::from(r#"{"jsonrpc":"2.0","method":"todos.remove","params":{"todoId":"t1"},"id":1}"#);
    /// let request = HttpTransport::parse_jsonrpc(body).unwrap();
    /// assert_eq!(request.method, "todos.remove");
    /// ```
    pub fn parse_jsonrpc(body: Bytes) -> Result<JsonRpcRequest> {
        let request: JsonRpcRequest = serde_json::from_slice(&body)?;
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(PomotodoError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            )));
        }
        Ok(request)
    }

    /// Wraps a JSON-RPC response in a 200 OK HTTP response.
    pub fn to_http_response(jsonrpc: JsonRpcResponse) -> HyperResponse {
        Self::to_http_response_with_status(jsonrpc, StatusCode::OK)
    }

    /// Builds an HTTP response carrying a JSON-RPC error.
    pub fn to_http_error(id: Value, error: JsonRpcError) -> HyperResponse {
        Self::to_http_response(JsonRpcResponse::error(id, error))
    }

    /// Wraps a JSON-RPC response in an HTTP response with the given status.
    pub fn to_http_response_with_status(jsonrpc: JsonRpcResponse, status: StatusCode) -> HyperResponse {
        let body = serde_json::to_vec(&jsonrpc).unwrap_or_default();

        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
