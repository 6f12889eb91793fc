//! HTTP server for pomotodo.
//!
//! Accepts HTTP/1.1 connections, spawns a tokio task per connection and
//! hands every JSON-RPC `POST` to the [`MethodRouter`].
//!
//! Per request the server:
//! - rejects anything but `POST`
//! - checks the API key when one is configured (HTTP 401 otherwise)
//! - reads the body up to the configured size limit
//! - binds the `X-User-Id` caller and the connection id into a
//!   [`MethodContext`]
//!
//! # Example
//!
//! ```no_run
//! use pomotodo_server::{HttpServer, MethodRouter, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = MethodRouter::new(Arc::new(MemoryStore::new()));
//!     let server = HttpServer::new(router);
//!     server.run("127.0.0.1:8080".parse().unwrap()).await.unwrap();
//! }
//! ```

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::http_router::MethodRouter;
use crate::methods::MethodContext;
use pomotodo_common::auth::{extract_user_id, AuthConfig, API_KEY_HEADER, USER_ID_HEADER};
use pomotodo_common::protocol::error::{PomotodoError, Result};
use pomotodo_common::protocol::{JsonRpcError, JsonRpcResponse};
use pomotodo_common::transport::{ConnectionId, HttpTransport, HyperRequest, HyperResponse, MAX_BODY_BYTES};

/// HTTP server for the pomotodo methods.
pub struct HttpServer {
    router: Arc<MethodRouter>,
    auth: AuthConfig,
    max_body_bytes: usize,
}

impl HttpServer {
    /// Creates a server without an API key and with the default 1 MiB body limit.
    pub fn new(router: MethodRouter) -> Self {
        Self {
            router: Arc::new(router),
            auth: AuthConfig::default(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    /// Sets the API key configuration.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the maximum accepted request body size.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn router(&self) -> &Arc<MethodRouter> {
        &self.router
    }

    /// Binds `addr` and serves until the listener fails.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PomotodoError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| PomotodoError::Transport(format!("Failed to get local address: {}", e)))?;
        tracing::info!(
            addr = %local_addr,
            auth = %self.auth,
            calls_per_window = self.router.method_rate_limit().calls_per_window,
            window_ms = self.router.method_rate_limit().window.as_millis() as u64,
            "HTTP server listening"
        );

        let server = Arc::new(self);
        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| PomotodoError::Transport(format!("Failed to accept connection: {}", e)))?;

            let server = server.clone();
            tokio::task::spawn(async move {
                server.serve_connection(stream, peer).await;
            });
        }
    }

    async fn serve_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let connection = ConnectionId::next();
        let metrics = self.router.metrics().clone();
        metrics.connection_opened();
        tracing::debug!(%connection, %peer, "connection opened");

        let io = TokioIo::new(stream);
        let server = self.clone();
        let service = service_fn(move |req| {
            let server = server.clone();
            async move { server.handle_request(req, connection).await }
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            tracing::error!(%connection, %peer, "Error serving connection: {}", err);
        }

        self.router.forget_connection(connection).await;
        metrics.connection_closed();
        tracing::debug!(%connection, "connection closed");
    }

    async fn handle_request(&self, req: HyperRequest, connection: ConnectionId) -> Result<HyperResponse> {
        if req.method() != Method::POST {
            return Ok(HttpTransport::to_http_error(
                Value::Null,
                JsonRpcError::invalid_request("Only POST requests are supported"),
            ));
        }

        let provided_key = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());
        if !self.auth.validate_api_key(provided_key) {
            tracing::warn!(%connection, "rejected request with missing or invalid API key");
            return Ok(HttpTransport::to_http_response_with_status(
                JsonRpcResponse::error(Value::Null, JsonRpcError::unauthorized()),
                StatusCode::UNAUTHORIZED,
            ));
        }

        let user_id = extract_user_id(
            req.headers()
                .get(USER_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
        );

        let body = match Limited::new(req.into_body(), self.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(%connection, limit = self.max_body_bytes, "request body too large");
                return Ok(HttpTransport::to_http_response_with_status(
                    JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::request_too_large(self.max_body_bytes),
                    ),
                    StatusCode::PAYLOAD_TOO_LARGE,
                ));
            }
            Err(err) => {
                return Err(PomotodoError::Transport(format!(
                    "Failed to read request body: {}",
                    err
                )))
            }
        };

        let jsonrpc_req = match HttpTransport::parse_jsonrpc(body) {
            Ok(req) => req,
            Err(PomotodoError::JsonSerialization(e)) if e.is_syntax() || e.is_eof() => {
                tracing::debug!(%connection, "Failed to parse JSON-RPC request: {}", e);
                return Ok(HttpTransport::to_http_error(Value::Null, JsonRpcError::parse_error()));
            }
            Err(e) => {
                tracing::debug!(%connection, "Invalid JSON-RPC request: {}", e);
                return Ok(HttpTransport::to_http_error(
                    Value::Null,
                    JsonRpcError::invalid_request(&e.to_string()),
                ));
            }
        };

        let ctx = MethodContext::new(user_id, connection);
        let jsonrpc_res = self.router.handle_request(jsonrpc_req, &ctx).await;
        Ok(HttpTransport::to_http_response(jsonrpc_res))
    }
}
