//! Method router.
//!
//! Turns a parsed JSON-RPC request into a response:
//!
//! - **Built-in methods**: `_health`, `_info` and `_metrics` are answered
//!   directly and never rate limited
//! - **Todo and list methods**: checked against the rate limiter, then
//!   dispatched to their handler
//!
//! # Example
//!
//! ```
//! use pomotodo_server::http_router::MethodRouter;
//! use pomotodo_server::methods::MethodContext;
//! use pomotodo_server::store::MemoryStore;
//! use pomotodo_common::JsonRpcRequest;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let router = MethodRouter::new(Arc::new(MemoryStore::new()));
//! let request = JsonRpcRequest::new("_health", json!(null), json!(1));
//! let response = router.handle_request(request, &MethodContext::anonymous()).await;
//! assert_eq!(response.result, Some(json!({"status": "healthy"})));
//! # });
//! ```

use pomotodo_common::protocol::builtin::{
    HealthResponse, InfoResponse, HEALTH_METHOD, INFO_METHOD, METRICS_METHOD,
};
use pomotodo_common::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use pomotodo_common::rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
use pomotodo_common::transport::ConnectionId;
use pomotodo_metrics::MetricsRegistry;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::limits::MethodRateLimit;
use crate::methods::{self, names, MethodContext, MethodError, ALL_METHODS};
use crate::store::TodoStore;

/// Metrics label for calls to methods the router does not know.
const UNKNOWN_METHOD_LABEL: &str = "_unknown";

/// Dispatches JSON-RPC requests to the method handlers.
pub struct MethodRouter {
    store: Arc<dyn TodoStore>,
    method_limit: MethodRateLimit,
    limiter_config: RateLimitConfig,
    limiter: RateLimiter,
    metrics: Arc<MetricsRegistry>,
}

impl MethodRouter {
    /// Creates a router with the default limits (5 todo mutations per second
    /// per connection).
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        let method_limit = MethodRateLimit::default();
        let limiter_config = RateLimitConfig::default();
        let limiter = build_limiter(&method_limit, &limiter_config);
        Self {
            store,
            method_limit,
            limiter_config,
            limiter,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Replaces the todo mutation budget.
    pub fn with_method_rate_limit(mut self, limit: MethodRateLimit) -> Self {
        self.method_limit = limit;
        self.limiter = build_limiter(&self.method_limit, &self.limiter_config);
        self
    }

    /// Replaces the limiter housekeeping settings.
    pub fn with_rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.limiter_config = config;
        self.limiter = build_limiter(&self.method_limit, &self.limiter_config);
        self
    }

    pub fn store(&self) -> &Arc<dyn TodoStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn method_rate_limit(&self) -> &MethodRateLimit {
        &self.method_limit
    }

    /// Releases rate limit state held for a closed connection.
    pub async fn forget_connection(&self, connection: ConnectionId) {
        self.limiter.forget_connection(connection).await;
    }

    /// Handles a JSON-RPC request on behalf of the caller in `ctx`.
    ///
    /// Failures are returned as JSON-RPC error responses, never as `Err`.
    pub async fn handle_request(&self, req: JsonRpcRequest, ctx: &MethodContext) -> JsonRpcResponse {
        let id = req.id;

        match req.method.as_str() {
            HEALTH_METHOD => return builtin_response(id, &HealthResponse::healthy()),
            INFO_METHOD => {
                let methods = ALL_METHODS.iter().map(|m| m.to_string()).collect();
                return builtin_response(id, &InfoResponse::new(self.metrics.uptime_ms(), methods));
            }
            METRICS_METHOD => return builtin_response(id, &self.metrics.snapshot()),
            _ => {}
        }

        tracing::debug!(
            method = %req.method,
            connection = %ctx.connection(),
            user_id = ctx.user_id().unwrap_or("<anonymous>"),
            "dispatching"
        );

        let start = Instant::now();
        let outcome = self.dispatch(&req.method, req.params, ctx).await;

        let label = if ALL_METHODS.contains(&req.method.as_str()) {
            req.method.as_str()
        } else {
            UNKNOWN_METHOD_LABEL
        };
        self.metrics.record_call(label, start, outcome.is_ok());

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                match &err {
                    MethodError::RateLimited { retry_after } => tracing::warn!(
                        method = %req.method,
                        connection = %ctx.connection(),
                        retry_after_ms = retry_after.as_millis() as u64,
                        "rate limited"
                    ),
                    MethodError::Storage(_) | MethodError::Internal(_) => {
                        tracing::error!(method = %req.method, error = %err, "method failed")
                    }
                    _ => tracing::debug!(method = %req.method, error = %err, "method rejected"),
                }
                JsonRpcResponse::error(id, err.into())
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Value, ctx: &MethodContext) -> Result<Value, MethodError> {
        if let RateLimitResult::RateLimited { retry_after, .. } =
            self.limiter.check(method, ctx.connection()).await
        {
            return Err(MethodError::RateLimited { retry_after });
        }

        let store = self.store.as_ref();
        match method {
            names::TODOS_INSERT => methods::todos::insert(store, ctx, params).await,
            names::TODOS_MAKE_CHECKED => methods::todos::set_checked_status(store, ctx, params).await,
            names::TODOS_UPDATE_TEXT => methods::todos::update_text(store, ctx, params).await,
            names::TODOS_UPDATE_POMOS_ESTIMATED => {
                methods::todos::update_pomos_estimated(store, ctx, params).await
            }
            names::TODOS_POMOS_COMPLETED_PLUS_PLUS => {
                methods::todos::pomos_completed_plus_plus(store, ctx, params).await
            }
            names::TODOS_UPDATE_POMOS_COMPLETED => {
                methods::todos::update_pomos_completed(store, ctx, params).await
            }
            names::TODOS_REMOVE => methods::todos::remove(store, ctx, params).await,
            names::TODOS_IN_LIST => methods::todos::in_list(store, ctx, params).await,
            names::LISTS_INSERT => methods::lists::insert(store, ctx, params).await,
            other => Err(MethodError::MethodNotFound(other.to_string())),
        }
    }
}

fn build_limiter(limit: &MethodRateLimit, config: &RateLimitConfig) -> RateLimiter {
    RateLimiter::new(config.clone()).with_rule(limit.rule())
}

fn builtin_response<T: Serialize>(id: Value, body: &T) -> JsonRpcResponse {
    match serde_json::to_value(body) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
    }
}
