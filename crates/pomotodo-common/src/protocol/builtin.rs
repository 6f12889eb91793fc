//! Built-in procedure response types
//!
//! Strongly-typed response schemas for the built-in RPC procedures
//! (`_health`, `_info`, `_metrics`). These are answered by the server itself,
//! are never rate limited and never reach the todo method handlers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the liveness procedure.
pub const HEALTH_METHOD: &str = "_health";
/// Name of the server info procedure.
pub const INFO_METHOD: &str = "_info";
/// Name of the metrics procedure.
pub const METRICS_METHOD: &str = "_metrics";

/// Returns whether `method` is answered by the server itself.
pub fn is_builtin(method: &str) -> bool {
    matches!(method, HEALTH_METHOD | INFO_METHOD | METRICS_METHOD)
}

// ============================================================================
// Health Response
// ============================================================================

/// Health check response returned by the `_health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Status of the server - always "healthy" when the endpoint responds
    pub status: String,
}

impl HealthResponse {
    /// Creates a new healthy response.
    ///
    /// # Example
    /// ```rust
    /// use pomotodo_common::protocol::builtin::HealthResponse;
    ///
    /// let response = HealthResponse::healthy();
    /// assert_eq!(response.status, "healthy");
    /// ```
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

// ============================================================================
// Info Response
// ============================================================================

/// Server info returned by the `_info` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoResponse {
    /// Version string from Cargo.toml
    pub version: String,
    /// Server uptime in milliseconds since start
    pub uptime_ms: u64,
    /// Method names this server dispatches (built-ins excluded)
    pub methods: Vec<String>,
}

impl InfoResponse {
    /// Creates a new info response for the running server.
    pub fn new(uptime_ms: u64, methods: Vec<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_ms,
            methods,
        }
    }
}

// ============================================================================
// Metrics Response Types
// ============================================================================

/// Call statistics for a single method.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodMetrics {
    /// Total number of times this method was dispatched
    pub call_count: u64,
    /// Number of calls that returned a result
    pub success_count: u64,
    /// Number of calls that returned an error (denied, invalid, limited, ...)
    pub failure_count: u64,
    /// Average latency in microseconds
    pub avg_latency_us: u64,
}

/// Snapshot of all metrics at a point in time, returned by `_metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of method calls dispatched
    pub total_requests: u64,
    /// Number of successfully completed calls
    pub successful_requests: u64,
    /// Number of failed calls
    pub failed_requests: u64,
    /// Current number of open client connections
    pub active_connections: u64,
    /// Server uptime in milliseconds
    pub uptime_ms: u64,
    /// Per-method metrics keyed by method name
    pub methods: HashMap<String, MethodMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("_health"));
        assert!(is_builtin("_info"));
        assert!(is_builtin("_metrics"));
        assert!(!is_builtin("todos.insert"));
        assert!(!is_builtin("_other"));
    }

    #[test]
    fn test_info_response_version() {
        let info = InfoResponse::new(42, vec!["todos.insert".into()]);
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.uptime_ms, 42);
        assert_eq!(info.methods, vec!["todos.insert".to_string()]);
    }

    #[test]
    fn test_metrics_snapshot_serialization() {
        let mut snapshot = MetricsSnapshot {
            total_requests: 3,
            successful_requests: 2,
            failed_requests: 1,
            ..Default::default()
        };
        snapshot.methods.insert(
            "todos.remove".into(),
            MethodMetrics {
                call_count: 3,
                success_count: 2,
                failure_count: 1,
                avg_latency_us: 10,
            },
        );

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["total_requests"], 3);
        assert_eq!(value["methods"]["todos.remove"]["failure_count"], 1);
    }
}
