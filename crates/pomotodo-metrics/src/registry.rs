use pomotodo_common::protocol::builtin::{MethodMetrics, MetricsSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};
use std::time::Instant;

/// Counters for a single method.
#[derive(Debug, Default)]
struct MethodStats {
    call_count: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MethodStats {
    fn record(&self, latency_us: u64, success: bool) {
        // Counters are independent; snapshots are best-effort.
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> MethodMetrics {
        let call_count = self.call_count.load(Ordering::Relaxed);
        let total_latency_us = self.total_latency_us.load(Ordering::Relaxed);

        MethodMetrics {
            call_count,
            success_count: self.success_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            avg_latency_us: total_latency_us.checked_div(call_count).unwrap_or(0),
        }
    }
}

/// Registry of server-wide and per-method counters.
///
/// # Example
///
/// ```rust
/// use pomotodo_metrics::MetricsRegistry;
///
/// let registry = MetricsRegistry::new();
/// registry.record_method_call("todos.remove", 120, false);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.failed_requests, 1);
/// assert_eq!(snapshot.methods["todos.remove"].avg_latency_us, 120);
/// ```
#[derive(Debug)]
pub struct MetricsRegistry {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    active_connections: AtomicU64,
    methods: StdRwLock<HashMap<String, Arc<MethodStats>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            methods: StdRwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a finished call that started at `start`.
    pub fn record_call(&self, method: &str, start: Instant, success: bool) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.record_method_call(method, latency_us, success);
    }

    /// Records a call with an already measured latency.
    pub fn record_method_call(&self, method: &str, latency_us: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        self.method_stats(method).record(latency_us, success);
    }

    fn method_stats(&self, method: &str) -> Arc<MethodStats> {
        // A panic while holding the lock cannot leave the map half-updated,
        // so a poisoned lock is still usable.
        if let Some(stats) = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
        {
            return stats.clone();
        }

        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method.to_string())
            .or_default()
            .clone()
    }

    /// Call when a client connection is accepted.
    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Call when a client connection is closed.
    pub fn connection_closed(&self) {
        // Never wraps below zero, even on an unmatched close.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Milliseconds since the registry was created.
    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let methods = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            active_connections: self.active_connections(),
            uptime_ms: self.uptime_ms(),
            methods,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
