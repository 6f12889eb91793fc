//! Method Rate Limiting
//!
//! Throttles how often a single client connection may invoke a set of
//! methods. Limits are expressed as rules installed once when the server
//! starts:
//!
//! - a rule names the methods it matches,
//! - how many invocations it allows,
//! - and the window those invocations are counted in.
//!
//! Every (rule, connection) pair has its own fixed window. The window opens
//! at the first invocation the rule counts; once `interval` has elapsed the
//! next invocation opens a fresh window with a zero count. Rejected
//! invocations are not counted, so a client that backs off is served as soon
//! as its window reopens.
//!
//! When several rules match one method, the call must fit within all of them
//! and is counted against all of them.
//!
//! # Example
//!
//! ```
//! use pomotodo_common::rate_limit::{RateLimiter, RateLimitConfig, RateLimitRule};
//! use pomotodo_common::transport::ConnectionId;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let limiter = RateLimiter::new(RateLimitConfig::default()).with_rule(RateLimitRule::new(
//!     "todo-mutations",
//!     ["todos.insert", "todos.remove"],
//!     5,
//!     Duration::from_millis(1000),
//! ));
//!
//! let connection = ConnectionId::next();
//! for _ in 0..5 {
//!     assert!(limiter.check("todos.insert", connection).await.is_allowed());
//! }
//! assert!(!limiter.check("todos.remove", connection).await.is_allowed());
//!
//! // Methods no rule matches are never limited
//! assert!(limiter.check("_health", connection).await.is_allowed());
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::transport::ConnectionId;

/// A rate limit registration: which methods, how many calls, per which window.
#[derive(Clone, Debug)]
pub struct RateLimitRule {
    /// Rule name, used in logs
    pub name: String,
    methods: HashSet<String>,
    /// Maximum number of invocations per window
    pub num_requests: u32,
    /// Window length
    pub interval: Duration,
}

impl RateLimitRule {
    /// Creates a rule matching any of `methods`.
    pub fn new<I, S>(name: impl Into<String>, methods: I, num_requests: u32, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            methods: methods.into_iter().map(Into::into).collect(),
            num_requests,
            interval,
        }
    }

    pub fn matches(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    /// Names of the methods this rule matches, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.methods.iter().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

/// Housekeeping settings for the limiter's per-connection state.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// How often stale windows are pruned
    pub cleanup_interval: Duration,
    /// How long a window is kept without activity
    pub entry_ttl: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            entry_ttl: Duration::from_secs(300),
        }
    }
}

/// Result of a rate limit check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Invocation is allowed and has been counted
    Allowed,
    /// Invocation exceeds a rule's budget
    RateLimited {
        /// Name of the rule that rejected the call
        rule: String,
        /// Time until the rule's window reopens for this connection
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the retry-after duration if rate limited.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Allowed => None,
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
        }
    }
}

/// Counting window for one (rule, connection) pair.
#[derive(Debug)]
struct Window {
    opened_at: Instant,
    count: u32,
    last_seen: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            opened_at: now,
            count: 0,
            last_seen: now,
        }
    }

    /// Reopens the window if `interval` has passed since it opened.
    fn roll(&mut self, interval: Duration, now: Instant) {
        if now.saturating_duration_since(self.opened_at) >= interval {
            self.opened_at = now;
            self.count = 0;
        }
        self.last_seen = now;
    }

    fn time_to_reset(&self, interval: Duration, now: Instant) -> Duration {
        interval.saturating_sub(now.saturating_duration_since(self.opened_at))
    }
}

type WindowKey = (usize, ConnectionId);

/// Per-connection method rate limiter.
///
/// Cloning is cheap and yields a handle to the same counters. Rules are
/// fixed once the limiter is shared.
#[derive(Clone)]
pub struct RateLimiter {
    pub config: RateLimitConfig,
    rules: Arc<Vec<RateLimitRule>>,
    windows: Arc<RwLock<HashMap<WindowKey, Window>>>,
    last_cleanup: Arc<RwLock<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter without rules; every call is allowed until rules are added.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            rules: Arc::new(Vec::new()),
            windows: Arc::new(RwLock::new(HashMap::new())),
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
        }
    }

    /// Installs a rule.
    pub fn with_rule(mut self, rule: RateLimitRule) -> Self {
        Arc::make_mut(&mut self.rules).push(rule);
        self
    }

    /// Checks and counts an invocation of `method` on `connection`.
    pub async fn check(&self, method: &str, connection: ConnectionId) -> RateLimitResult {
        self.check_at(method, connection, Instant::now()).await
    }

    async fn check_at(&self, method: &str, connection: ConnectionId, now: Instant) -> RateLimitResult {
        let matching: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(method))
            .map(|(index, _)| index)
            .collect();

        if matching.is_empty() {
            return RateLimitResult::Allowed;
        }

        {
            let mut last_cleanup = self.last_cleanup.write().await;
            if now.saturating_duration_since(*last_cleanup) >= self.config.cleanup_interval {
                self.cleanup_stale_entries(now).await;
                *last_cleanup = now;
            }
        }

        let mut windows = self.windows.write().await;

        // All matching rules must have room before any of them is charged.
        let mut denied: Option<(usize, Duration)> = None;
        for &index in &matching {
            let rule = &self.rules[index];
            let window = windows
                .entry((index, connection))
                .or_insert_with(|| Window::new(now));
            window.roll(rule.interval, now);

            if window.count >= rule.num_requests {
                let wait = window.time_to_reset(rule.interval, now);
                if denied.map_or(true, |(_, longest)| wait > longest) {
                    denied = Some((index, wait));
                }
            }
        }

        if let Some((index, retry_after)) = denied {
            let rule = &self.rules[index];
            tracing::debug!(
                rule = %rule.name,
                %connection,
                method,
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            return RateLimitResult::RateLimited {
                rule: rule.name.clone(),
                retry_after,
            };
        }

        for &index in &matching {
            if let Some(window) = windows.get_mut(&(index, connection)) {
                window.count += 1;
            }
        }

        RateLimitResult::Allowed
    }

    async fn cleanup_stale_entries(&self, now: Instant) {
        let ttl = self.config.entry_ttl;
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| now.saturating_duration_since(window.last_seen) < ttl);
    }

    /// Drops all windows held for `connection`, e.g. once it has closed.
    pub async fn forget_connection(&self, connection: ConnectionId) {
        let mut windows = self.windows.write().await;
        windows.retain(|(_, owner), _| *owner != connection);
    }

    /// Number of (rule, connection) windows currently tracked.
    pub async fn tracked_window_count(&self) -> usize {
        self.windows.read().await.len()
    }
}
