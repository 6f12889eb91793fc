//! Method rate limit settings.

use pomotodo_common::rate_limit::RateLimitRule;
use std::time::Duration;

use crate::methods::RATE_LIMITED_METHODS;

/// Name of the rule covering the todo mutations.
pub const TODO_MUTATIONS_RULE: &str = "todo-mutations";

/// Per-connection call budget for the todo mutation methods.
///
/// All seven `todos.*` mutations draw from one budget per connection.
///
/// # Example
///
/// ```
/// use pomotodo_server::MethodRateLimit;
/// use std::time::Duration;
///
/// let limit = MethodRateLimit::new()
///     .with_calls_per_window(10)
///     .with_window(Duration::from_secs(2));
/// assert!(limit.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRateLimit {
    /// Calls allowed per window
    pub calls_per_window: u32,
    /// Window length
    pub window: Duration,
}

impl Default for MethodRateLimit {
    fn default() -> Self {
        Self {
            calls_per_window: 5,
            window: Duration::from_millis(1000),
        }
    }
}

impl MethodRateLimit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calls_per_window(mut self, calls: u32) -> Self {
        self.calls_per_window = calls;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Checks the settings make sense.
    ///
    /// The window must be non-zero and at most one hour; the budget must
    /// allow at least one call.
    pub fn validate(&self) -> Result<(), String> {
        if self.calls_per_window == 0 {
            return Err("calls per window must be greater than zero".to_string());
        }

        if self.window.is_zero() {
            return Err("rate limit window must be greater than zero".to_string());
        }

        if self.window > Duration::from_secs(3600) {
            return Err(format!(
                "rate limit window must be <= 1 hour (got {} ms)",
                self.window.as_millis()
            ));
        }

        Ok(())
    }

    /// The limiter rule these settings describe.
    pub fn rule(&self) -> RateLimitRule {
        RateLimitRule::new(
            TODO_MUTATIONS_RULE,
            RATE_LIMITED_METHODS,
            self.calls_per_window,
            self.window,
        )
    }
}
