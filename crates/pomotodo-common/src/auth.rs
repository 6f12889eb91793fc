//! Authentication and caller identity
//!
//! Two request headers are understood by the server:
//!
//! - `X-API-Key`: a shared secret between clients and the server. Only
//!   checked when the server is started with an API key.
//! - `X-User-Id`: the identity of the calling user, set by a trusted upstream
//!   (a session gateway, a reverse proxy). Absent or blank means anonymous.
//!
//! The user id is what list ownership checks compare against. Deciding who a
//! user *is* happens upstream; this service only binds the asserted id to the
//! method context.
//!
//! # Example
//!
//! ```
//! use pomotodo_common::auth::{AuthConfig, extract_user_id};
//!
//! let auth = AuthConfig::with_api_key("my-secret-key");
//! assert!(auth.validate_api_key(Some("my-secret-key")));
//! assert!(!auth.validate_api_key(None));
//!
//! assert_eq!(extract_user_id(Some(" alice ")), Some("alice".to_string()));
//! assert_eq!(extract_user_id(Some("")), None);
//! ```

use std::fmt;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the calling user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// API key configuration for the server.
///
/// Disabled by default: every request is accepted and only the user id header
/// matters.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    api_key: Option<String>,
}

impl AuthConfig {
    /// Requires every request to present `api_key` in `X-API-Key`.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Accepts requests without an API key.
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn requires_auth(&self) -> bool {
        self.api_key.is_some()
    }

    /// Validates the key sent by a client.
    ///
    /// Always `true` when no key is configured. A missing header fails when a
    /// key is configured. Comparison is constant-time.
    pub fn validate_api_key(&self, provided_key: Option<&str>) -> bool {
        match (&self.api_key, provided_key) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(expected), Some(provided)) => constant_time_eq(expected, provided),
        }
    }
}

impl fmt::Display for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.api_key {
            Some(_) => write!(f, "ApiKey(*****)"),
            None => write!(f, "Disabled"),
        }
    }
}

/// Compares two strings without short-circuiting on the first difference.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Reads the caller's user id from the `X-User-Id` header value.
///
/// Surrounding whitespace is ignored; a blank value is treated as anonymous.
pub fn extract_user_id(header_value: Option<&str>) -> Option<String> {
    header_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
