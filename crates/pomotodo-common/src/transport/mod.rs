//! Pomotodo Transport Layer
//!
//! JSON-RPC 2.0 travels over HTTP/1.1 POST requests. This module holds the
//! glue between hyper's HTTP types and the protocol types, plus the identity
//! of a client connection.
//!
//! # Components
//!
//! - **[`HttpTransport`]**: HTTP <-> JSON-RPC conversion helpers
//! - **[`HyperRequest`]** / **[`HyperResponse`]**: hyper type aliases
//! - **[`ConnectionId`]**: process-unique id of an accepted TCP connection,
//!   the unit method rate limits are counted per

pub mod connection;
pub mod http;

pub use connection::ConnectionId;
pub use http::{HttpTransport, HyperRequest, HyperResponse, MAX_BODY_BYTES};
