// Copyright 2025 Pomotodo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pomotodo Common Types and Transport
//!
//! This crate provides the protocol definitions, document model and HTTP
//! transport helpers shared by the pomotodo server, client and CLI.
//!
//! # Overview
//!
//! Pomotodo exposes a small set of named todo-list methods over JSON-RPC 2.0.
//! This crate contains the pieces both sides of the wire agree on:
//!
//! - **Protocol Layer**: JSON-RPC request/response types, error codes and the
//!   built-in `_health` / `_info` / `_metrics` response schemas
//! - **Model**: the `List` and `Todo` documents and the ownership capability checks
//! - **Transport Layer**: conversion between hyper HTTP messages and JSON-RPC
//! - **Auth**: optional shared API key and caller identity headers
//! - **Rate Limiting**: per-connection, per-rule fixed-window method limits
//!
//! # Example
//!
//! ```
//! use pomotodo_common::{JsonRpcError, JsonRpcResponse};
//! use serde_json::json;
//!
//! let ok = JsonRpcResponse::success(json!(1), json!("todo-id"));
//! let denied = JsonRpcResponse::error(
//!     json!(2),
//!     JsonRpcError::access_denied(
//!         "api.todos.insert.accessDenied",
//!         "Cannot add todos to a private list that is not yours",
//!     ),
//! );
//! assert!(ok.error.is_none());
//! assert!(denied.result.is_none());
//! ```

pub mod auth;
pub mod model;
pub mod protocol;
pub mod rate_limit;
pub mod transport;

pub use model::{List, Todo};
pub use protocol::*;
