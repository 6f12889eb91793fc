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

//! Pomotodo Server
//!
//! JSON-RPC 2.0 server for the pomotodo todo-list methods. The server owns a
//! [`TodoStore`], checks list ownership for every mutation and throttles the
//! todo mutations per client connection.
//!
//! - [`store`]: storage trait and the in-memory store
//! - [`methods`]: the `todos.*` and `lists.*` handlers
//! - [`http_router`]: built-ins, rate limiting and dispatch
//! - [`http_server`]: hyper HTTP/1.1 server

pub mod http_router;
pub mod http_server;
pub mod limits;
pub mod methods;
pub mod seed;
pub mod store;

pub use http_router::MethodRouter;
pub use http_server::HttpServer;
pub use limits::MethodRateLimit;
pub use methods::{MethodContext, MethodError};
pub use store::{MemoryStore, StoreError, TodoStore, TodoUpdate};
