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

//! Pomotodo Client
//!
//! Async JSON-RPC client for the pomotodo server, with a typed wrapper for
//! every remote method.
//!
//! ```no_run
//! use pomotodo_client::TodosClient;
//!
//! # async fn demo() -> pomotodo_common::Result<()> {
//! let client = TodosClient::new("http://127.0.0.1:8080")?.with_user("alice");
//! let list_id = client.insert_list("Work", true).await?;
//! let todo_id = client.insert_todo(&list_id, "Write report", 3).await?;
//! client.pomos_completed_plus_plus(&todo_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::TodosClient;
