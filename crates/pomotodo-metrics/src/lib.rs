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

//! Pomotodo Metrics Collection
//!
//! Thread-safe call accounting for the pomotodo server. Every dispatched
//! method call is recorded with its latency and outcome; the `_metrics`
//! built-in returns a [`MetricsSnapshot`] of the counters.
//!
//! # Usage Example
//!
//! ```rust
//! use pomotodo_metrics::MetricsRegistry;
//! use std::time::Instant;
//!
//! let registry = MetricsRegistry::new();
//!
//! let start = Instant::now();
//! // ... dispatch todos.insert ...
//! registry.record_call("todos.insert", start, true);
//!
//! let snapshot = registry.snapshot();
//! assert_eq!(snapshot.total_requests, 1);
//! assert_eq!(snapshot.methods["todos.insert"].success_count, 1);
//! ```
//!
//! # Thread Safety
//!
//! Counters are atomics. The per-method map sits behind a `RwLock` that is
//! only write-locked when a method is seen for the first time.

mod registry;

pub use pomotodo_common::protocol::builtin::{MethodMetrics, MetricsSnapshot};
pub use registry::MetricsRegistry;
