pub mod builtin;
pub mod error;
pub mod jsonrpc;

pub use builtin::{HealthResponse, InfoResponse, MethodMetrics, MetricsSnapshot};
pub use error::{PomotodoError, Result};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
