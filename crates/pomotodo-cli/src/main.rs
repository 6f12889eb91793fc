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

//! # Pomotodo CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Start the server with two seeded lists
//! pomotodo serve -b 0.0.0.0:8080 --seed-file lists.json
//!
//! # Start the server behind a shared API key with a looser method limit
//! pomotodo serve -b 0.0.0.0:8080 --api-key s3cret --method-calls-per-window 20
//!
//! # Call a method as alice (outputs raw JSON)
//! pomotodo call http://127.0.0.1:8080 todos.insert -u alice \
//!     -a '{"listId": "...", "text": "Write report", "pomosEstimated": 3}'
//! ```

use anyhow::Result;
use argh::FromArgs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pomotodo_common::auth::AuthConfig;
use pomotodo_server::{HttpServer, MemoryStore, MethodRateLimit, MethodRouter};

/// Validates that a URL string starts with http:// or https://
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

#[derive(FromArgs)]
/// Pomotodo - todo lists with pomodoro counters over JSON-RPC
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start the pomotodo JSON-RPC server
struct ServeArgs {
    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "\"127.0.0.1:8080\".into()")]
    bind: String,

    /// shared API key clients must send in X-API-Key
    #[argh(option)]
    api_key: Option<String>,

    /// todo mutations allowed per connection per window
    #[argh(option, default = "5")]
    method_calls_per_window: u32,

    /// length of the rate limit window in milliseconds
    #[argh(option, default = "1000")]
    method_window_ms: u64,

    /// maximum request body size in bytes
    #[argh(option, default = "pomotodo_common::transport::MAX_BODY_BYTES")]
    max_body_bytes: usize,

    /// JSON file of lists to create at startup
    #[argh(option)]
    seed_file: Option<PathBuf>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a method on a pomotodo server
struct CallArgs {
    /// server URL, including the http:// or https:// prefix
    #[argh(positional)]
    server_address: String,

    /// method name, e.g. todos.insert
    #[argh(positional)]
    method: String,

    /// JSON object with the method arguments
    #[argh(option, short = 'a', long = "args", default = "\"{}\".into()")]
    args: String,

    /// user id to call as (sent in X-User-Id)
    #[argh(option, short = 'u')]
    user: Option<String>,

    /// API key to send in X-API-Key
    #[argh(option)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // `call` prints raw JSON; keep stdout free of log lines.
    if !matches!(cli.command, Commands::Call(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;

    let method_limit = MethodRateLimit::new()
        .with_calls_per_window(args.method_calls_per_window)
        .with_window(Duration::from_millis(args.method_window_ms));
    method_limit
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid method rate limit: {}", e))?;

    if args.max_body_bytes == 0 {
        return Err(anyhow::anyhow!("--max-body-bytes must be greater than zero"));
    }

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &args.seed_file {
        let lists = pomotodo_server::seed::load_seed_file(path, store.as_ref()).await?;
        tracing::info!("Seeded {} lists from {}", lists.len(), path.display());
    }

    let router = MethodRouter::new(store).with_method_rate_limit(method_limit);
    let mut server = HttpServer::new(router).with_max_body_bytes(args.max_body_bytes);

    if let Some(api_key) = &args.api_key {
        tracing::info!("API key authentication enabled");
        server = server.with_auth(AuthConfig::with_api_key(api_key));
    }

    server.run(addr).await?;
    Ok(())
}

/// Executes the `call` subcommand and prints the raw JSON result.
async fn run_call(args: CallArgs) -> Result<()> {
    validate_http_url(&args.server_address, "server address")?;

    let params: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))?;

    let mut client = pomotodo_client::TodosClient::new(&args.server_address)?;
    if let Some(user) = args.user {
        client = client.with_user(user);
    }
    if let Some(api_key) = args.api_key {
        client = client.with_api_key(api_key);
    }

    let result = client.call(&args.method, params).await?;
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
