//! CLI Integration Tests
//!
//! Runs the `pomotodo` binary against an in-process server.

use pomotodo_server::{HttpServer, MemoryStore, MethodRouter};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::process::Command;

async fn start_server() -> String {
    let server = HttpServer::new(MethodRouter::new(Arc::new(MemoryStore::new())));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));
    format!("http://{}", addr)
}

async fn pomotodo(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pomotodo"))
        .args(args)
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_call_prints_raw_json() {
    let url = start_server().await;
    let output = pomotodo(&["call", &url, "_health"]).await;

    assert!(output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], "healthy");
}

#[tokio::test]
async fn test_call_as_user() {
    let url = start_server().await;
    let output = pomotodo(&[
        "call",
        &url,
        "lists.insert",
        "-u",
        "alice",
        "-a",
        r#"{"name": "Mine", "private": true}"#,
    ])
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let list_id: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(list_id.is_string());
}

#[tokio::test]
async fn test_call_failure_exits_nonzero() {
    let url = start_server().await;
    let output = pomotodo(&[
        "call",
        &url,
        "lists.insert",
        "-a",
        r#"{"name": "Mine", "private": true}"#,
    ])
    .await;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_call_rejects_invalid_json_args() {
    let url = start_server().await;
    let output = pomotodo(&["call", &url, "todos.remove", "-a", "{oops"]).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid JSON in args"));
}

#[tokio::test]
async fn test_call_requires_http_prefix() {
    let output = pomotodo(&["call", "127.0.0.1:8080", "_health"]).await;
    assert!(!output.status.success());
}
