//! Minimal HTTP service used as the `mock_api` dependency.
//!
//! - `GET /health` → `{"status": "ok"}`
//! - `POST /echo` → `{"you_sent": <body>}`; an unparseable or empty body echoes `{}`

use axum::body::Bytes;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::lifecycle::ShutdownSignal;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/echo", post(echo))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn echo(body: Bytes) -> Json<Value> {
    let data = serde_json::from_slice::<Value>(&body)
        .ok()
        .filter(|v| !is_empty_payload(v))
        .unwrap_or_else(|| json!({}));
    Json(json!({ "you_sent": data }))
}

/// Payloads that echo back as `{}`.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(true) => false,
    }
}

/// Serve until `shutdown` fires.
pub async fn serve(listener: TcpListener, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
    tracing::info!(address = ?listener.local_addr().ok(), "Mock API listening");
    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
