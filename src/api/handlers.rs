use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::debug;

use crate::store::AuditStore;

pub async fn health_check(State(store): State<Arc<AuditStore>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tlog-monitor",
        "entries": store.len().await,
        "timestamp": chrono::Utc::now()
    }))
}

/// Raw PEM bytes of the auditor's public key
pub async fn public_key(State(store): State<Arc<AuditStore>>) -> impl IntoResponse {
    debug!("served public key");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-pem-file")],
        store.public_key(),
    )
}

/// Newline-delimited serialized audit records, oldest first
pub async fn entries(State(store): State<Arc<AuditStore>>) -> impl IntoResponse {
    let mut body = String::new();
    for line in store.snapshot().await {
        body.push_str(&line);
        body.push('\n');
    }
    debug!("served entries");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        body,
    )
}
