//! Read-Only Query Interface
//!
//! Serves the auditor's public key and its audit history snapshot. Never mutates state.

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::store::AuditStore;

pub fn router(store: Arc<AuditStore>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/keys", get(handlers::public_key))
        .route("/entries", get(handlers::entries))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(store)
}
