use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::StorageBackend;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and active backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let store = if state.config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };
    let storage = match state.config.storage {
        StorageBackend::Local { .. } => "local",
        StorageBackend::S3(_) => "s3",
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobapply-api",
        "store": store,
        "storage": storage
    }))
}

/// GET /
pub async fn root_handler() -> &'static str {
    "Job Application API is running"
}
