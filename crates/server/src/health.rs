//! Liveness endpoint

use api_types::health::Health;
use axum::Json;

/// Answers without touching the remote store.
pub async fn get() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        service: "Tally API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
